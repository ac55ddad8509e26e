//! Trait abstractions for runtime I/O
//!
//! These traits enable testing the runtime with mock implementations.

use crate::api::{ApiClient, ApiError};
use crate::auth::CredentialHolder;
use crate::intake::{AnalysisRequest, Verdict, SNAPSHOT_KEY};
use crate::store::LocalStore;
use async_trait::async_trait;
use std::sync::Arc;

/// The remote analysis capability
#[async_trait]
pub trait Analyzer: Send + Sync {
    /// Run one analysis call
    async fn analyze(&self, request: &AnalysisRequest) -> Result<Verdict, ApiError>;
}

/// Storage for the serialized chat snapshot
pub trait SnapshotStore: Send + Sync {
    /// Raw snapshot text, if one was ever saved
    fn load(&self) -> Result<Option<String>, String>;

    /// Replace the stored snapshot
    fn save(&self, json: &str) -> Result<(), String>;
}

// ============================================================================
// Arc implementations for trait objects
// ============================================================================

#[async_trait]
impl<T: Analyzer + ?Sized> Analyzer for Arc<T> {
    async fn analyze(&self, request: &AnalysisRequest) -> Result<Verdict, ApiError> {
        (**self).analyze(request).await
    }
}

impl<T: SnapshotStore + ?Sized> SnapshotStore for Arc<T> {
    fn load(&self) -> Result<Option<String>, String> {
        (**self).load()
    }

    fn save(&self, json: &str) -> Result<(), String> {
        (**self).save(json)
    }
}

// ============================================================================
// Production Adapters
// ============================================================================

/// Adapter to use `ApiClient` as Analyzer. The credential is read at call
/// time so a login mid-session applies to the next call.
#[derive(Clone)]
pub struct ApiAnalyzer {
    client: ApiClient,
    credentials: CredentialHolder,
}

impl ApiAnalyzer {
    pub fn new(client: ApiClient, credentials: CredentialHolder) -> Self {
        Self {
            client,
            credentials,
        }
    }
}

#[async_trait]
impl Analyzer for ApiAnalyzer {
    async fn analyze(&self, request: &AnalysisRequest) -> Result<Verdict, ApiError> {
        let credential = self.credentials.current();
        self.client.coo_chat(request, credential.as_ref()).await
    }
}

/// Adapter to use `LocalStore` as `SnapshotStore`
#[derive(Clone)]
pub struct LocalSnapshotStore {
    store: LocalStore,
}

impl LocalSnapshotStore {
    pub fn new(store: LocalStore) -> Self {
        Self { store }
    }
}

impl SnapshotStore for LocalSnapshotStore {
    fn load(&self) -> Result<Option<String>, String> {
        self.store.get(SNAPSHOT_KEY).map_err(|e| e.to_string())
    }

    fn save(&self, json: &str) -> Result<(), String> {
        self.store.set(SNAPSHOT_KEY, json).map_err(|e| e.to_string())
    }
}

/// Analyzer wrapper that logs duration and outcome of every call
pub struct LoggingAnalyzer<A> {
    inner: A,
}

impl<A: Analyzer> LoggingAnalyzer<A> {
    pub fn new(inner: A) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<A: Analyzer> Analyzer for LoggingAnalyzer<A> {
    async fn analyze(&self, request: &AnalysisRequest) -> Result<Verdict, ApiError> {
        let start = std::time::Instant::now();
        let result = self.inner.analyze(request).await;
        let duration = start.elapsed();

        match &result {
            Ok(verdict) => {
                tracing::info!(
                    duration_ms = %duration.as_millis(),
                    turns = request.messages.len(),
                    add_to_report = request.add_to_report,
                    valid_concern = verdict.valid_concern,
                    needs_more_info = verdict.needs_more_info,
                    pain_points = verdict.pain_point_ids.len(),
                    "Analysis completed"
                );
            }
            Err(e) => {
                tracing::error!(
                    duration_ms = %duration.as_millis(),
                    add_to_report = request.add_to_report,
                    error = %e.message,
                    status = ?e.status,
                    retryable = e.kind.is_retryable(),
                    "Analysis failed"
                );
            }
        }

        result
    }
}
