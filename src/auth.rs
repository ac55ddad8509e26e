//! Shared app password handling
//!
//! The backend gates every call behind a single shared password sent as the
//! `x-app-password` header. The password is remembered in the local store
//! and injected per call, so a login mid-session applies to the next call.

use crate::api::{ApiClient, ApiError};
use crate::store::{LocalStore, StoreError};
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};
use thiserror::Error;

pub const PASSWORD_KEY: &str = "ff_app_password";

#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Blank input is not a credential
    pub fn new(password: &str) -> Option<Self> {
        let password = password.trim();
        (!password.is_empty()).then(|| Self(password.to_string()))
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(***)")
    }
}

/// Process-wide current credential, shared between the runtime and the CLI
#[derive(Clone, Default)]
pub struct CredentialHolder {
    inner: Arc<RwLock<Option<Credential>>>,
}

impl CredentialHolder {
    pub fn new(credential: Option<Credential>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(credential)),
        }
    }

    /// Seed from the remembered password, if any. A store that cannot be
    /// read behaves like an empty one.
    pub fn from_store(store: &LocalStore) -> Self {
        let stored = match store.get(PASSWORD_KEY) {
            Ok(value) => value.as_deref().and_then(Credential::new),
            Err(e) => {
                tracing::warn!(error = %e, "Could not read stored password");
                None
            }
        };
        Self::new(stored)
    }

    pub fn current(&self) -> Option<Credential> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn set(&self, credential: Credential) {
        *self.inner.write().unwrap_or_else(PoisonError::into_inner) = Some(credential);
    }

    pub fn clear(&self) {
        *self.inner.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    pub fn is_set(&self) -> bool {
        self.current().is_some()
    }
}

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Password is empty")]
    Empty,
    #[error("Invalid password")]
    Invalid,
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Verify a password against the backend and remember it on success.
///
/// A rejected password clears whatever was remembered before.
pub async fn login(
    client: &ApiClient,
    store: &LocalStore,
    holder: &CredentialHolder,
    password: &str,
) -> Result<(), AuthError> {
    let credential = Credential::new(password).ok_or(AuthError::Empty)?;

    match client.verify_credential(&credential).await {
        Ok(()) => {
            store.set(PASSWORD_KEY, credential.expose())?;
            holder.set(credential);
            tracing::info!("Logged in");
            Ok(())
        }
        Err(e) if e.is_unauthorized() => {
            holder.clear();
            store.remove(PASSWORD_KEY)?;
            tracing::warn!("Password rejected");
            Err(AuthError::Invalid)
        }
        Err(e) => Err(AuthError::Api(e)),
    }
}

/// Forget the password locally and in the store
pub fn logout(store: &LocalStore, holder: &CredentialHolder) -> Result<(), AuthError> {
    holder.clear();
    store.remove(PASSWORD_KEY)?;
    tracing::info!("Logged out");
    Ok(())
}
