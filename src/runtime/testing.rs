//! Mock implementations for testing
//!
//! These mocks enable integration testing without real I/O.

use super::traits::{Analyzer, SnapshotStore};
use super::{spawn_intake, IntakeHandle, IntakeUpdate};
use crate::api::ApiError;
use crate::intake::{AnalysisRequest, IntakeContext, PainCategory, Snapshot, Verdict};
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{broadcast, Notify};

pub const TEST_GREETING: &str = "Share what is not working operationally.";

/// Verdict with the fields the orchestration looks at
pub fn verdict(message: &str, valid: bool, needs_more_info: bool, ids: &[i64]) -> Verdict {
    Verdict {
        assistant_message: message.to_string(),
        valid_concern: valid,
        needs_more_info,
        category: PainCategory::Approvals,
        root_cause: valid.then(|| "Single approver bottleneck".to_string()),
        rationale: "test".to_string(),
        estimated_impact_hours_per_week: 4.5,
        added_to_report: !ids.is_empty(),
        interview_id: (!ids.is_empty()).then_some(7),
        respondent_id: (!ids.is_empty()).then_some(3),
        pain_point_ids: ids.to_vec(),
        created_at: Utc.with_ymd_and_hms(2026, 10, 1, 9, 30, 0).unwrap(),
    }
}

// ============================================================================
// Mock Analyzer
// ============================================================================

/// Mock analyzer that returns queued responses
pub struct MockAnalyzer {
    responses: Mutex<VecDeque<Result<Verdict, ApiError>>>,
    /// Record of all requests made
    pub requests: Mutex<Vec<AnalysisRequest>>,
}

impl MockAnalyzer {
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn queue_verdict(&self, verdict: Verdict) {
        self.responses.lock().unwrap().push_back(Ok(verdict));
    }

    pub fn queue_error(&self, error: ApiError) {
        self.responses.lock().unwrap().push_back(Err(error));
    }

    pub fn recorded_requests(&self) -> Vec<AnalysisRequest> {
        self.requests.lock().unwrap().clone()
    }

    fn next(&self) -> Result<Verdict, ApiError> {
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ApiError::network("No mock response queued")))
    }
}

impl Default for MockAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Analyzer for MockAnalyzer {
    async fn analyze(&self, request: &AnalysisRequest) -> Result<Verdict, ApiError> {
        self.requests.lock().unwrap().push(request.clone());
        self.next()
    }
}

// ============================================================================
// Delayed Mock Analyzer (for busy and teardown testing)
// ============================================================================

/// Mock analyzer with configurable delay
pub struct DelayedMockAnalyzer {
    pub inner: MockAnalyzer,
    delay: Duration,
    /// Notified when a request starts (for test synchronization)
    pub request_started: Arc<Notify>,
}

impl DelayedMockAnalyzer {
    pub fn new(delay: Duration) -> Self {
        Self {
            inner: MockAnalyzer::new(),
            delay,
            request_started: Arc::new(Notify::new()),
        }
    }
}

#[async_trait]
impl Analyzer for DelayedMockAnalyzer {
    async fn analyze(&self, request: &AnalysisRequest) -> Result<Verdict, ApiError> {
        self.inner.requests.lock().unwrap().push(request.clone());
        // notify_one keeps a permit if nobody is waiting yet
        self.request_started.notify_one();
        tokio::time::sleep(self.delay).await;
        self.inner.next()
    }
}

// ============================================================================
// Snapshot stores
// ============================================================================

/// In-memory snapshot store for testing
#[derive(Default)]
pub struct InMemorySnapshotStore {
    raw: Mutex<Option<String>>,
    saves: Mutex<usize>,
}

impl InMemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_raw(raw: &str) -> Self {
        Self {
            raw: Mutex::new(Some(raw.to_string())),
            saves: Mutex::new(0),
        }
    }

    pub fn snapshot(&self) -> Option<Snapshot> {
        self.raw
            .lock()
            .unwrap()
            .as_deref()
            .and_then(Snapshot::from_json)
    }

    pub fn save_count(&self) -> usize {
        *self.saves.lock().unwrap()
    }
}

impl SnapshotStore for InMemorySnapshotStore {
    fn load(&self) -> Result<Option<String>, String> {
        Ok(self.raw.lock().unwrap().clone())
    }

    fn save(&self, json: &str) -> Result<(), String> {
        *self.raw.lock().unwrap() = Some(json.to_string());
        *self.saves.lock().unwrap() += 1;
        Ok(())
    }
}

/// Store whose every operation fails (quota exceeded, disk gone)
pub struct FailingSnapshotStore;

impl SnapshotStore for FailingSnapshotStore {
    fn load(&self) -> Result<Option<String>, String> {
        Err("storage unavailable".to_string())
    }

    fn save(&self, _json: &str) -> Result<(), String> {
        Err("storage quota exceeded".to_string())
    }
}

// ============================================================================
// Test Runtime Builder
// ============================================================================

/// Helper for building test runtimes with minimal boilerplate
pub struct TestRuntime<A: Analyzer + 'static> {
    pub handle: IntakeHandle,
    pub updates: broadcast::Receiver<IntakeUpdate>,
    pub analyzer: Arc<A>,
    pub snapshots: Arc<InMemorySnapshotStore>,
}

pub struct TestRuntimeBuilder<A> {
    analyzer: A,
    snapshots: Option<Arc<InMemorySnapshotStore>>,
    context: IntakeContext,
}

impl<A: Analyzer + 'static> TestRuntime<A> {
    pub fn builder(analyzer: A) -> TestRuntimeBuilder<A> {
        TestRuntimeBuilder {
            analyzer,
            snapshots: None,
            context: IntakeContext::default(),
        }
    }
}

impl<A: Analyzer + 'static> TestRuntimeBuilder<A> {
    /// Share a store across runtimes to simulate a reload
    pub fn snapshots(mut self, snapshots: Arc<InMemorySnapshotStore>) -> Self {
        self.snapshots = Some(snapshots);
        self
    }

    pub fn context(mut self, context: IntakeContext) -> Self {
        self.context = context;
        self
    }

    pub fn build(self) -> TestRuntime<A> {
        let analyzer = Arc::new(self.analyzer);
        let snapshots = self
            .snapshots
            .unwrap_or_else(|| Arc::new(InMemorySnapshotStore::new()));
        let handle = spawn_intake(
            analyzer.clone(),
            snapshots.clone(),
            TEST_GREETING,
            self.context,
        );
        let updates = handle.subscribe();
        TestRuntime {
            handle,
            updates,
            analyzer,
            snapshots,
        }
    }
}

impl<A: Analyzer + 'static> TestRuntime<A> {
    /// Wait for the first update matching `f`
    pub async fn wait_for<T>(
        &mut self,
        timeout: Duration,
        mut f: impl FnMut(IntakeUpdate) -> Option<T>,
    ) -> Option<T> {
        let deadline = tokio::time::Instant::now() + timeout;
        while tokio::time::Instant::now() < deadline {
            match tokio::time::timeout(Duration::from_millis(50), self.updates.recv()).await {
                Ok(Ok(update)) => {
                    if let Some(found) = f(update) {
                        return Some(found);
                    }
                }
                _ => continue,
            }
        }
        None
    }

    /// Wait for an authoritative verdict
    pub async fn wait_for_settled(&mut self, timeout: Duration) -> Option<Verdict> {
        self.wait_for(timeout, |u| match u {
            IntakeUpdate::Settled { verdict } => Some(verdict),
            _ => None,
        })
        .await
    }

    pub async fn wait_for_failure(&mut self, timeout: Duration) -> Option<String> {
        self.wait_for(timeout, |u| match u {
            IntakeUpdate::Failed { message, .. } => Some(message),
            _ => None,
        })
        .await
    }

    pub async fn wait_for_ignored(&mut self, timeout: Duration) -> Option<String> {
        self.wait_for(timeout, |u| match u {
            IntakeUpdate::Ignored { reason } => Some(reason),
            _ => None,
        })
        .await
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intake::Turn;
    use crate::state_machine::IntakeState;

    const WAIT: Duration = Duration::from_secs(2);
    const COMPLAINT: &str = "Invoices take too long to approve";

    fn instant() -> MockAnalyzer {
        MockAnalyzer::new()
    }

    #[tokio::test]
    async fn test_mock_analyzer_runs_dry() {
        let mock = instant();
        mock.queue_verdict(verdict("ok", false, true, &[]));
        let request = AnalysisRequest::new(vec![], IntakeContext::default(), false);
        assert!(mock.analyze(&request).await.is_ok());
        assert!(mock.analyze(&request).await.is_err());
        assert_eq!(mock.recorded_requests().len(), 2);
    }

    /// Valid and informed: one user message, two calls, one assistant turn
    #[tokio::test]
    async fn test_fully_specified_complaint_commits() {
        let analyzer = instant();
        analyzer.queue_verdict(verdict("Noted, checking impact.", true, false, &[]));
        analyzer.queue_verdict(verdict("Logged to the backlog.", true, false, &[101, 102]));

        let mut rt = TestRuntime::builder(analyzer).build();
        rt.handle.send_message(COMPLAINT).await.unwrap();

        let settled = rt.wait_for_settled(WAIT).await.expect("settled");
        assert_eq!(settled.pain_point_ids, vec![101, 102]);
        assert_eq!(
            settled.backlog_summary().as_deref(),
            Some("Added to report backlog. Pain point IDs: 101, 102")
        );

        let requests = rt.analyzer.recorded_requests();
        assert_eq!(requests.len(), 2);
        assert!(!requests[0].add_to_report);
        assert!(requests[1].add_to_report);
        assert_eq!(requests[0].messages, vec![Turn::user(COMPLAINT)]);
        assert_eq!(requests[0].messages, requests[1].messages);
        assert_eq!(requests[0].context, requests[1].context);

        let view = rt.handle.view();
        assert!(view.state.is_idle());
        assert_eq!(
            view.session.transcript.turns(),
            &[
                Turn::assistant(TEST_GREETING),
                Turn::user(COMPLAINT),
                Turn::assistant("Logged to the backlog."),
            ]
        );
        assert_eq!(view.session.verdict, Some(settled));
    }

    #[tokio::test]
    async fn test_needs_more_info_is_single_call() {
        let analyzer = instant();
        analyzer.queue_verdict(verdict("Which approval step stalls?", false, true, &[]));

        let mut rt = TestRuntime::builder(analyzer).build();
        rt.handle.send_message("Things are slow").await.unwrap();

        let settled = rt.wait_for_settled(WAIT).await.expect("settled");
        assert_eq!(settled.headline(), "Listening and building signal.");
        assert_eq!(rt.analyzer.recorded_requests().len(), 1);
        assert_eq!(
            rt.handle.view().session.transcript.last(),
            Some(&Turn::assistant("Which approval step stalls?"))
        );
    }

    /// Valid but underspecified does not commit either
    #[tokio::test]
    async fn test_valid_but_needs_more_info_is_single_call() {
        let analyzer = instant();
        analyzer.queue_verdict(verdict("How often does it happen?", true, true, &[]));

        let mut rt = TestRuntime::builder(analyzer).build();
        rt.handle.send_message(COMPLAINT).await.unwrap();
        rt.wait_for_settled(WAIT).await.expect("settled");
        assert_eq!(rt.analyzer.recorded_requests().len(), 1);
    }

    #[tokio::test]
    async fn test_reload_restores_session() {
        let store = Arc::new(InMemorySnapshotStore::new());

        let analyzer = instant();
        analyzer.queue_verdict(verdict("Noted.", true, false, &[]));
        analyzer.queue_verdict(verdict("Logged.", true, false, &[101, 102]));
        let mut rt = TestRuntime::builder(analyzer)
            .snapshots(store.clone())
            .build();
        rt.handle.send_message(COMPLAINT).await.unwrap();
        rt.wait_for_settled(WAIT).await.expect("settled");
        let before = rt.handle.view().session;
        rt.handle.teardown().await;

        let reloaded = TestRuntime::builder(instant()).snapshots(store).build();
        let after = reloaded.handle.view().session;
        assert_eq!(after.transcript, before.transcript);
        assert_eq!(after.transcript.len(), 3);
        assert_eq!(
            after.verdict.map(|v| v.pain_point_ids),
            Some(vec![101, 102])
        );
    }

    #[tokio::test]
    async fn test_malformed_snapshot_starts_fresh() {
        let store = Arc::new(InMemorySnapshotStore::with_raw("{not json"));
        let rt = TestRuntime::builder(instant()).snapshots(store).build();
        let view = rt.handle.view();
        assert_eq!(view.session.transcript.len(), 1);
        assert!(view.session.verdict.is_none());
    }

    #[tokio::test]
    async fn test_manual_commit_without_content_is_noop() {
        let mut rt = TestRuntime::builder(instant()).build();
        rt.handle.commit_now().await.unwrap();

        assert!(rt.wait_for_ignored(WAIT).await.is_some());
        assert!(rt.analyzer.recorded_requests().is_empty());
        assert_eq!(rt.snapshots.save_count(), 0);
    }

    #[tokio::test]
    async fn test_manual_commit_sends_whole_conversation() {
        let store = Arc::new(InMemorySnapshotStore::new());
        store
            .save(
                &Snapshot::new(
                    vec![
                        Turn::assistant(TEST_GREETING),
                        Turn::user("Approvals stall"),
                        Turn::assistant("Where?"),
                        Turn::user("Finance sign-off"),
                    ],
                    None,
                )
                .to_json()
                .unwrap(),
            )
            .unwrap();

        let analyzer = instant();
        analyzer.queue_verdict(verdict("Added.", true, false, &[55]));
        let mut rt = TestRuntime::builder(analyzer).snapshots(store).build();
        rt.handle.commit_now().await.unwrap();

        let settled = rt.wait_for_settled(WAIT).await.expect("settled");
        assert_eq!(settled.pain_point_ids, vec![55]);

        let requests = rt.analyzer.recorded_requests();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].add_to_report);
        assert_eq!(
            requests[0].messages,
            vec![
                Turn::user("Approvals stall"),
                Turn::assistant("Where?"),
                Turn::user("Finance sign-off"),
            ]
        );
        // The commit reply is appended like any other
        assert_eq!(rt.handle.view().session.transcript.len(), 5);
    }

    #[tokio::test]
    async fn test_empty_message_is_noop() {
        let mut rt = TestRuntime::builder(instant()).build();
        rt.handle.send_message("   \n").await.unwrap();

        assert!(rt.wait_for_ignored(WAIT).await.is_some());
        assert!(rt.analyzer.recorded_requests().is_empty());
        assert_eq!(rt.handle.view().session.transcript.len(), 1);
    }

    #[tokio::test]
    async fn test_busy_rejects_second_message() {
        let analyzer = DelayedMockAnalyzer::new(Duration::from_millis(200));
        analyzer
            .inner
            .queue_verdict(verdict("Tell me more.", false, true, &[]));
        let started = analyzer.request_started.clone();

        let mut rt = TestRuntime::builder(analyzer).build();
        rt.handle.send_message("first").await.unwrap();
        started.notified().await;

        rt.handle.send_message("second").await.unwrap();
        rt.handle.commit_now().await.unwrap();
        rt.handle.reset().await.unwrap();

        rt.wait_for_settled(WAIT).await.expect("settled");
        assert_eq!(rt.analyzer.inner.recorded_requests().len(), 1);
        let turns = rt.handle.view().session.transcript.turns().to_vec();
        assert_eq!(
            turns,
            vec![
                Turn::assistant(TEST_GREETING),
                Turn::user("first"),
                Turn::assistant("Tell me more."),
            ]
        );
    }

    #[tokio::test]
    async fn test_failure_keeps_user_turn_and_allows_retry() {
        let analyzer = instant();
        analyzer.queue_error(ApiError::server_error("Scoring engine offline"));
        analyzer.queue_verdict(verdict("Back online, go on.", false, true, &[]));

        let mut rt = TestRuntime::builder(analyzer).build();
        rt.handle.send_message(COMPLAINT).await.unwrap();

        let message = rt.wait_for_failure(WAIT).await.expect("failure");
        assert_eq!(message, "Scoring engine offline");

        let view = rt.handle.view();
        assert_eq!(view.state, IntakeState::Idle);
        assert_eq!(view.session.transcript.last(), Some(&Turn::user(COMPLAINT)));
        assert!(view.session.verdict.is_none());
        // Persisted before the call went out
        let stored = rt.snapshots.snapshot().expect("snapshot");
        assert_eq!(stored.messages.last(), Some(&Turn::user(COMPLAINT)));

        rt.handle.send_message("Retrying").await.unwrap();
        rt.wait_for_settled(WAIT).await.expect("settled");
        let requests = rt.analyzer.recorded_requests();
        assert_eq!(
            requests[1].messages,
            vec![Turn::user(COMPLAINT), Turn::user("Retrying")]
        );
    }

    /// A failed commit call leaves the earlier verdict in place
    #[tokio::test]
    async fn test_commit_failure_keeps_previous_verdict() {
        let analyzer = instant();
        analyzer.queue_verdict(verdict("Which team?", false, true, &[]));
        analyzer.queue_verdict(verdict("Noted.", true, false, &[]));
        analyzer.queue_error(ApiError::unauthorized());

        let mut rt = TestRuntime::builder(analyzer).build();
        rt.handle.send_message("Approvals stall").await.unwrap();
        let first = rt.wait_for_settled(WAIT).await.expect("settled");

        rt.handle.send_message("Finance, daily").await.unwrap();
        let message = rt.wait_for_failure(WAIT).await.expect("failure");
        assert_eq!(message, "Unauthorized");

        let view = rt.handle.view();
        assert_eq!(view.session.verdict, Some(first));
        assert_eq!(view.session.transcript.last(), Some(&Turn::user("Finance, daily")));
    }

    #[tokio::test]
    async fn test_teardown_discards_late_reply() {
        let analyzer = DelayedMockAnalyzer::new(Duration::from_millis(100));
        analyzer
            .inner
            .queue_verdict(verdict("Too late.", false, true, &[]));
        let started = analyzer.request_started.clone();

        let rt = TestRuntime::builder(analyzer).build();
        rt.handle.send_message(COMPLAINT).await.unwrap();
        started.notified().await;
        rt.handle.teardown().await;

        tokio::time::sleep(Duration::from_millis(250)).await;
        let stored = rt.snapshots.snapshot().expect("snapshot");
        assert_eq!(
            stored.messages,
            vec![Turn::assistant(TEST_GREETING), Turn::user(COMPLAINT)]
        );
        assert!(stored.result.is_none());
    }

    #[tokio::test]
    async fn test_dropped_handle_discards_late_reply() {
        let analyzer = DelayedMockAnalyzer::new(Duration::from_millis(100));
        analyzer
            .inner
            .queue_verdict(verdict("Too late.", false, true, &[]));
        let started = analyzer.request_started.clone();

        let TestRuntime {
            handle, snapshots, ..
        } = TestRuntime::builder(analyzer).build();
        handle.send_message(COMPLAINT).await.unwrap();
        started.notified().await;
        drop(handle);

        tokio::time::sleep(Duration::from_millis(300)).await;
        let stored = snapshots.snapshot().expect("snapshot");
        assert_eq!(
            stored.messages,
            vec![Turn::assistant(TEST_GREETING), Turn::user(COMPLAINT)]
        );
        assert!(stored.result.is_none());
        assert_eq!(snapshots.save_count(), 1);
    }

    #[tokio::test]
    async fn test_snapshot_failures_are_not_fatal() {
        let analyzer = Arc::new(instant());
        analyzer.queue_verdict(verdict("Got it.", false, true, &[]));

        let handle = spawn_intake(
            analyzer.clone(),
            FailingSnapshotStore,
            TEST_GREETING,
            IntakeContext::default(),
        );
        let mut updates = handle.subscribe();
        handle.send_message("Reports are manual").await.unwrap();

        let settled = tokio::time::timeout(WAIT, async {
            loop {
                if let Ok(IntakeUpdate::Settled { verdict }) = updates.recv().await {
                    return verdict;
                }
            }
        })
        .await
        .expect("settled");
        assert_eq!(settled.assistant_message, "Got it.");
        assert_eq!(handle.view().session.transcript.len(), 3);
        handle.teardown().await;
    }

    #[tokio::test]
    async fn test_new_session_clears_and_persists() {
        let analyzer = instant();
        analyzer.queue_verdict(verdict("Noted.", true, false, &[]));
        analyzer.queue_verdict(verdict("Logged.", true, false, &[9]));

        let mut rt = TestRuntime::builder(analyzer).build();
        rt.handle.send_message(COMPLAINT).await.unwrap();
        rt.wait_for_settled(WAIT).await.expect("settled");

        rt.handle.reset().await.unwrap();
        let greeting = rt
            .wait_for(WAIT, |u| match u {
                IntakeUpdate::SessionReset { greeting } => Some(greeting),
                _ => None,
            })
            .await
            .expect("reset");
        assert_eq!(greeting, Turn::assistant(TEST_GREETING));

        let view = rt.handle.view();
        assert_eq!(view.session.transcript.len(), 1);
        assert!(view.session.verdict.is_none());
        let stored = rt.snapshots.snapshot().expect("snapshot");
        assert_eq!(stored.messages, vec![Turn::assistant(TEST_GREETING)]);
        assert!(stored.result.is_none());
    }

    #[tokio::test]
    async fn test_context_update_applies_to_next_call() {
        let analyzer = instant();
        analyzer.queue_verdict(verdict("Which team?", false, true, &[]));

        let mut rt = TestRuntime::builder(analyzer).build();
        let mut context = IntakeContext::default();
        context.set_field("team", "Finance").unwrap();
        rt.handle.update_context(context.clone()).await.unwrap();
        rt.handle.send_message("Month end is painful").await.unwrap();
        rt.wait_for_settled(WAIT).await.expect("settled");

        assert_eq!(rt.analyzer.recorded_requests()[0].context, context);
        assert_eq!(rt.handle.view().session.context.team, "Finance");
    }
}
