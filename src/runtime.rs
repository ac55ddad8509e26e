//! Runtime for a single intake session
//!
//! Owns the orchestration state and the client-held session, executes the
//! effects the state machine asks for and publishes updates to subscribers.

mod executor;
pub mod traits;

#[cfg(test)]
pub mod testing;

pub use executor::IntakeRuntime;
pub use traits::*;

use crate::api::ApiErrorKind;
use crate::intake::{IntakeContext, IntakeSession, Snapshot, Turn, Verdict};
use crate::state_machine::{Event, IntakeState};
use thiserror::Error;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Updates published to subscribers
#[derive(Debug, Clone)]
pub enum IntakeUpdate {
    /// Orchestration state name (`idle`, `awaiting_verdict`, `awaiting_commit`)
    StateChanged { state: &'static str },
    TurnAppended { turn: Turn },
    /// An authoritative verdict was stored and its reply shown
    Settled { verdict: Verdict },
    /// The call failed; the runtime is idle and ready to retry
    Failed { message: String, kind: ApiErrorKind },
    /// Input rejected without any change (busy, empty, nothing to analyze)
    Ignored { reason: String },
    SessionReset { greeting: Turn },
}

/// Latest state and session, for rendering
#[derive(Debug, Clone)]
pub struct IntakeView {
    pub state: IntakeState,
    pub session: IntakeSession,
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("Intake runtime has stopped")]
pub struct RuntimeStopped;

/// Handle to interact with a running intake session
pub struct IntakeHandle {
    event_tx: mpsc::Sender<Event>,
    broadcast_tx: broadcast::Sender<IntakeUpdate>,
    view_rx: watch::Receiver<IntakeView>,
    cancel: CancellationToken,
    join: JoinHandle<()>,
}

impl IntakeHandle {
    async fn send(&self, event: Event) -> Result<(), RuntimeStopped> {
        self.event_tx.send(event).await.map_err(|_| RuntimeStopped)
    }

    /// Submit a user message; blank input is ignored
    pub async fn send_message(&self, text: impl Into<String>) -> Result<(), RuntimeStopped> {
        self.send(Event::user_message(text)).await
    }

    /// Analyze the whole conversation and add it to the report
    pub async fn commit_now(&self) -> Result<(), RuntimeStopped> {
        self.send(Event::CommitRequested).await
    }

    /// Start a new session: greeting only, no verdict
    pub async fn reset(&self) -> Result<(), RuntimeStopped> {
        self.send(Event::Reset).await
    }

    /// Replace respondent metadata for future calls
    pub async fn update_context(&self, context: IntakeContext) -> Result<(), RuntimeStopped> {
        self.send(Event::ContextUpdated { context }).await
    }

    pub fn subscribe(&self) -> broadcast::Receiver<IntakeUpdate> {
        self.broadcast_tx.subscribe()
    }

    pub fn view(&self) -> IntakeView {
        self.view_rx.borrow().clone()
    }

    /// Stop the runtime and wait for it to exit. Replies still in flight
    /// are discarded.
    pub async fn teardown(mut self) {
        self.cancel.cancel();
        if let Err(e) = (&mut self.join).await {
            tracing::warn!(error = %e, "Intake runtime task ended abnormally");
        }
    }
}

/// Dropping the handle stops the runtime as well; only `teardown` waits for it.
impl Drop for IntakeHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Restore the session from the snapshot store and start its runtime.
///
/// A missing, unreadable or malformed snapshot yields a fresh session.
pub fn spawn_intake<A, S>(
    analyzer: A,
    snapshots: S,
    greeting: &str,
    context: IntakeContext,
) -> IntakeHandle
where
    A: Analyzer + 'static,
    S: SnapshotStore + 'static,
{
    let snapshot = match snapshots.load() {
        Ok(raw) => raw.as_deref().and_then(Snapshot::from_json),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load snapshot, starting fresh");
            None
        }
    };
    let session = IntakeSession::restore(snapshot, greeting, context);

    let (event_tx, event_rx) = mpsc::channel(32);
    let (broadcast_tx, _) = broadcast::channel(128);
    let (view_tx, view_rx) = watch::channel(IntakeView {
        state: IntakeState::Idle,
        session: session.clone(),
    });
    let cancel = CancellationToken::new();

    let runtime = IntakeRuntime::new(
        session,
        analyzer,
        snapshots,
        event_rx,
        event_tx.clone(),
        broadcast_tx.clone(),
        view_tx,
        cancel.clone(),
    );
    let join = tokio::spawn(runtime.run());

    IntakeHandle {
        event_tx,
        broadcast_tx,
        view_rx,
        cancel,
        join,
    }
}
