//! Intake runtime executor

use super::traits::{Analyzer, SnapshotStore};
use super::{IntakeUpdate, IntakeView};
use crate::intake::IntakeSession;
use crate::state_machine::{transition, Effect, Event, IntakeState};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, watch};
use tokio_util::sync::CancellationToken;

/// Generic intake runtime that can work with any analyzer and snapshot store
pub struct IntakeRuntime<A, S>
where
    A: Analyzer + 'static,
    S: SnapshotStore + 'static,
{
    session_id: String,
    state: IntakeState,
    session: IntakeSession,
    analyzer: Arc<A>,
    snapshots: S,
    event_rx: mpsc::Receiver<Event>,
    event_tx: mpsc::Sender<Event>,
    broadcast_tx: broadcast::Sender<IntakeUpdate>,
    view_tx: watch::Sender<IntakeView>,
    /// Tears the runtime down; in-flight calls are abandoned
    cancel: CancellationToken,
}

impl<A, S> IntakeRuntime<A, S>
where
    A: Analyzer + 'static,
    S: SnapshotStore + 'static,
{
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        session: IntakeSession,
        analyzer: A,
        snapshots: S,
        event_rx: mpsc::Receiver<Event>,
        event_tx: mpsc::Sender<Event>,
        broadcast_tx: broadcast::Sender<IntakeUpdate>,
        view_tx: watch::Sender<IntakeView>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            session_id: uuid::Uuid::new_v4().to_string(),
            state: IntakeState::Idle,
            session,
            analyzer: Arc::new(analyzer),
            snapshots,
            event_rx,
            event_tx,
            broadcast_tx,
            view_tx,
            cancel,
        }
    }

    pub async fn run(mut self) {
        tracing::info!(
            session_id = %self.session_id,
            turns = self.session.transcript.len(),
            has_verdict = self.session.verdict.is_some(),
            "Starting intake runtime"
        );

        loop {
            tokio::select! {
                biased;

                () = self.cancel.cancelled() => break,

                Some(event) = self.event_rx.recv() => self.process_event(event),

                else => break,
            }
        }

        // Dropping the receiver makes any late analyzer reply undeliverable
        tracing::info!(session_id = %self.session_id, "Intake runtime stopped");
    }

    fn process_event(&mut self, event: Event) {
        let result = match transition(&self.state, &self.session, event) {
            Ok(r) => r,
            Err(e) => {
                // Busy and empty input are expected; nothing changes
                tracing::debug!(session_id = %self.session_id, reason = %e, "Event ignored");
                let _ = self.broadcast_tx.send(IntakeUpdate::Ignored {
                    reason: e.to_string(),
                });
                return;
            }
        };

        self.state = result.new_state;
        for effect in result.effects {
            self.execute_effect(effect);
        }

        self.view_tx.send_replace(IntakeView {
            state: self.state.clone(),
            session: self.session.clone(),
        });
    }

    fn execute_effect(&mut self, effect: Effect) {
        match effect {
            Effect::AppendTurn { turn } => {
                self.session.transcript.append(turn.clone());
                let _ = self.broadcast_tx.send(IntakeUpdate::TurnAppended { turn });
            }

            Effect::StoreVerdict { verdict } => {
                self.session.verdict = Some(verdict);
            }

            Effect::PersistSnapshot => self.persist_snapshot(),

            Effect::RequestAnalysis { request } => {
                let analyzer = self.analyzer.clone();
                let event_tx = self.event_tx.clone();
                let cancel = self.cancel.clone();
                let session_id = self.session_id.clone();

                tokio::spawn(async move {
                    tracing::debug!(
                        session_id = %session_id,
                        add_to_report = request.add_to_report,
                        "Requesting analysis (background)"
                    );

                    tokio::select! {
                        biased;

                        () = cancel.cancelled() => {
                            tracing::debug!(session_id = %session_id, "Analysis abandoned");
                        }

                        result = analyzer.analyze(&request) => {
                            let event = match result {
                                Ok(verdict) => Event::VerdictReceived { verdict },
                                Err(e) => Event::AnalysisFailed {
                                    message: e.message,
                                    kind: e.kind,
                                },
                            };
                            // Fails only after teardown
                            let _ = event_tx.send(event).await;
                        }
                    }
                });
            }

            Effect::ResetSession => {
                self.session.reset();
                let _ = self.broadcast_tx.send(IntakeUpdate::SessionReset {
                    greeting: self.session.transcript.greeting().clone(),
                });
            }

            Effect::UpdateContext { context } => {
                self.session.context = context;
            }

            Effect::NotifyState { state } => {
                let _ = self.broadcast_tx.send(IntakeUpdate::StateChanged { state });
            }

            Effect::NotifySettled => {
                if let Some(verdict) = &self.session.verdict {
                    let _ = self.broadcast_tx.send(IntakeUpdate::Settled {
                        verdict: verdict.clone(),
                    });
                }
            }

            Effect::NotifyFailure { message, kind } => {
                tracing::warn!(
                    session_id = %self.session_id,
                    error = %message,
                    kind = ?kind,
                    "Analysis failed, back to idle"
                );
                let _ = self
                    .broadcast_tx
                    .send(IntakeUpdate::Failed { message, kind });
            }
        }
    }

    /// Best effort: a failed save is logged and the session carries on
    fn persist_snapshot(&self) {
        let json = match self.session.snapshot().to_json() {
            Ok(json) => json,
            Err(e) => {
                tracing::warn!(session_id = %self.session_id, error = %e, "Failed to encode snapshot");
                return;
            }
        };
        if let Err(e) = self.snapshots.save(&json) {
            tracing::warn!(session_id = %self.session_id, error = %e, "Failed to save snapshot");
        }
    }
}
