//! Conversational pain-point intake
//!
//! Data shapes and client-held state for the COO chat flow. The orchestration
//! of analyzer calls lives in `state_machine` and `runtime`.

mod session;
pub mod snapshot;
pub mod transcript;
pub mod verdict;

pub use session::IntakeSession;
pub use snapshot::{Snapshot, SNAPSHOT_KEY};
pub use transcript::{Role, Transcript, Turn, DEFAULT_GREETING};
pub use verdict::{AnalysisRequest, IntakeContext, PainCategory, Verdict};
