//! Intake orchestration state machine
//!
//! Elm-style: a pure `transition` maps (state, session, event) to a new state
//! plus effects; the runtime executes the effects.

mod effect;
pub mod event;
pub mod state;
pub(crate) mod transition;

#[cfg(test)]
mod proptests;

pub use effect::Effect;
pub use event::Event;
pub use state::IntakeState;
pub use transition::{transition, TransitionError, TransitionResult};
