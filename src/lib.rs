//! Friction Finder intake client
//!
//! Conversational pain-point intake against the Friction Finder backend:
//! a pure state machine decides when to call the remote analyzer, a runtime
//! executes those calls and persists the chat snapshot locally.

pub mod api;
pub mod auth;
pub mod config;
pub mod intake;
pub mod report;
pub mod runtime;
pub mod state_machine;
pub mod store;
