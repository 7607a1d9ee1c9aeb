//! Orchestrator - the per-message processing loop
//!
//! Ties the serializer, order state machine, reply filters, photo resolver
//! and external services together into one pass per aggregated message.
//!
//! # Module Structure
//!
//! - `types`: Turn output types and the assistant prompt
//! - `core`: Orchestrator struct and builder methods
//! - `process`: The processing pass itself
//! - `helpers`: Prompt assembly and small turn-level predicates

mod core;
mod helpers;
mod process;
mod types;

#[cfg(test)]
mod tests;

pub use core::Orchestrator;
pub use types::TurnReply;
