//! Core logic: the transcript store, the completion client, and the
//! streaming chat session manager.

#![deny(missing_docs)]
#![deny(clippy::missing_safety_doc)]

#[macro_use]
extern crate tracing;

mod completion_client;
mod session;
pub mod transcript;

pub use completion_client::{CompletionClient, CompletionError};
pub use session::{Session, SessionBuilder, SessionEvent, TurnOutcome};
