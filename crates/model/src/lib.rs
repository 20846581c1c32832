//! An abstraction layer for chat-completion services.
//!
//! This crate establishes a unified protocol between the chat session
//! core and the completion services it can talk to, so that a session
//! can switch services without touching the core codebase.
//!
//! Types in this crate don't define any behavior, instead they are the
//! constraints that the implementors should adhere to.

#![deny(missing_docs)]

mod error;
mod message;
mod provider;
mod request;
mod response;

pub use error::*;
pub use message::*;
pub use provider::*;
pub use request::*;
pub use response::*;
