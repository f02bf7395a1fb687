//! Shared helpers for mailsweep integration tests.
//!
//! - `MessageBuilder` renders raw RFC 822 messages
//! - `FakeMailbox` serves those messages through `MailSource`
//! - `TestHarness` wires an in-memory store and an orchestrator together

pub mod builders;
pub mod harness;

pub use builders::*;
pub use harness::{FakeMailbox, TestHarness};
