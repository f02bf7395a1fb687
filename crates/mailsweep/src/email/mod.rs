//! Mailbox access and message parsing.
//!
//! [`ImapClient`] talks to the server; [`MailSource`] is the seam the scan
//! flow depends on, so it can run against any message store.

pub mod client;
pub mod error;
pub mod parser;
pub mod source;

pub use client::{select_recent, ImapClient};
pub use error::EmailError;
pub use parser::ParsedEmail;
pub use source::MailSource;
