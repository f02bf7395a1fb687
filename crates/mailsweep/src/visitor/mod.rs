//! HTTP visits of unsubscribe links.

pub mod client;
pub mod error;

pub use client::{
    validate_link, BatchSummary, ClickOutcome, LinkResult, LinkVisitor, VisitorSettings,
    INVALID_LINK_MESSAGE, USER_AGENT,
};
pub use error::VisitError;
