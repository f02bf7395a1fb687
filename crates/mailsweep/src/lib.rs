pub mod categorizer;
pub mod config;
pub mod db;
pub mod email;
pub mod error;
pub mod export;
pub mod extract;
pub mod logging;
pub mod orchestrator;
pub mod visitor;

pub use categorizer::{Categorizer, Category, ListStatus, SenderLists};
pub use config::{Config, ImapSettings, LogSettings};
pub use db::{Database, DatabaseError};
pub use email::{EmailError, ImapClient, MailSource, ParsedEmail};
pub use error::{ConfigError, LoggingError, MailsweepError, Result};
pub use orchestrator::{
    LinkSelection, NoopProgress, Orchestrator, Progress, ProgressReporter, ScanReport, Stage,
    UnsubscribeReport,
};
pub use visitor::{validate_link, BatchSummary, ClickOutcome, LinkVisitor, VisitError};
