//! Scan and unsubscribe runs over the mailbox, the store and the link
//! visitor.
//!
//! Each run is self-contained: it reads what it needs from the store,
//! handles items one at a time and writes every outcome immediately. A
//! failing item is counted and logged to the operation history; it never
//! aborts the run.

mod progress;
mod report;
mod scan;
mod unsubscribe;

use std::path::Path;

use tracing::warn;

use crate::categorizer::Categorizer;
use crate::config::Config;
use crate::db::history_repo::{self, OperationKind, OperationRow, OperationStatus};
use crate::db::stats_repo::{self, Statistics};
use crate::db::Database;
use crate::error::Result;
use crate::export;
use crate::visitor::LinkVisitor;

pub use progress::{NoopProgress, Progress, ProgressReporter, Stage};
pub use report::{EmailSummary, ScanReport, UnsubscribeDetail, UnsubscribeReport};

/// Which links an unsubscribe run visits. Only links never clicked are
/// eligible in either mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkSelection {
    Ids(Vec<i64>),
    AllUnclicked,
}

pub struct Orchestrator {
    config: Config,
    db: Database,
    categorizer: Categorizer,
    visitor: LinkVisitor,
}

impl Orchestrator {
    pub fn new(config: Config, db: Database) -> Result<Self> {
        let visitor = LinkVisitor::from_config(&config)?;
        Ok(Self {
            config,
            db,
            categorizer: Categorizer::default(),
            visitor,
        })
    }

    pub fn with_visitor(mut self, visitor: LinkVisitor) -> Self {
        self.visitor = visitor;
        self
    }

    pub fn with_categorizer(mut self, categorizer: Categorizer) -> Self {
        self.categorizer = categorizer;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn statistics(&self) -> Result<Statistics> {
        Ok(stats_repo::statistics(&self.db)?)
    }

    pub fn recent_operations(&self, limit: u32) -> Result<Vec<OperationRow>> {
        Ok(history_repo::recent(&self.db, limit)?)
    }

    /// Appends an operation row. A failed write is logged and dropped so
    /// that one item never ends a run.
    fn log_operation(
        &self,
        kind: OperationKind,
        email_id: Option<i64>,
        status: OperationStatus,
        details: &str,
    ) {
        if let Err(e) = history_repo::log(&self.db, kind, email_id, status, details) {
            warn!("Failed to write {} history row: {}", kind, e);
        }
    }

    /// Writes the plain-text link report and returns the number of links.
    pub fn export_links(&self, path: &Path) -> Result<usize> {
        export::export_links(&self.db, path)
    }
}
