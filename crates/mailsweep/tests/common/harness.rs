//! In-memory mailbox and orchestrator wiring for flow tests.

#![allow(dead_code)]

use std::collections::{BTreeMap, HashSet};
use std::time::Duration;

use async_trait::async_trait;

use mailsweep::db::history_repo::{self, OperationRow};
use mailsweep::db::list_repo::{self, PatternList};
use mailsweep::email::error::Result as EmailResult;
use mailsweep::visitor::VisitorSettings;
use mailsweep::{
    Config, Database, EmailError, LinkVisitor, MailSource, NoopProgress, Orchestrator, ScanReport,
};

/// A mailbox held in memory. Identifiers start at 1 in insertion order.
#[derive(Default)]
pub struct FakeMailbox {
    messages: BTreeMap<u32, Vec<u8>>,
    broken: HashSet<u32>,
    refuse_connect: bool,
    fail_search: bool,
    pub connected: bool,
    pub disconnects: usize,
}

impl FakeMailbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_message(mut self, raw: Vec<u8>) -> Self {
        let id = self.messages.len() as u32 + 1;
        self.messages.insert(id, raw);
        self
    }

    /// Adds a message whose fetch fails.
    pub fn with_broken_message(mut self) -> Self {
        let id = self.messages.len() as u32 + 1;
        self.messages.insert(id, Vec::new());
        self.broken.insert(id);
        self
    }

    pub fn refusing_connections(mut self) -> Self {
        self.refuse_connect = true;
        self
    }

    pub fn failing_search(mut self) -> Self {
        self.fail_search = true;
        self
    }
}

#[async_trait(?Send)]
impl MailSource for FakeMailbox {
    async fn connect(&mut self) -> EmailResult<()> {
        if self.refuse_connect {
            return Err(EmailError::ConnectionFailed(
                "connection refused".to_string(),
            ));
        }
        self.connected = true;
        Ok(())
    }

    async fn search(&mut self, _criteria: &str, limit: Option<usize>) -> EmailResult<Vec<u32>> {
        if !self.connected {
            return Err(EmailError::NotConnected);
        }
        if self.fail_search {
            return Err(EmailError::ProtocolError("SEARCH rejected".to_string()));
        }
        Ok(mailsweep::email::select_recent(
            self.messages.keys().copied(),
            limit,
        ))
    }

    async fn fetch(&mut self, id: u32) -> EmailResult<Vec<u8>> {
        if self.broken.contains(&id) {
            return Err(EmailError::ProtocolError(format!("FETCH {} failed", id)));
        }
        self.messages
            .get(&id)
            .cloned()
            .ok_or_else(|| EmailError::ProtocolError(format!("no message {}", id)))
    }

    async fn disconnect(&mut self) -> EmailResult<()> {
        self.connected = false;
        self.disconnects += 1;
        Ok(())
    }
}

/// An orchestrator over an in-memory store with all delays disabled.
pub struct TestHarness {
    pub orchestrator: Orchestrator,
}

impl TestHarness {
    pub fn new() -> Self {
        Self::with_retry_count(1)
    }

    pub fn with_retry_count(retry_count: u32) -> Self {
        let config = Config {
            link_click_delay: Duration::ZERO,
            retry_count,
            ..Config::default()
        };
        let visitor = LinkVisitor::new(VisitorSettings {
            timeout: Duration::from_secs(5),
            retry_count,
            retry_delay: Duration::ZERO,
        })
        .expect("visitor");
        let db = Database::open_in_memory().expect("in-memory database");
        let orchestrator = Orchestrator::new(config, db)
            .expect("orchestrator")
            .with_visitor(visitor);
        Self { orchestrator }
    }

    pub fn db(&self) -> &Database {
        self.orchestrator.database()
    }

    pub fn whitelist(&self, pattern: &str) {
        list_repo::add(self.db(), PatternList::Whitelist, pattern, None).expect("whitelist");
    }

    pub fn blacklist(&self, pattern: &str) {
        list_repo::add(self.db(), PatternList::Blacklist, pattern, None).expect("blacklist");
    }

    pub async fn scan(&self, mailbox: &mut FakeMailbox) -> ScanReport {
        self.orchestrator
            .scan(mailbox, None, &NoopProgress)
            .await
            .expect("scan")
    }

    /// Makes every later insert into the operation history fail.
    pub fn break_history_writes(&self) {
        self.db()
            .with_conn(|conn| {
                conn.execute_batch(
                    "CREATE TRIGGER reject_history BEFORE INSERT ON operation_history
                     BEGIN SELECT RAISE(FAIL, 'store write failed'); END;",
                )?;
                Ok(())
            })
            .expect("history trigger");
    }

    pub fn history(&self) -> Vec<OperationRow> {
        history_repo::recent(self.db(), 100).expect("history")
    }
}
