//! Operation history, an append-only log of scan and unsubscribe outcomes.

use std::fmt;
use std::str::FromStr;

use rusqlite::{params, Row};
use serde::{Deserialize, Serialize};

use super::{now_timestamp, Database, DatabaseError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    Scan,
    Unsubscribe,
}

impl OperationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Scan => "scan",
            Self::Unsubscribe => "unsubscribe",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for OperationKind {
    type Err = DatabaseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "scan" => Ok(Self::Scan),
            "unsubscribe" => Ok(Self::Unsubscribe),
            other => Err(DatabaseError::InvalidValue {
                column: "operation_type",
                value: other.to_string(),
            }),
        }
    }
}

/// Outcome recorded for an operation.
///
/// `Failed` marks an expected negative result (a link that did not respond
/// with success, a mailbox that refused the login); `Error` marks an item
/// that could not be processed at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationStatus {
    Success,
    Failed,
    Error,
}

impl OperationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failed => "failed",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for OperationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for OperationStatus {
    type Err = DatabaseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "success" => Ok(Self::Success),
            "failed" => Ok(Self::Failed),
            "error" => Ok(Self::Error),
            other => Err(DatabaseError::InvalidValue {
                column: "status",
                value: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct OperationRow {
    pub id: i64,
    pub operation_type: OperationKind,
    pub email_id: Option<i64>,
    pub status: OperationStatus,
    pub details: Option<String>,
    pub timestamp: String,
}

fn map_row(row: &Row<'_>) -> rusqlite::Result<OperationRow> {
    let kind: String = row.get(1)?;
    let status: String = row.get(3)?;
    Ok(OperationRow {
        id: row.get(0)?,
        operation_type: kind.parse().unwrap_or(OperationKind::Scan),
        email_id: row.get(2)?,
        status: status.parse().unwrap_or(OperationStatus::Error),
        details: row.get(4)?,
        timestamp: row.get(5)?,
    })
}

/// Appends an operation row and returns its id.
pub fn log(
    db: &Database,
    kind: OperationKind,
    email_id: Option<i64>,
    status: OperationStatus,
    details: &str,
) -> Result<i64, DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO operation_history (operation_type, email_id, status, details, timestamp)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![kind.as_str(), email_id, status.as_str(), details, now_timestamp()],
        )?;
        Ok(conn.last_insert_rowid())
    })
}

/// Returns up to `limit` operations, newest first.
pub fn recent(db: &Database, limit: u32) -> Result<Vec<OperationRow>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare(
            "SELECT id, operation_type, email_id, status, details, timestamp
             FROM operation_history ORDER BY timestamp DESC, id DESC LIMIT ?1",
        )?;
        let rows = stmt
            .query_map(params![limit], map_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}

pub fn count(db: &Database) -> Result<u64, DatabaseError> {
    db.with_conn(|conn| {
        let count: u64 =
            conn.query_row("SELECT COUNT(*) FROM operation_history", [], |r| r.get(0))?;
        Ok(count)
    })
}
