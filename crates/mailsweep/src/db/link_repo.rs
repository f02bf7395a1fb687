//! Unsubscribe link repository: CRUD operations for `unsubscribe_links`.

use std::time::Duration;

use rusqlite::{params, params_from_iter, OptionalExtension, Row};
use serde::Serialize;

use super::{now_timestamp, Database, DatabaseError};

/// A stored unsubscribe link.
#[derive(Debug, Clone, Serialize)]
pub struct LinkRow {
    pub id: i64,
    pub email_id: i64,
    pub url: String,
    pub clicked: bool,
    pub click_timestamp: Option<String>,
    pub status_code: Option<u16>,
    pub error_message: Option<String>,
    pub response_time_ms: Option<i64>,
    pub created_at: String,
}

/// Final outcome of visiting a link, as stored on the row.
#[derive(Debug, Clone, Default)]
pub struct VisitRecord {
    pub status_code: Option<u16>,
    pub error_message: Option<String>,
    pub response_time: Option<Duration>,
}

/// A link joined with the email it was found in, for reports.
#[derive(Debug, Clone, Serialize)]
pub struct LinkWithEmail {
    pub url: String,
    pub sender: String,
    pub subject: Option<String>,
    pub clicked: bool,
    pub click_timestamp: Option<String>,
}

const SELECT_COLUMNS: &str = "SELECT id, email_id, link, clicked, click_timestamp, status_code,
     error_message, response_time_ms, created_at FROM unsubscribe_links";

fn map_row(row: &Row<'_>) -> rusqlite::Result<LinkRow> {
    Ok(LinkRow {
        id: row.get(0)?,
        email_id: row.get(1)?,
        url: row.get(2)?,
        clicked: row.get(3)?,
        click_timestamp: row.get(4)?,
        status_code: row.get(5)?,
        error_message: row.get(6)?,
        response_time_ms: row.get(7)?,
        created_at: row.get(8)?,
    })
}

/// Stores a link for an email. Returns the new row id, or `None` when the
/// same URL is already recorded for that email.
pub fn insert(db: &Database, email_id: i64, url: &str) -> Result<Option<i64>, DatabaseError> {
    db.with_conn(|conn| {
        let inserted = conn.execute(
            "INSERT INTO unsubscribe_links (email_id, link, created_at)
             SELECT ?1, ?2, ?3
             WHERE NOT EXISTS (
                 SELECT 1 FROM unsubscribe_links WHERE email_id = ?1 AND link = ?2
             )",
            params![email_id, url, now_timestamp()],
        )?;
        Ok((inserted == 1).then(|| conn.last_insert_rowid()))
    })
}

/// Finds a link by id.
pub fn find_by_id(db: &Database, id: i64) -> Result<Option<LinkRow>, DatabaseError> {
    db.with_conn(|conn| {
        let row = conn
            .query_row(
                &format!("{SELECT_COLUMNS} WHERE id = ?1"),
                params![id],
                map_row,
            )
            .optional()?;
        Ok(row)
    })
}

/// Lists all links found in one email, in insertion order.
pub fn list_for_email(db: &Database, email_id: i64) -> Result<Vec<LinkRow>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare(&format!(
            "{SELECT_COLUMNS} WHERE email_id = ?1 ORDER BY id"
        ))?;
        let rows = stmt
            .query_map(params![email_id], map_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}

/// Counts the links recorded for one email.
pub fn count_for_email(db: &Database, email_id: i64) -> Result<u64, DatabaseError> {
    db.with_conn(|conn| {
        let count: u64 = conn.query_row(
            "SELECT COUNT(*) FROM unsubscribe_links WHERE email_id = ?1",
            params![email_id],
            |r| r.get(0),
        )?;
        Ok(count)
    })
}

/// Lists links that have never been clicked. With `ids`, only those links
/// are considered; an empty id list yields nothing.
pub fn list_unclicked(db: &Database, ids: Option<&[i64]>) -> Result<Vec<LinkRow>, DatabaseError> {
    if matches!(ids, Some(ids) if ids.is_empty()) {
        return Ok(Vec::new());
    }

    db.with_conn(|conn| {
        let rows = match ids {
            Some(ids) => {
                let placeholders: Vec<String> =
                    (0..ids.len()).map(|i| format!("?{}", i + 1)).collect();
                let sql = format!(
                    "{SELECT_COLUMNS} WHERE clicked = 0 AND id IN ({}) ORDER BY id",
                    placeholders.join(", ")
                );
                let mut stmt = conn.prepare(&sql)?;
                let rows = stmt
                    .query_map(params_from_iter(ids.iter()), map_row)?
                    .collect::<Result<Vec<_>, _>>()?;
                rows
            }
            None => {
                let mut stmt =
                    conn.prepare(&format!("{SELECT_COLUMNS} WHERE clicked = 0 ORDER BY id"))?;
                let rows = stmt
                    .query_map([], map_row)?
                    .collect::<Result<Vec<_>, _>>()?;
                rows
            }
        };
        Ok(rows)
    })
}

/// Records the final outcome of a visit: the link becomes clicked, stamped
/// with the current time, and keeps only the last status and error.
pub fn record_visit(db: &Database, id: i64, visit: &VisitRecord) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            "UPDATE unsubscribe_links
             SET clicked = 1, click_timestamp = ?1, status_code = ?2, error_message = ?3,
                 response_time_ms = ?4
             WHERE id = ?5",
            params![
                now_timestamp(),
                visit.status_code,
                visit.error_message,
                visit.response_time.map(|d| d.as_millis() as i64),
                id,
            ],
        )?;
        Ok(())
    })
}

/// Lists every link joined to its email, newest link first.
pub fn list_with_email(db: &Database) -> Result<Vec<LinkWithEmail>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare(
            "SELECT ul.link, e.sender, e.subject, ul.clicked, ul.click_timestamp
             FROM unsubscribe_links ul
             JOIN emails e ON ul.email_id = e.id
             ORDER BY ul.created_at DESC, ul.id DESC",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok(LinkWithEmail {
                    url: row.get(0)?,
                    sender: row.get(1)?,
                    subject: row.get(2)?,
                    clicked: row.get(3)?,
                    click_timestamp: row.get(4)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}
