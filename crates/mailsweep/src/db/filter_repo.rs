//! Custom filter repository: user-defined named patterns.

use rusqlite::params;
use serde::Serialize;

use super::{now_timestamp, Database, DatabaseError};

#[derive(Debug, Clone, Serialize)]
pub struct FilterRow {
    pub id: i64,
    pub name: String,
    pub pattern: String,
    pub filter_type: String,
    pub enabled: bool,
    pub created_at: String,
}

/// Adds an enabled filter and returns its id.
pub fn add(
    db: &Database,
    name: &str,
    pattern: &str,
    filter_type: &str,
) -> Result<i64, DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO custom_filters (name, pattern, filter_type, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![name, pattern, filter_type, now_timestamp()],
        )?;
        Ok(conn.last_insert_rowid())
    })
}

/// Lists enabled filters in creation order.
pub fn list_enabled(db: &Database) -> Result<Vec<FilterRow>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare(
            "SELECT id, name, pattern, filter_type, enabled, created_at
             FROM custom_filters WHERE enabled = 1 ORDER BY id",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok(FilterRow {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    pattern: row.get(2)?,
                    filter_type: row.get(3)?,
                    enabled: row.get(4)?,
                    created_at: row.get(5)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}

/// Enables or disables a filter. Returns whether the filter exists.
pub fn set_enabled(db: &Database, id: i64, enabled: bool) -> Result<bool, DatabaseError> {
    db.with_conn(|conn| {
        let updated = conn.execute(
            "UPDATE custom_filters SET enabled = ?1 WHERE id = ?2",
            params![enabled, id],
        )?;
        Ok(updated == 1)
    })
}
