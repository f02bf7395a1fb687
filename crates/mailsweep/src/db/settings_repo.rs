//! Key/value settings persisted alongside the scan data.

use rusqlite::{params, OptionalExtension};

use super::{now_timestamp, Database, DatabaseError};

pub fn get(db: &Database, key: &str) -> Result<Option<String>, DatabaseError> {
    db.with_conn(|conn| {
        let value = conn
            .query_row(
                "SELECT value FROM settings WHERE key = ?1",
                params![key],
                |r| r.get(0),
            )
            .optional()?;
        Ok(value)
    })
}

/// Inserts or replaces a setting.
pub fn set(db: &Database, key: &str, value: &str) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO settings (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![key, value, now_timestamp()],
        )?;
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_missing() {
        let db = Database::open_in_memory().unwrap();
        assert_eq!(get(&db, "nope").unwrap(), None);
    }

    #[test]
    fn test_set_overwrites() {
        let db = Database::open_in_memory().unwrap();
        set(&db, "auto_mode", "false").unwrap();
        set(&db, "auto_mode", "true").unwrap();
        assert_eq!(get(&db, "auto_mode").unwrap(), Some("true".to_string()));

        let rows: u32 = db
            .with_conn(|conn| Ok(conn.query_row("SELECT COUNT(*) FROM settings", [], |r| r.get(0))?))
            .unwrap();
        assert_eq!(rows, 1);
    }
}
