//! Whitelist / blacklist repository.
//!
//! Both lists share one shape and differ only in the table they live in.

use rusqlite::params;
use serde::Serialize;

use super::{now_timestamp, Database, DatabaseError};

/// Which sender list an operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PatternList {
    Whitelist,
    Blacklist,
}

impl PatternList {
    fn table(self) -> &'static str {
        match self {
            PatternList::Whitelist => "whitelist",
            PatternList::Blacklist => "blacklist",
        }
    }
}

impl std::fmt::Display for PatternList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.table())
    }
}

/// A stored sender pattern.
#[derive(Debug, Clone, Serialize)]
pub struct PatternRow {
    pub id: i64,
    pub email_pattern: String,
    pub notes: Option<String>,
    pub added_at: String,
}

/// Adds a pattern. Returns `false` when the pattern is already listed, in
/// which case the table is left unchanged.
pub fn add(
    db: &Database,
    list: PatternList,
    pattern: &str,
    notes: Option<&str>,
) -> Result<bool, DatabaseError> {
    db.with_conn(|conn| {
        let inserted = conn.execute(
            &format!(
                "INSERT OR IGNORE INTO {} (email_pattern, notes, added_at) VALUES (?1, ?2, ?3)",
                list.table()
            ),
            params![pattern, notes, now_timestamp()],
        )?;
        Ok(inserted == 1)
    })
}

/// Lists all entries, most recently added first.
pub fn list(db: &Database, list: PatternList) -> Result<Vec<PatternRow>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare(&format!(
            "SELECT id, email_pattern, notes, added_at FROM {} ORDER BY added_at DESC, id DESC",
            list.table()
        ))?;
        let rows = stmt
            .query_map([], |row| {
                Ok(PatternRow {
                    id: row.get(0)?,
                    email_pattern: row.get(1)?,
                    notes: row.get(2)?,
                    added_at: row.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}

/// Returns just the pattern strings of a list.
pub fn patterns(db: &Database, list: PatternList) -> Result<Vec<String>, DatabaseError> {
    Ok(self::list(db, list)?
        .into_iter()
        .map(|row| row.email_pattern)
        .collect())
}

/// Removes an entry by id. Returns whether a row was deleted.
pub fn remove(db: &Database, list: PatternList, id: i64) -> Result<bool, DatabaseError> {
    db.with_conn(|conn| {
        let deleted = conn.execute(
            &format!("DELETE FROM {} WHERE id = ?1", list.table()),
            params![id],
        )?;
        Ok(deleted == 1)
    })
}

/// Counts the entries of a list.
pub fn count(db: &Database, list: PatternList) -> Result<u64, DatabaseError> {
    db.with_conn(|conn| {
        let count: u64 = conn.query_row(
            &format!("SELECT COUNT(*) FROM {}", list.table()),
            [],
            |r| r.get(0),
        )?;
        Ok(count)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_db() -> Database {
        Database::open_in_memory().expect("Failed to create test database")
    }

    #[test]
    fn test_add_and_list() {
        let db = test_db();
        assert!(add(&db, PatternList::Whitelist, "*@bank.example", Some("statements")).unwrap());
        assert!(add(&db, PatternList::Whitelist, "boss@work.example", None).unwrap());

        let rows = list(&db, PatternList::Whitelist).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].email_pattern, "boss@work.example");
        assert_eq!(rows[1].notes.as_deref(), Some("statements"));
    }

    #[test]
    fn test_duplicate_pattern_is_rejected() {
        let db = test_db();
        assert!(add(&db, PatternList::Blacklist, "spam@x.com", None).unwrap());
        assert!(!add(&db, PatternList::Blacklist, "spam@x.com", Some("again")).unwrap());
        assert_eq!(count(&db, PatternList::Blacklist).unwrap(), 1);
    }

    #[test]
    fn test_lists_are_independent() {
        let db = test_db();
        assert!(add(&db, PatternList::Whitelist, "a@x.com", None).unwrap());
        assert!(add(&db, PatternList::Blacklist, "a@x.com", None).unwrap());
        assert_eq!(patterns(&db, PatternList::Whitelist).unwrap(), vec!["a@x.com"]);
        assert_eq!(patterns(&db, PatternList::Blacklist).unwrap(), vec!["a@x.com"]);
    }

    #[test]
    fn test_remove() {
        let db = test_db();
        add(&db, PatternList::Whitelist, "a@x.com", None).unwrap();
        let id = list(&db, PatternList::Whitelist).unwrap()[0].id;

        assert!(remove(&db, PatternList::Whitelist, id).unwrap());
        assert!(!remove(&db, PatternList::Whitelist, id).unwrap());
        assert_eq!(count(&db, PatternList::Whitelist).unwrap(), 0);
    }
}
