//! Email repository: CRUD operations for the `emails` table.

use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension, Row};
use serde::Serialize;

use crate::categorizer::Category;

use super::{format_timestamp, now_timestamp, parse_timestamp, Database, DatabaseError};

/// Values for a new email record.
#[derive(Debug, Clone)]
pub struct NewEmail<'a> {
    pub message_id: &'a str,
    pub sender: &'a str,
    pub subject: &'a str,
    pub received_date: DateTime<Utc>,
    pub category: Category,
}

/// A stored email row.
#[derive(Debug, Clone, Serialize)]
pub struct EmailRow {
    pub id: i64,
    pub message_id: String,
    pub sender: String,
    pub subject: Option<String>,
    pub received_date: Option<DateTime<Utc>>,
    pub category: Category,
    pub has_unsubscribe_link: bool,
    pub processed: bool,
    pub created_at: String,
}

const SELECT_COLUMNS: &str = "SELECT id, message_id, sender, subject, received_date, category,
     has_unsubscribe_link, processed, created_at FROM emails";

fn map_row(row: &Row<'_>) -> rusqlite::Result<EmailRow> {
    let received: Option<String> = row.get(4)?;
    let category: String = row.get(5)?;
    Ok(EmailRow {
        id: row.get(0)?,
        message_id: row.get(1)?,
        sender: row.get(2)?,
        subject: row.get(3)?,
        received_date: received.as_deref().and_then(parse_timestamp),
        category: category.parse().unwrap_or(Category::Uncategorized),
        has_unsubscribe_link: row.get(6)?,
        processed: row.get(7)?,
        created_at: row.get(8)?,
    })
}

/// Inserts the email unless a row with the same message identifier exists,
/// and returns the identifier of the row that now holds it.
///
/// An existing row is returned untouched.
pub fn find_or_create(db: &Database, email: &NewEmail<'_>) -> Result<i64, DatabaseError> {
    db.with_conn(|conn| {
        let inserted = conn.execute(
            "INSERT INTO emails (message_id, sender, subject, received_date, category, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(message_id) DO NOTHING",
            params![
                email.message_id,
                email.sender,
                email.subject,
                format_timestamp(&email.received_date),
                email.category.as_str(),
                now_timestamp(),
            ],
        )?;

        if inserted == 1 {
            return Ok(conn.last_insert_rowid());
        }

        let id = conn.query_row(
            "SELECT id FROM emails WHERE message_id = ?1",
            params![email.message_id],
            |r| r.get(0),
        )?;
        Ok(id)
    })
}

/// Finds an email by its row identifier.
pub fn find_by_id(db: &Database, id: i64) -> Result<Option<EmailRow>, DatabaseError> {
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

/// Finds an email by its message identifier.
pub fn find_by_message_id(
    db: &Database,
    message_id: &str,
) -> Result<Option<EmailRow>, DatabaseError> {
    db.with_conn(|conn| {
        let row = conn
            .query_row(
                &format!("{SELECT_COLUMNS} WHERE message_id = ?1"),
                params![message_id],
                map_row,
            )
            .optional()?;
        Ok(row)
    })
}

/// Marks an email as processed and records whether it has links.
pub fn mark_processed(
    db: &Database,
    id: i64,
    has_unsubscribe_link: bool,
) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            "UPDATE emails SET processed = 1, has_unsubscribe_link = ?1 WHERE id = ?2",
            params![has_unsubscribe_link, id],
        )?;
        Ok(())
    })
}

/// Replaces the stored category of an email.
pub fn update_category(db: &Database, id: i64, category: Category) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            "UPDATE emails SET category = ?1 WHERE id = ?2",
            params![category.as_str(), id],
        )?;
        Ok(())
    })
}

/// Lists emails not yet marked processed, newest first.
pub fn list_unprocessed(db: &Database) -> Result<Vec<EmailRow>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare(&format!(
            "{SELECT_COLUMNS} WHERE processed = 0 ORDER BY received_date DESC, id DESC"
        ))?;
        let rows = stmt
            .query_map([], map_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}

/// Counts all stored emails.
pub fn count(db: &Database) -> Result<u64, DatabaseError> {
    db.with_conn(|conn| {
        let count: u64 = conn.query_row("SELECT COUNT(*) FROM emails", [], |r| r.get(0))?;
        Ok(count)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_db() -> Database {
        Database::open_in_memory().expect("Failed to create test database")
    }

    fn sample(message_id: &str) -> NewEmail<'_> {
        NewEmail {
            message_id,
            sender: "news@shop.example",
            subject: "Weekly deals",
            received_date: DateTime::parse_from_rfc3339("2026-03-01T08:00:00Z")
                .unwrap()
                .with_timezone(&Utc),
            category: Category::Newsletter,
        }
    }

    #[test]
    fn test_insert_and_find() {
        let db = test_db();
        let id = find_or_create(&db, &sample("<1@shop>")).unwrap();

        let row = find_by_id(&db, id).unwrap().unwrap();
        assert_eq!(row.message_id, "<1@shop>");
        assert_eq!(row.sender, "news@shop.example");
        assert_eq!(row.subject.as_deref(), Some("Weekly deals"));
        assert_eq!(row.category, Category::Newsletter);
        assert!(!row.processed);
        assert!(!row.has_unsubscribe_link);
        assert_eq!(row.received_date, Some(sample("x").received_date));
    }

    #[test]
    fn test_duplicate_message_id_returns_existing_id() {
        let db = test_db();
        let first = find_or_create(&db, &sample("<dup@shop>")).unwrap();

        let mut again = sample("<dup@shop>");
        again.subject = "Different subject";
        let second = find_or_create(&db, &again).unwrap();

        assert_eq!(first, second);
        assert_eq!(count(&db).unwrap(), 1);
        let row = find_by_id(&db, first).unwrap().unwrap();
        assert_eq!(row.subject.as_deref(), Some("Weekly deals"));
    }

    #[test]
    fn test_find_by_message_id() {
        let db = test_db();
        let id = find_or_create(&db, &sample("<m@shop>")).unwrap();
        assert_eq!(find_by_message_id(&db, "<m@shop>").unwrap().unwrap().id, id);
        assert!(find_by_message_id(&db, "<other@shop>").unwrap().is_none());
    }

    #[test]
    fn test_mark_processed_and_unprocessed_list() {
        let db = test_db();
        let a = find_or_create(&db, &sample("<a@shop>")).unwrap();
        let b = find_or_create(&db, &sample("<b@shop>")).unwrap();

        mark_processed(&db, a, true).unwrap();

        let pending = list_unprocessed(&db).unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, b);

        let row = find_by_id(&db, a).unwrap().unwrap();
        assert!(row.processed);
        assert!(row.has_unsubscribe_link);
    }

    #[test]
    fn test_update_category() {
        let db = test_db();
        let id = find_or_create(&db, &sample("<c@shop>")).unwrap();
        update_category(&db, id, Category::Promotion).unwrap();
        assert_eq!(
            find_by_id(&db, id).unwrap().unwrap().category,
            Category::Promotion
        );
    }
}
