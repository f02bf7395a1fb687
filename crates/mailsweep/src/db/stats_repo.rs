//! Aggregate statistics over stored emails and links.

use std::collections::BTreeMap;

use serde::Serialize;

use super::{Database, DatabaseError};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Statistics {
    pub total_processed: u64,
    pub emails_with_links: u64,
    pub links_clicked: u64,
    /// Clicked links whose last response was a 2xx status.
    pub successful_clicks: u64,
    pub category_breakdown: BTreeMap<String, u64>,
}

pub fn statistics(db: &Database) -> Result<Statistics, DatabaseError> {
    db.with_conn(|conn| {
        let total_processed: u64 = conn.query_row(
            "SELECT COUNT(*) FROM emails WHERE processed = 1",
            [],
            |r| r.get(0),
        )?;
        let emails_with_links: u64 = conn.query_row(
            "SELECT COUNT(*) FROM emails WHERE has_unsubscribe_link = 1",
            [],
            |r| r.get(0),
        )?;
        let links_clicked: u64 = conn.query_row(
            "SELECT COUNT(*) FROM unsubscribe_links WHERE clicked = 1",
            [],
            |r| r.get(0),
        )?;
        let successful_clicks: u64 = conn.query_row(
            "SELECT COUNT(*) FROM unsubscribe_links
             WHERE clicked = 1 AND status_code >= 200 AND status_code < 300",
            [],
            |r| r.get(0),
        )?;

        let mut stmt =
            conn.prepare("SELECT category, COUNT(*) FROM emails GROUP BY category")?;
        let category_breakdown = stmt
            .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, u64>(1)?)))?
            .collect::<Result<BTreeMap<_, _>, _>>()?;

        Ok(Statistics {
            total_processed,
            emails_with_links,
            links_clicked,
            successful_clicks,
            category_breakdown,
        })
    })
}
