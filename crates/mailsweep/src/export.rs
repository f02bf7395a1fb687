//! Plain-text report of every stored unsubscribe link.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use chrono::Utc;
use log::info;

use crate::db::link_repo;
use crate::db::Database;
use crate::error::{MailsweepError, Result};

const REPORT_TITLE: &str = "Email Unsubscribe Links Export";
const RULE_WIDTH: usize = 80;

/// Writes the report, newest link first, and returns the number of links.
pub fn write_links_report<W: Write>(db: &Database, out: &mut W) -> Result<usize> {
    let links = link_repo::list_with_email(db)?;
    render(&links, out).map_err(|source| MailsweepError::Export {
        path: "<writer>".into(),
        source,
    })?;
    Ok(links.len())
}

/// Writes the report to `path`, replacing any existing file.
pub fn export_links(db: &Database, path: &Path) -> Result<usize> {
    let links = link_repo::list_with_email(db)?;

    let export_err = |source| MailsweepError::Export {
        path: path.to_path_buf(),
        source,
    };
    let file = File::create(path).map_err(export_err)?;
    let mut out = BufWriter::new(file);
    render(&links, &mut out).map_err(export_err)?;
    out.flush().map_err(export_err)?;

    info!("Exported {} links to {}", links.len(), path.display());
    Ok(links.len())
}

fn render<W: Write>(links: &[link_repo::LinkWithEmail], out: &mut W) -> std::io::Result<()> {
    writeln!(out, "{}", REPORT_TITLE)?;
    writeln!(out, "Generated: {}", Utc::now().format("%Y-%m-%d %H:%M:%S UTC"))?;
    writeln!(out, "{}", "=".repeat(RULE_WIDTH))?;
    writeln!(out)?;

    for link in links {
        writeln!(out, "Sender: {}", link.sender)?;
        writeln!(out, "Subject: {}", link.subject.as_deref().unwrap_or(""))?;
        writeln!(out, "Link: {}", link.url)?;
        writeln!(out, "Clicked: {}", if link.clicked { "Yes" } else { "No" })?;
        if let Some(clicked_at) = &link.click_timestamp {
            writeln!(out, "Click Time: {}", clicked_at)?;
        }
        writeln!(out, "{}", "-".repeat(RULE_WIDTH))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::categorizer::Category;
    use crate::db::email_repo::{self, NewEmail};
    use crate::db::link_repo::VisitRecord;

    fn seeded_db() -> Database {
        let db = Database::open_in_memory().unwrap();
        let email_id = email_repo::find_or_create(
            &db,
            &NewEmail {
                message_id: "<e@shop>",
                sender: "news@shop.example",
                subject: "Deals",
                received_date: Utc::now(),
                category: Category::Promotion,
            },
        )
        .unwrap();
        let first = link_repo::insert(&db, email_id, "https://shop.example/u1")
            .unwrap()
            .unwrap();
        link_repo::insert(&db, email_id, "https://shop.example/u2").unwrap();
        link_repo::record_visit(
            &db,
            first,
            &VisitRecord {
                status_code: Some(200),
                ..Default::default()
            },
        )
        .unwrap();
        db
    }

    #[test]
    fn test_report_layout() {
        let db = seeded_db();
        let mut buf = Vec::new();
        let count = write_links_report(&db, &mut buf).unwrap();
        assert_eq!(count, 2);

        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Email Unsubscribe Links Export");
        assert!(lines[1].starts_with("Generated: "));
        assert_eq!(lines[2], "=".repeat(80));

        // newest first
        let u2 = text.find("Link: https://shop.example/u2").unwrap();
        let u1 = text.find("Link: https://shop.example/u1").unwrap();
        assert!(u2 < u1);

        assert_eq!(text.matches("Clicked: Yes").count(), 1);
        assert_eq!(text.matches("Clicked: No").count(), 1);
        assert_eq!(text.matches("Click Time: ").count(), 1);
        assert_eq!(text.matches(&"-".repeat(80)).count(), 2);
    }

    #[test]
    fn test_export_to_file() {
        let db = seeded_db();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("links.txt");

        assert_eq!(export_links(&db, &path).unwrap(), 2);
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("Sender: news@shop.example"));
        assert!(text.contains("Subject: Deals"));
    }

    #[test]
    fn test_export_to_missing_directory_fails() {
        let db = seeded_db();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("links.txt");

        assert!(matches!(
            export_links(&db, &path),
            Err(MailsweepError::Export { .. })
        ));
    }
}
