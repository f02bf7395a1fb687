//! Unsubscribe link extraction from HTML bodies and the List-Unsubscribe
//! header.
//!
//! Results are deduplicated and keep the order in which links were first
//! seen: HTML parts in message order, then header links.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use scraper::{Html, Selector};

const UNSUBSCRIBE_MARKER: &str = "unsubscribe";

static HEADER_URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<(https?://[^>]+)>").unwrap());

/// Returns the `http` links of anchors whose `href` or visible text
/// mentions "unsubscribe" (case-insensitive).
pub fn extract_from_html(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    let Ok(anchor_sel) = Selector::parse("a[href]") else {
        return Vec::new();
    };

    let mut seen = HashSet::new();
    let mut links = Vec::new();
    for anchor in document.select(&anchor_sel) {
        let href = anchor.value().attr("href").unwrap_or("").trim();
        let text = anchor.text().collect::<String>();

        let mentions = href.to_lowercase().contains(UNSUBSCRIBE_MARKER)
            || text.to_lowercase().contains(UNSUBSCRIBE_MARKER);
        if !mentions || !href.starts_with("http") {
            continue;
        }

        if seen.insert(href.to_string()) {
            links.push(href.to_string());
        }
    }
    links
}

/// Returns the bracketed `http(s)` URLs of a List-Unsubscribe value.
/// `mailto:` entries are ignored. Whitespace inside the brackets, left by
/// header folding, is removed.
pub fn extract_from_header(value: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    HEADER_URL
        .captures_iter(value)
        .map(|caps| caps[1].split_whitespace().collect::<String>())
        .filter(|url| seen.insert(url.clone()))
        .collect()
}

/// Unions the links of every HTML part with the header links.
pub fn merge_links<S: AsRef<str>>(html_parts: &[S], header: Option<&str>) -> Vec<String> {
    let mut seen = HashSet::new();
    html_parts
        .iter()
        .flat_map(|html| extract_from_html(html.as_ref()))
        .chain(header.map(extract_from_header).unwrap_or_default())
        .filter(|url| seen.insert(url.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_html_cases() {
        let cases: &[(&str, &[&str])] = &[
            (
                r#"<a href="https://x.example/unsubscribe?id=1">here</a>"#,
                &["https://x.example/unsubscribe?id=1"],
            ),
            (
                r#"<a href="https://x.example/opt-out">Unsubscribe from this list</a>"#,
                &["https://x.example/opt-out"],
            ),
            (
                r#"<a href="https://x.example/UNSUBSCRIBE">x</a>"#,
                &["https://x.example/UNSUBSCRIBE"],
            ),
            (r#"<a href="/unsubscribe">Unsubscribe</a>"#, &[]),
            (r#"<a href="mailto:unsubscribe@x.example">Unsubscribe</a>"#, &[]),
            (r#"<a href="https://x.example/home">Home</a>"#, &[]),
            (r#"<a>Unsubscribe</a>"#, &[]),
            (
                r#"<p><a href="http://x.example/u"><span>Click to</span> <b>unsubscribe</b></a></p>"#,
                &["http://x.example/u"],
            ),
            ("not html at all", &[]),
            ("", &[]),
        ];

        for (html, expected) in cases {
            assert_eq!(extract_from_html(html), *expected, "html: {html}");
        }
    }

    #[test]
    fn test_html_deduplicates() {
        let html = r#"
            <a href="https://x.example/unsubscribe">Unsubscribe</a>
            <a href="https://x.example/prefs">unsubscribe or manage</a>
            <a href="https://x.example/unsubscribe">unsubscribe again</a>
        "#;
        assert_eq!(
            extract_from_html(html),
            vec!["https://x.example/unsubscribe", "https://x.example/prefs"]
        );
    }

    #[test]
    fn test_header() {
        assert_eq!(
            extract_from_header(
                "<mailto:leave@x.example>, <https://x.example/u?a=1>, <http://y.example/u>"
            ),
            vec!["https://x.example/u?a=1", "http://y.example/u"]
        );
        assert!(extract_from_header("<mailto:leave@x.example>").is_empty());
        assert!(extract_from_header("").is_empty());
        assert!(extract_from_header("https://no-brackets.example/u").is_empty());
    }

    #[test]
    fn test_header_url_folded_across_lines() {
        assert_eq!(
            extract_from_header("<https://x.example/unsubscribe?list=42&\r\n token=abc>"),
            vec!["https://x.example/unsubscribe?list=42&token=abc"]
        );
        assert_eq!(
            extract_from_header("<mailto:leave@x.example>, <https://x.example/u/ 9f3e>"),
            vec!["https://x.example/u/9f3e"]
        );
    }

    #[test]
    fn test_merge_removes_duplicates_across_sources() {
        let html = r#"<a href="https://x.example/u1">Unsubscribe</a>
                      <a href="https://x.example/u2">unsubscribe all</a>"#;
        let merged = merge_links(&[html], Some("<https://x.example/u1>"));
        assert_eq!(merged, vec!["https://x.example/u1", "https://x.example/u2"]);
    }

    #[test]
    fn test_merge_without_header() {
        let parts: Vec<String> = Vec::new();
        assert!(merge_links(&parts, None).is_empty());
        assert_eq!(
            merge_links(&parts, Some("<https://x.example/one-click>")),
            vec!["https://x.example/one-click"]
        );
    }

    #[test]
    fn test_every_link_is_http() {
        let html = r#"
            <a href="javascript:unsubscribe()">unsubscribe</a>
            <a href="ftp://x.example/unsubscribe">unsubscribe</a>
            <a href="https://ok.example/unsubscribe">ok</a>
        "#;
        let links = extract_from_html(html);
        assert_eq!(links, vec!["https://ok.example/unsubscribe"]);
        assert!(links.iter().all(|l| l.starts_with("http")));
    }
}
