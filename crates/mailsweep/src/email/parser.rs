//! Parsing of raw RFC 822 messages into the fields the scan flow needs.

use chrono::{DateTime, SecondsFormat, Utc};
use log::debug;
use mail_parser::{Addr, Message, MessageParser, MimeHeaders, PartType};

use super::error::{EmailError, Result};

/// A parsed message.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedEmail {
    /// The Message-ID, or a stable identifier generated from the sender,
    /// date and subject when the header is missing.
    pub message_id: String,
    /// Bare sender address, display name discarded.
    pub sender: String,
    pub subject: String,
    /// Date header, or the time of parsing when absent or unreadable.
    pub received_date: DateTime<Utc>,
    /// The From header as written, with encoded words decoded.
    pub from_header: String,
    /// Every `text/html` part, decoded to text.
    pub html_parts: Vec<String>,
    /// Raw List-Unsubscribe header value, unfolded.
    pub list_unsubscribe: Option<String>,
}

impl ParsedEmail {
    pub fn parse(raw: &[u8]) -> Result<Self> {
        if raw.iter().all(u8::is_ascii_whitespace) {
            return Err(EmailError::ParseError("Empty message".to_string()));
        }

        let message = MessageParser::default()
            .parse(raw)
            .ok_or_else(|| EmailError::ParseError("Failed to parse email message".to_string()))?;

        let first_from = message.from().and_then(|from| from.first());
        let sender = first_from
            .and_then(|addr| addr.address())
            .map(|s| s.trim().to_string())
            .unwrap_or_default();
        let from_header = first_from
            .map(format_address)
            .or_else(|| raw_header(&message, "From"))
            .unwrap_or_default();

        let subject = message.subject().unwrap_or_default().to_string();

        let received_date = message
            .date()
            .and_then(|d| DateTime::<Utc>::from_timestamp(d.to_timestamp(), 0))
            .unwrap_or_else(Utc::now);

        let message_id = match message.message_id() {
            Some(id) if !id.trim().is_empty() => id.trim().to_string(),
            _ => fallback_message_id(&sender, &received_date, &subject),
        };

        let html_parts = html_parts(&message);
        let list_unsubscribe = raw_header(&message, "List-Unsubscribe");

        debug!(
            "Parsed message {} from {:?}: {} html part(s), list-unsubscribe={}",
            message_id,
            sender,
            html_parts.len(),
            list_unsubscribe.is_some()
        );

        Ok(Self {
            message_id,
            sender,
            subject,
            received_date,
            from_header,
            html_parts,
            list_unsubscribe,
        })
    }
}

fn fallback_message_id(sender: &str, date: &DateTime<Utc>, subject: &str) -> String {
    format!(
        "generated:{}:{}:{}",
        sender,
        date.to_rfc3339_opts(SecondsFormat::Secs, true),
        subject
    )
}

fn format_address(addr: &Addr<'_>) -> String {
    match (addr.name(), addr.address()) {
        (Some(name), Some(address)) => format!("{} <{}>", name, address),
        (None, Some(address)) => address.to_string(),
        (Some(name), None) => name.to_string(),
        (None, None) => String::new(),
    }
}

/// Returns the raw text of the first header with the given name, with
/// folding line breaks removed.
fn raw_header(message: &Message<'_>, name: &str) -> Option<String> {
    let raw = message.raw_message();
    message
        .headers()
        .iter()
        .find(|h| h.name().eq_ignore_ascii_case(name))
        .and_then(|h| raw.get(h.offset_start as usize..h.offset_end as usize))
        .map(|bytes| {
            String::from_utf8_lossy(bytes)
                .split(['\r', '\n'])
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .collect::<Vec<_>>()
                .join(" ")
        })
        .filter(|value| !value.is_empty())
}

/// Walks every MIME part and returns the text of those typed `text/html`.
fn html_parts(message: &Message<'_>) -> Vec<String> {
    message
        .parts
        .iter()
        .filter(|part| {
            part.content_type().is_some_and(|ct| {
                ct.ctype().eq_ignore_ascii_case("text")
                    && ct
                        .subtype()
                        .is_some_and(|sub| sub.eq_ignore_ascii_case("html"))
            })
        })
        .filter_map(|part| match &part.body {
            PartType::Html(html) => Some(html.to_string()),
            PartType::Text(text) => Some(text.to_string()),
            PartType::Binary(data) | PartType::InlineBinary(data) => {
                Some(String::from_utf8_lossy(data).into_owned())
            }
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const MULTIPART: &str = "From: \"Shop News\" <news@shop.example>\r\n\
To: me@example.com\r\n\
Subject: =?UTF-8?B?V2Vla2x5IGRlYWxz?=\r\n\
Date: Tue, 03 Mar 2026 10:15:00 +0000\r\n\
Message-ID: <abc123@shop.example>\r\n\
List-Unsubscribe: <mailto:leave@shop.example>,\r\n \
<https://shop.example/unsub?u=1>\r\n\
MIME-Version: 1.0\r\n\
Content-Type: multipart/alternative; boundary=\"BOUNDARY\"\r\n\
\r\n\
--BOUNDARY\r\n\
Content-Type: text/plain; charset=utf-8\r\n\
\r\n\
Plain body\r\n\
--BOUNDARY\r\n\
Content-Type: text/html; charset=utf-8\r\n\
\r\n\
<html><body><a href=\"https://shop.example/unsubscribe\">Unsubscribe</a></body></html>\r\n\
--BOUNDARY--\r\n";

    #[test]
    fn test_parse_multipart() {
        let parsed = ParsedEmail::parse(MULTIPART.as_bytes()).unwrap();
        assert_eq!(parsed.message_id, "abc123@shop.example");
        assert_eq!(parsed.sender, "news@shop.example");
        assert_eq!(parsed.from_header, "Shop News <news@shop.example>");
        assert_eq!(parsed.subject, "Weekly deals");
        assert_eq!(
            parsed.received_date,
            DateTime::parse_from_rfc3339("2026-03-03T10:15:00Z")
                .unwrap()
                .with_timezone(&Utc)
        );
        assert_eq!(parsed.html_parts.len(), 1);
        assert!(parsed.html_parts[0].contains("https://shop.example/unsubscribe"));
        assert_eq!(
            parsed.list_unsubscribe.as_deref(),
            Some("<mailto:leave@shop.example>, <https://shop.example/unsub?u=1>")
        );
    }

    #[test]
    fn test_list_unsubscribe_url_folded_mid_link() {
        let raw = "From: news@shop.example\r\n\
Subject: Deals\r\n\
Message-ID: <fold@shop.example>\r\n\
List-Unsubscribe: <https://shop.example/unsubscribe/very-long-\r\n \
token-0123456789>\r\n\
Content-Type: text/plain\r\n\
\r\n\
Body\r\n";
        let parsed = ParsedEmail::parse(raw.as_bytes()).unwrap();
        let header = parsed.list_unsubscribe.as_deref().unwrap();
        assert_eq!(
            crate::extract::extract_from_header(header),
            vec!["https://shop.example/unsubscribe/very-long-token-0123456789"]
        );
    }

    #[test]
    fn test_single_part_html() {
        let raw = "From: alerts@bank.example\r\n\
Subject: Alert\r\n\
Message-ID: <x@bank>\r\n\
Content-Type: text/html; charset=utf-8\r\n\
\r\n\
<p>Hello</p>\r\n";
        let parsed = ParsedEmail::parse(raw.as_bytes()).unwrap();
        assert_eq!(parsed.sender, "alerts@bank.example");
        assert_eq!(parsed.html_parts.len(), 1);
        assert!(parsed.html_parts[0].contains("<p>Hello</p>"));
        assert!(parsed.list_unsubscribe.is_none());
    }

    #[test]
    fn test_plain_text_has_no_html_parts() {
        let raw = "From: a@b.example\r\nSubject: Hi\r\nMessage-ID: <p@b>\r\n\r\nJust text\r\n";
        let parsed = ParsedEmail::parse(raw.as_bytes()).unwrap();
        assert!(parsed.html_parts.is_empty());
    }

    #[test]
    fn test_bad_date_falls_back_to_now() {
        let before = Utc::now();
        let raw = "From: a@b.example\r\nDate: not a date\r\nMessage-ID: <d@b>\r\n\r\nbody\r\n";
        let parsed = ParsedEmail::parse(raw.as_bytes()).unwrap();
        assert!(parsed.received_date >= before - chrono::Duration::seconds(1));
    }

    #[test]
    fn test_missing_message_id_is_generated() {
        let raw = "From: a@b.example\r\n\
Subject: Hello\r\n\
Date: Tue, 03 Mar 2026 10:15:00 +0000\r\n\
\r\n\
body\r\n";
        let first = ParsedEmail::parse(raw.as_bytes()).unwrap();
        let second = ParsedEmail::parse(raw.as_bytes()).unwrap();
        assert_eq!(
            first.message_id,
            "generated:a@b.example:2026-03-03T10:15:00Z:Hello"
        );
        assert_eq!(first.message_id, second.message_id);
    }

    #[test]
    fn test_empty_input_is_error() {
        assert!(matches!(
            ParsedEmail::parse(b"  \r\n"),
            Err(EmailError::ParseError(_))
        ));
    }
}
