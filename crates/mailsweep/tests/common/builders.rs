//! Builders for raw test messages.

#![allow(dead_code)]

/// Builder for a raw message with an optional HTML body and
/// List-Unsubscribe header.
pub struct MessageBuilder {
    from: String,
    subject: String,
    date: String,
    message_id: Option<String>,
    html: Option<String>,
    list_unsubscribe: Option<String>,
}

impl MessageBuilder {
    pub fn new(from: &str) -> Self {
        Self {
            from: from.to_string(),
            subject: "Hello".to_string(),
            date: "Mon, 06 Jan 2025 10:00:00 +0000".to_string(),
            message_id: None,
            html: None,
            list_unsubscribe: None,
        }
    }

    pub fn subject(mut self, subject: &str) -> Self {
        self.subject = subject.to_string();
        self
    }

    pub fn date(mut self, date: &str) -> Self {
        self.date = date.to_string();
        self
    }

    pub fn message_id(mut self, id: &str) -> Self {
        self.message_id = Some(id.to_string());
        self
    }

    pub fn html(mut self, html: &str) -> Self {
        self.html = Some(html.to_string());
        self
    }

    pub fn list_unsubscribe(mut self, value: &str) -> Self {
        self.list_unsubscribe = Some(value.to_string());
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let mut raw = String::new();
        raw.push_str(&format!("From: {}\r\n", self.from));
        raw.push_str("To: me@example.org\r\n");
        raw.push_str(&format!("Subject: {}\r\n", self.subject));
        raw.push_str(&format!("Date: {}\r\n", self.date));
        if let Some(id) = &self.message_id {
            raw.push_str(&format!("Message-ID: {}\r\n", id));
        }
        if let Some(value) = &self.list_unsubscribe {
            raw.push_str(&format!("List-Unsubscribe: {}\r\n", value));
        }
        raw.push_str("MIME-Version: 1.0\r\n");
        match &self.html {
            Some(html) => {
                raw.push_str("Content-Type: text/html; charset=utf-8\r\n\r\n");
                raw.push_str(html);
            }
            None => {
                raw.push_str("Content-Type: text/plain; charset=utf-8\r\n\r\n");
                raw.push_str("No links here.");
            }
        }
        raw.push_str("\r\n");
        raw.into_bytes()
    }
}

/// HTML body with one anchor per `(href, text)` pair.
pub fn html_with_links(links: &[(&str, &str)]) -> String {
    let anchors: String = links
        .iter()
        .map(|(href, text)| format!("<p><a href=\"{}\">{}</a></p>", href, text))
        .collect();
    format!("<html><body><p>Weekly news</p>{}</body></html>", anchors)
}
