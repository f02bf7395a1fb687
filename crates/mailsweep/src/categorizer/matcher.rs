use regex::Regex;
use serde::Serialize;

/// Where a sender stands against the whitelist and blacklist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ListStatus {
    Whitelisted,
    Blacklisted,
    Unlisted,
}

impl ListStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Whitelisted => "whitelisted",
            Self::Blacklisted => "blacklisted",
            Self::Unlisted => "unlisted",
        }
    }
}

/// A pattern with its wildcard and regex forms compiled once.
///
/// A pattern containing `*` is a wildcard over the whole sender, with every
/// other character literal. Any other pattern matches by substring
/// containment first, then as a regex search; an invalid regex never
/// matches.
#[derive(Debug, Clone)]
pub struct SenderPattern {
    raw: String,
    wildcard: Option<Regex>,
    regex: Option<Regex>,
}

impl SenderPattern {
    pub fn new(pattern: &str) -> Self {
        let wildcard = if pattern.contains('*') {
            let body = pattern
                .split('*')
                .map(regex::escape)
                .collect::<Vec<_>>()
                .join(".*");
            Regex::new(&format!("^(?s:{body})$")).ok()
        } else {
            None
        };

        let regex = match wildcard {
            Some(_) => None,
            None => Regex::new(pattern).ok(),
        };

        Self {
            raw: pattern.to_string(),
            wildcard,
            regex,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn matches(&self, sender: &str) -> bool {
        if let Some(wildcard) = &self.wildcard {
            return wildcard.is_match(sender);
        }
        if sender.contains(self.raw.as_str()) {
            return true;
        }
        self.regex.as_ref().is_some_and(|re| re.is_match(sender))
    }
}

/// Matches a sender against a single pattern.
pub fn match_pattern(sender: &str, pattern: &str) -> bool {
    SenderPattern::new(pattern).matches(sender)
}

/// Compiled whitelist and blacklist. Senders and patterns are compared
/// lower-cased.
#[derive(Debug, Clone, Default)]
pub struct SenderLists {
    whitelist: Vec<SenderPattern>,
    blacklist: Vec<SenderPattern>,
}

impl SenderLists {
    pub fn new<W, B>(whitelist: W, blacklist: B) -> Self
    where
        W: IntoIterator,
        W::Item: AsRef<str>,
        B: IntoIterator,
        B::Item: AsRef<str>,
    {
        let compile = |p: &str| SenderPattern::new(&p.to_lowercase());
        Self {
            whitelist: whitelist.into_iter().map(|p| compile(p.as_ref())).collect(),
            blacklist: blacklist.into_iter().map(|p| compile(p.as_ref())).collect(),
        }
    }

    /// Whitelist wins when a sender matches both lists.
    pub fn check(&self, sender: &str) -> ListStatus {
        let sender = sender.to_lowercase();
        if self.whitelist.iter().any(|p| p.matches(&sender)) {
            ListStatus::Whitelisted
        } else if self.blacklist.iter().any(|p| p.matches(&sender)) {
            ListStatus::Blacklisted
        } else {
            ListStatus::Unlisted
        }
    }

    pub fn is_empty(&self) -> bool {
        self.whitelist.is_empty() && self.blacklist.is_empty()
    }
}

pub fn check_lists<S: AsRef<str>>(sender: &str, whitelist: &[S], blacklist: &[S]) -> ListStatus {
    SenderLists::new(
        whitelist.iter().map(AsRef::<str>::as_ref),
        blacklist.iter().map(AsRef::<str>::as_ref),
    )
    .check(sender)
}
