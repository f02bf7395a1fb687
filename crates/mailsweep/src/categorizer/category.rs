use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Newsletter,
    Promotion,
    Marketing,
    Notification,
    Social,
    Uncategorized,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::Newsletter,
        Category::Promotion,
        Category::Marketing,
        Category::Notification,
        Category::Social,
        Category::Uncategorized,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Newsletter => "newsletter",
            Self::Promotion => "promotion",
            Self::Marketing => "marketing",
            Self::Notification => "notification",
            Self::Social => "social",
            Self::Uncategorized => "uncategorized",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownCategory(pub String);

impl fmt::Display for UnknownCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown category: {}", self.0)
    }
}

impl std::error::Error for UnknownCategory {}

impl FromStr for Category {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| UnknownCategory(s.to_string()))
    }
}

/// Which part of the message a rule inspects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleField {
    Sender,
    Subject,
    SenderOrSubject,
}

/// A keyword rule: matches when any keyword is a substring of the field.
#[derive(Debug, Clone)]
pub struct KeywordRule {
    pub field: RuleField,
    pub keywords: Vec<&'static str>,
    pub category: Category,
}

impl KeywordRule {
    fn new(field: RuleField, keywords: &[&'static str], category: Category) -> Self {
        Self {
            field,
            keywords: keywords.to_vec(),
            category,
        }
    }

    /// Both inputs must already be lower-cased.
    fn matches(&self, sender: &str, subject: &str) -> bool {
        let hit = |text: &str| self.keywords.iter().any(|k| text.contains(k));
        match self.field {
            RuleField::Sender => hit(sender),
            RuleField::Subject => hit(subject),
            RuleField::SenderOrSubject => hit(sender) || hit(subject),
        }
    }
}

/// Ordered keyword classifier. Rules are evaluated in sequence and the
/// first match decides the category.
pub struct Categorizer {
    rules: Vec<KeywordRule>,
}

impl Default for Categorizer {
    fn default() -> Self {
        Self::new(vec![
            KeywordRule::new(
                RuleField::Sender,
                &["facebook", "twitter", "linkedin", "instagram", "social"],
                Category::Social,
            ),
            KeywordRule::new(
                RuleField::SenderOrSubject,
                &["newsletter", "digest", "weekly", "monthly", "bulletin"],
                Category::Newsletter,
            ),
            KeywordRule::new(
                RuleField::Subject,
                &["offer", "deal", "sale", "discount", "promo", "save", "shop"],
                Category::Promotion,
            ),
            KeywordRule::new(
                RuleField::SenderOrSubject,
                &["marketing", "advertisement", "campaign"],
                Category::Marketing,
            ),
            KeywordRule::new(
                RuleField::Subject,
                &["notification", "alert", "reminder", "update"],
                Category::Notification,
            ),
        ])
    }
}

impl Categorizer {
    pub fn new(rules: Vec<KeywordRule>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &[KeywordRule] {
        &self.rules
    }

    pub fn categorize(&self, sender: &str, subject: &str) -> Category {
        let sender = sender.to_lowercase();
        let subject = subject.to_lowercase();

        self.rules
            .iter()
            .find(|rule| rule.matches(&sender, &subject))
            .map(|rule| rule.category)
            .unwrap_or(Category::Uncategorized)
    }
}

static DEFAULT_CATEGORIZER: LazyLock<Categorizer> = LazyLock::new(Categorizer::default);

/// Classifies with the built-in rule set.
pub fn classify(sender: &str, subject: &str) -> Category {
    DEFAULT_CATEGORIZER.categorize(sender, subject)
}
