//! Sender classification and whitelist/blacklist matching.

pub mod category;
pub mod matcher;

pub use category::{classify, Categorizer, Category, KeywordRule, RuleField};
pub use matcher::{check_lists, match_pattern, ListStatus, SenderLists, SenderPattern};
