use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::tags;

/// Category assigned to snippets that have none. Always listed last.
pub const UNCATEGORIZED: &str = "Uncategorized";

/// Syntax used when a snippet is created without one.
pub const PLAIN_TEXT: &str = "Plain Text";

/// A named unit of code. The name is the snippet's identity across the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snippet {
    pub name: String,
    pub category: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub comment: String,
    pub syntax: String,
    #[serde(default)]
    pub locked: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Snippet {
    pub fn new(name: impl Into<String>, category: impl Into<String>) -> Self {
        let now = Utc::now();
        let category: String = category.into();

        Self {
            name: name.into(),
            category: normalize_category(&category),
            tags: Vec::new(),
            code: String::new(),
            comment: String::new(),
            syntax: String::from(PLAIN_TEXT),
            locked: false,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = code.into();
        self
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = comment.into();
        self
    }

    pub fn with_syntax(mut self, syntax: impl Into<String>) -> Self {
        self.syntax = syntax.into();
        self
    }

    /// Replaces the tag list, dropping `#` prefixes, blanks and repeats
    pub fn with_tags<I, T>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.tags = tags::normalize_tags(tags);
        self
    }

    pub fn set_category(&mut self, category: &str) {
        self.category = normalize_category(category);
        self.touch();
    }

    pub fn set_syntax(&mut self, syntax: &str) {
        self.syntax = syntax.to_string();
        self.touch();
    }

    pub fn set_locked(&mut self, locked: bool) {
        self.locked = locked;
        self.touch();
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// Tags joined with ", " for display
    pub fn tags_as_string(&self) -> String {
        self.tags.join(", ")
    }

    pub fn get_line_count(&self) -> usize {
        self.code.lines().count()
    }
}

/// Maps an empty or blank category to [`UNCATEGORIZED`]
pub fn normalize_category(category: &str) -> String {
    let trimmed = category.trim();
    if trimmed.is_empty() {
        String::from(UNCATEGORIZED)
    } else {
        trimmed.to_string()
    }
}

/// Sorts categories alphabetically and moves [`UNCATEGORIZED`] to the end
pub fn sort_categories(categories: &mut Vec<String>) {
    categories.sort();
    categories.dedup();
    if let Some(pos) = categories.iter().position(|c| c == UNCATEGORIZED) {
        let uncategorized = categories.remove(pos);
        categories.push(uncategorized);
    }
}
