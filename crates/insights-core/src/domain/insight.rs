use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Fixed set of insight categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Macro,
    Equities,
    FixedIncome,
    Alternatives,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Macro,
        Category::Equities,
        Category::FixedIncome,
        Category::Alternatives,
    ];

    /// Stored and wire value.
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Macro => "Macro",
            Category::Equities => "Equities",
            Category::FixedIncome => "FixedIncome",
            Category::Alternatives => "Alternatives",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string names no category.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("\"{0}\" is not a valid choice.")]
pub struct UnknownCategory(pub String);

impl FromStr for Category {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| UnknownCategory(s.to_string()))
    }
}

/// Author reference carried by an insight.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Creator {
    pub id: Uuid,
    pub username: String,
}

/// Insight entity - a short user-authored article.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Insight {
    pub id: Uuid,
    pub title: String,
    pub category: Category,
    pub body: String,
    /// Tag names, sorted and unique.
    pub tags: Vec<String>,
    pub creator: Creator,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Insight {
    pub fn is_owned_by(&self, user_id: Uuid) -> bool {
        self.creator.id == user_id
    }
}

/// Candidate insight payload for create and full update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsightInput {
    pub title: String,
    pub category: Category,
    pub body: String,
    pub tags: Vec<String>,
}

/// Partial update; absent fields keep their current value.
#[derive(Debug, Clone, Default)]
pub struct InsightPatch {
    pub title: Option<String>,
    pub category: Option<Category>,
    pub body: Option<String>,
    pub tags: Option<Vec<String>>,
}

impl InsightPatch {
    /// Overlay the supplied fields on `current`.
    pub fn merge_over(self, current: &Insight) -> InsightInput {
        InsightInput {
            title: self.title.unwrap_or_else(|| current.title.clone()),
            category: self.category.unwrap_or(current.category),
            body: self.body.unwrap_or_else(|| current.body.clone()),
            tags: self.tags.unwrap_or_else(|| current.tags.clone()),
        }
    }
}

/// Optional listing filters, combined with AND.
///
/// Empty strings are treated as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InsightFilter {
    /// Case-insensitive substring of the title.
    pub search: Option<String>,
    /// Exact category value.
    pub category: Option<String>,
    /// Case-insensitive substring of any attached tag name.
    pub tag: Option<String>,
}

impl InsightFilter {
    pub fn new(search: Option<String>, category: Option<String>, tag: Option<String>) -> Self {
        fn present(value: Option<String>) -> Option<String> {
            value.filter(|v| !v.is_empty())
        }

        Self {
            search: present(search),
            category: present(category),
            tag: present(tag),
        }
    }

    /// Evaluate the filter against one insight.
    pub fn matches(&self, insight: &Insight) -> bool {
        if let Some(search) = &self.search {
            if !contains_ignore_case(&insight.title, search) {
                return false;
            }
        }
        if let Some(category) = &self.category {
            if insight.category.as_str() != category {
                return false;
            }
        }
        if let Some(tag) = &self.tag {
            if !insight.tags.iter().any(|t| contains_ignore_case(t, tag)) {
                return false;
            }
        }
        true
    }
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}
