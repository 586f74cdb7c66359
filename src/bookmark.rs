use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A saved link as stored in the remote `bookmarks` relation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bookmark {
    pub id: String,
    #[serde(default)]
    pub user_id: String,
    pub title: String,
    pub url: String,
    pub created_at: DateTime<Utc>,
    /// Missing or null in older rows, both read as zero
    #[serde(default, deserialize_with = "null_as_zero")]
    pub visit_count: u64,
    #[serde(default)]
    pub last_visited_at: Option<DateTime<Utc>>,
}

impl Bookmark {
    /// Most recent activity: last visit, or creation when never visited
    pub fn recency(&self) -> DateTime<Utc> {
        self.last_visited_at.unwrap_or(self.created_at)
    }

    /// Apply one visit at `at`
    pub fn visit(&mut self, at: DateTime<Utc>) {
        self.visit_count += 1;
        self.last_visited_at = Some(at);
    }

    /// Partial update carrying the current visit fields, if ever visited
    pub fn visit_update(&self) -> Option<VisitUpdate> {
        self.last_visited_at.map(|at| VisitUpdate {
            visit_count: self.visit_count,
            last_visited_at: at,
        })
    }
}

fn null_as_zero<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<u64>::deserialize(deserializer)?.unwrap_or(0))
}

/// Provisional row submitted on add. The store assigns `id` and `created_at`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewBookmark {
    pub user_id: String,
    pub title: String,
    pub url: String,
}

/// Partial update sent after a visit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisitUpdate {
    pub visit_count: u64,
    pub last_visited_at: DateTime<Utc>,
}

/// Signed-in identity supplied by the identity provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
}
