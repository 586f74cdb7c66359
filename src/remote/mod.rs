//! Remote store seam.
//!
//! The hosted backend owns persistence and row ownership. The controller only
//! sees these four operations over the per-user `bookmarks` relation.

mod memory;
mod rest;

use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::bookmark::{Bookmark, NewBookmark, VisitUpdate};
use crate::error::RemoteError;

pub use memory::{MemoryStore, Operation, Request};
pub use rest::RestStore;

/// Ordering requested from the store on a full fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FetchOrder {
    /// `visit_count` desc, then `created_at` desc
    Ranked,
    /// `created_at` desc only, used when the ranking column is unavailable
    Newest,
}

impl FetchOrder {
    /// Order clause in the store's query syntax
    pub fn clause(&self) -> &'static str {
        match self {
            FetchOrder::Ranked => "visit_count.desc,created_at.desc",
            FetchOrder::Newest => "created_at.desc",
        }
    }

    /// Columns the ordering depends on
    pub fn columns(&self) -> &'static [&'static str] {
        match self {
            FetchOrder::Ranked => &["visit_count", "created_at"],
            FetchOrder::Newest => &["created_at"],
        }
    }
}

pub trait RemoteStore: Send + Sync + 'static {
    fn select_all(
        &self,
        order: FetchOrder,
    ) -> impl Future<Output = Result<Vec<Bookmark>, RemoteError>> + Send;

    /// Returns the stored row, with server-assigned `id` and `created_at`
    fn insert(
        &self,
        bookmark: NewBookmark,
    ) -> impl Future<Output = Result<Bookmark, RemoteError>> + Send;

    fn update(
        &self,
        id: &str,
        fields: VisitUpdate,
    ) -> impl Future<Output = Result<(), RemoteError>> + Send;

    fn delete(&self, id: &str) -> impl Future<Output = Result<(), RemoteError>> + Send;
}
