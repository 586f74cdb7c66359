use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard};

use chrono::Utc;
use tracing::debug;
use uuid::Uuid;

use super::{FetchOrder, RemoteStore};
use crate::bookmark::{Bookmark, NewBookmark, VisitUpdate};
use crate::error::RemoteError;

/// Store operations that can be made to fail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Select,
    Insert,
    Update,
    Delete,
}

/// A request as seen by the store, in arrival order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    Select(FetchOrder),
    Insert(NewBookmark),
    Update(String, VisitUpdate),
    Delete(String),
}

#[derive(Default)]
struct Inner {
    rows: Vec<Bookmark>,
    missing_columns: HashSet<String>,
    failing: HashSet<Operation>,
    requests: Vec<Request>,
}

/// In-process store scoped to one user. Rows owned by other users are
/// invisible and cannot be written, like the hosted store's row policies.
pub struct MemoryStore {
    user_id: String,
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            inner: Mutex::new(Inner::default()),
        }
    }

    pub fn with_rows(user_id: impl Into<String>, rows: Vec<Bookmark>) -> Self {
        let store = Self::new(user_id);
        store.lock().rows = rows;
        store
    }

    /// Make requests ordering by `column` fail with a schema error
    pub fn drop_column(&self, column: &str) {
        self.lock().missing_columns.insert(column.to_string());
    }

    pub fn set_failing(&self, operation: Operation, failing: bool) {
        let mut inner = self.lock();
        if failing {
            inner.failing.insert(operation);
        } else {
            inner.failing.remove(&operation);
        }
    }

    /// Rows visible to this store's user
    pub fn rows(&self) -> Vec<Bookmark> {
        let inner = self.lock();
        inner
            .rows
            .iter()
            .filter(|row| row.user_id == self.user_id)
            .cloned()
            .collect()
    }

    pub fn requests(&self) -> Vec<Request> {
        self.lock().requests.clone()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn begin(&self, request: Request, operation: Operation) -> Result<MutexGuard<'_, Inner>, RemoteError> {
        let mut inner = self.lock();
        inner.requests.push(request);
        if inner.failing.contains(&operation) {
            return Err(RemoteError::RequestFailed(format!("{:?} rejected by store", operation)));
        }
        Ok(inner)
    }
}

impl RemoteStore for MemoryStore {
    async fn select_all(&self, order: FetchOrder) -> Result<Vec<Bookmark>, RemoteError> {
        let inner = self.begin(Request::Select(order), Operation::Select)?;

        if let Some(column) = order
            .columns()
            .iter()
            .find(|column| inner.missing_columns.contains(**column))
        {
            return Err(RemoteError::SchemaUnavailable(format!(
                "column bookmarks.{} does not exist",
                column
            )));
        }

        let mut rows: Vec<Bookmark> = inner
            .rows
            .iter()
            .filter(|row| row.user_id == self.user_id)
            .cloned()
            .collect();
        match order {
            FetchOrder::Ranked => rows.sort_by(|a, b| {
                b.visit_count
                    .cmp(&a.visit_count)
                    .then_with(|| b.created_at.cmp(&a.created_at))
            }),
            FetchOrder::Newest => rows.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
        }

        debug!("Memory store returned {} rows", rows.len());
        Ok(rows)
    }

    async fn insert(&self, bookmark: NewBookmark) -> Result<Bookmark, RemoteError> {
        let mut inner = self.begin(Request::Insert(bookmark.clone()), Operation::Insert)?;

        if bookmark.user_id != self.user_id {
            return Err(RemoteError::RequestFailed(
                "new row violates row-level security policy".to_string(),
            ));
        }

        let row = Bookmark {
            id: Uuid::new_v4().to_string(),
            user_id: bookmark.user_id,
            title: bookmark.title,
            url: bookmark.url,
            created_at: Utc::now(),
            visit_count: 0,
            last_visited_at: None,
        };
        inner.rows.push(row.clone());
        Ok(row)
    }

    async fn update(&self, id: &str, fields: VisitUpdate) -> Result<(), RemoteError> {
        let mut inner = self.begin(Request::Update(id.to_string(), fields.clone()), Operation::Update)?;

        if let Some(row) = inner
            .rows
            .iter_mut()
            .find(|row| row.id == id && row.user_id == self.user_id)
        {
            row.visit_count = fields.visit_count;
            row.last_visited_at = Some(fields.last_visited_at);
        }
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<(), RemoteError> {
        let mut inner = self.begin(Request::Delete(id.to_string()), Operation::Delete)?;
        let user_id = self.user_id.clone();
        inner.rows.retain(|row| !(row.id == id && row.user_id == user_id));
        Ok(())
    }
}
