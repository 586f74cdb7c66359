//! Sync controller: owns the local bookmark collection and keeps it
//! eventually consistent with the remote store.
//!
//! Three kinds of mutation reach the collection:
//! 1. local writes (add, delete) that go through the store first
//! 2. visits, applied optimistically and sent to the store in the background,
//!    one at a time and in the order they were recorded
//! 3. change notifications pushed by the store
//!
//! A full refetch replaces the collection on initial load, when the page
//! becomes visible again, on focus, and on scheduled ticks.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, error, info, warn};

use crate::bookmark::{Bookmark, NewBookmark, User, VisitUpdate};
use crate::classifier;
use crate::error::{RemoteError, SyncError};
use crate::events::{ChangeEvent, ControllerInput, RefetchTrigger, Visibility};
use crate::ranking;
use crate::remote::{FetchOrder, RemoteStore};
use crate::title::derive_title;

/// Result of a spawned refetch, delivered back to the run loop
struct FetchOutcome {
    epoch: u64,
    trigger: RefetchTrigger,
    rows: Option<Vec<Bookmark>>,
}

/// One visit count waiting to be written
struct VisitWrite {
    id: String,
    update: VisitUpdate,
    done: oneshot::Sender<()>,
}

/// Resolves once the store write for a recorded visit has finished,
/// whether or not it succeeded
pub type VisitReceipt = oneshot::Receiver<()>;

pub struct SyncController<S: RemoteStore> {
    store: Arc<S>,
    user: Option<User>,
    bookmarks: Vec<Bookmark>,
    hidden: bool,
    /// Bumped on every identity change so fetches for a previous session are dropped
    epoch: u64,
    snapshots: watch::Sender<Vec<Bookmark>>,
    /// Feeds the single writer task, started on the first visit
    visit_writes: Option<mpsc::UnboundedSender<VisitWrite>>,
}

impl<S: RemoteStore> SyncController<S> {
    pub fn new(store: Arc<S>) -> Self {
        let (snapshots, _) = watch::channel(Vec::new());
        Self {
            store,
            user: None,
            bookmarks: Vec::new(),
            hidden: false,
            epoch: 0,
            snapshots,
            visit_writes: None,
        }
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    /// Canonical collection; carries no meaningful order
    pub fn bookmarks(&self) -> &[Bookmark] {
        &self.bookmarks
    }

    pub fn ranked(&self) -> Vec<Bookmark> {
        ranking::rank(&self.bookmarks)
    }

    pub fn recommendation(&self) -> Option<Bookmark> {
        ranking::recommend(&self.ranked()).cloned()
    }

    pub fn categories(&self) -> Vec<String> {
        classifier::available_categories(&self.bookmarks)
    }

    /// Ranked snapshots, published after every change to the collection
    pub fn subscribe(&self) -> watch::Receiver<Vec<Bookmark>> {
        self.snapshots.subscribe()
    }

    fn publish(&self) {
        self.snapshots.send_replace(self.ranked());
    }

    /// Switch identity. Signing out or switching user clears local state.
    /// Returns true when a user is now signed in whose data must be loaded.
    pub fn set_identity(&mut self, user: Option<User>) -> bool {
        if self.user == user {
            return false;
        }

        self.epoch += 1;
        self.bookmarks.clear();
        self.publish();

        match &user {
            Some(u) => info!("👤 Signed in as {}", u.email),
            None => info!("👋 Signed out, local bookmarks cleared"),
        }

        self.user = user;
        self.user.is_some()
    }

    /// Track visibility. Returns true when the page became visible after being hidden.
    pub fn set_visibility(&mut self, visibility: Visibility) -> bool {
        match visibility {
            Visibility::Hidden => {
                self.hidden = true;
                false
            }
            Visibility::Visible => std::mem::replace(&mut self.hidden, false),
        }
    }

    /// Submit a new bookmark and keep the row echoed back by the store.
    /// Local state is untouched on failure.
    pub async fn add(&mut self, title: &str, url: &str) -> Result<Bookmark, SyncError> {
        let user_id = self.user.as_ref().ok_or(SyncError::NotSignedIn)?.id.clone();

        let new = NewBookmark {
            user_id,
            title: derive_title(title, url),
            url: url.to_string(),
        };

        let row = self.store.insert(new).await.map_err(|e| {
            error!("❌ Failed to add bookmark {}: {}", url, e);
            SyncError::from(e)
        })?;

        if self.contains(&row.id) {
            debug!("Bookmark {} already delivered by change stream", row.id);
        } else {
            self.bookmarks.insert(0, row.clone());
            self.publish();
        }

        info!("✅ Added bookmark: {}", row.title);
        Ok(row)
    }

    /// Delete remotely, then locally. Local state is untouched on failure.
    pub async fn delete(&mut self, id: &str) -> Result<(), SyncError> {
        if self.user.is_none() {
            return Err(SyncError::NotSignedIn);
        }

        self.store.delete(id).await.map_err(|e| {
            error!("❌ Failed to delete bookmark {}: {}", id, e);
            SyncError::from(e)
        })?;

        if self.remove(id) {
            self.publish();
        }
        info!("🗑️  Deleted bookmark {}", id);
        Ok(())
    }

    /// Count a visit now and queue the new count for the store.
    /// A failed write is logged and the local count is kept.
    pub fn record_visit(&mut self, id: &str) -> Option<VisitReceipt> {
        if self.user.is_none() {
            return None;
        }

        let bookmark = match self.bookmarks.iter_mut().find(|b| b.id == id) {
            Some(bookmark) => bookmark,
            None => {
                debug!("Visit for unknown bookmark {} ignored", id);
                return None;
            }
        };

        bookmark.visit(Utc::now());
        let update = bookmark.visit_update()?;
        let id = bookmark.id.clone();

        ranking::sort(&mut self.bookmarks);
        self.publish();

        let (done, receipt) = oneshot::channel();
        let write = VisitWrite { id, update, done };
        if let Err(mpsc::error::SendError(write)) = self.visit_writer().send(write) {
            // writer gone; start a fresh one and retry once
            self.visit_writes = None;
            let _ = self.visit_writer().send(write);
        }
        Some(receipt)
    }

    fn visit_writer(&mut self) -> &mpsc::UnboundedSender<VisitWrite> {
        let store = &self.store;
        self.visit_writes.get_or_insert_with(|| {
            let (tx, rx) = mpsc::unbounded_channel();
            tokio::spawn(write_visits(Arc::clone(store), rx));
            tx
        })
    }

    /// Visit the current recommendation
    pub fn visit_recommended(&mut self) -> Option<(Bookmark, VisitReceipt)> {
        let pick = self.recommendation()?;
        let receipt = self.record_visit(&pick.id)?;
        let visited = self.bookmarks.iter().find(|b| b.id == pick.id)?.clone();
        Some((visited, receipt))
    }

    /// Apply one pushed change. Returns whether the collection changed.
    pub fn apply_change(&mut self, event: ChangeEvent) -> bool {
        if self.user.is_none() {
            debug!("Change for {} ignored while signed out", event.id());
            return false;
        }

        let changed = match event {
            ChangeEvent::Insert { row } => {
                if self.contains(&row.id) {
                    debug!("Insert for known bookmark {} ignored", row.id);
                    false
                } else {
                    self.bookmarks.insert(0, row);
                    true
                }
            }
            ChangeEvent::Update { row } => {
                match self.bookmarks.iter_mut().find(|b| b.id == row.id) {
                    Some(existing) => {
                        *existing = row;
                        ranking::sort(&mut self.bookmarks);
                        true
                    }
                    None => {
                        debug!("Update for unknown bookmark {} ignored", row.id);
                        false
                    }
                }
            }
            ChangeEvent::Delete { id } => {
                let removed = self.remove(&id);
                if !removed {
                    debug!("Delete for unknown bookmark {} ignored", id);
                }
                removed
            }
        };

        if changed {
            self.publish();
        }
        changed
    }

    /// Reload everything from the store. Returns whether local state was replaced.
    pub async fn refetch(&mut self, trigger: RefetchTrigger) -> bool {
        if self.user.is_none() {
            return false;
        }

        let epoch = self.epoch;
        let rows = fetch_with_fallback(self.store.as_ref(), trigger).await;
        self.finish_fetch(FetchOutcome { epoch, trigger, rows })
    }

    /// Consume inputs one at a time until shutdown or until every sender is gone.
    /// Refetches run in the background and are applied when they complete.
    pub async fn run(mut self, mut inputs: mpsc::Receiver<ControllerInput>) -> Self {
        let (done_tx, mut done_rx) = mpsc::unbounded_channel::<FetchOutcome>();
        info!("▶️  Sync controller started");

        loop {
            tokio::select! {
                input = inputs.recv() => match input {
                    None | Some(ControllerInput::Shutdown) => break,
                    Some(input) => self.dispatch(input, &done_tx),
                },
                Some(outcome) = done_rx.recv() => {
                    self.finish_fetch(outcome);
                }
            }
        }

        info!("⏹️  Sync controller stopped with {} bookmarks", self.bookmarks.len());
        self
    }

    fn dispatch(&mut self, input: ControllerInput, done: &mpsc::UnboundedSender<FetchOutcome>) {
        match input {
            ControllerInput::Change(event) => {
                self.apply_change(event);
            }
            ControllerInput::Refetch(trigger) => self.spawn_fetch(trigger, done),
            ControllerInput::Visibility(visibility) => {
                if self.set_visibility(visibility) {
                    self.spawn_fetch(RefetchTrigger::Visible, done);
                }
            }
            ControllerInput::Focus => self.spawn_fetch(RefetchTrigger::Focus, done),
            ControllerInput::Identity(user) => {
                if self.set_identity(user) {
                    self.spawn_fetch(RefetchTrigger::InitialLoad, done);
                }
            }
            ControllerInput::Visit(id) => {
                self.record_visit(&id);
            }
            ControllerInput::Shutdown => {}
        }
    }

    fn spawn_fetch(&self, trigger: RefetchTrigger, done: &mpsc::UnboundedSender<FetchOutcome>) {
        if self.user.is_none() {
            debug!("Refetch ({:?}) skipped while signed out", trigger);
            return;
        }

        let store = Arc::clone(&self.store);
        let done = done.clone();
        let epoch = self.epoch;
        tokio::spawn(async move {
            let rows = fetch_with_fallback(store.as_ref(), trigger).await;
            // The receiver is gone after shutdown; the result is dropped
            let _ = done.send(FetchOutcome { epoch, trigger, rows });
        });
    }

    fn finish_fetch(&mut self, outcome: FetchOutcome) -> bool {
        if outcome.epoch != self.epoch {
            debug!("Dropping {:?} fetch from a previous session", outcome.trigger);
            return false;
        }

        match outcome.rows {
            Some(rows) => {
                self.replace_all(rows);
                info!("🔄 Refetch ({:?}) loaded {} bookmarks", outcome.trigger, self.bookmarks.len());
                true
            }
            None => false,
        }
    }

    fn replace_all(&mut self, rows: Vec<Bookmark>) {
        let mut seen = HashSet::new();
        self.bookmarks = rows
            .into_iter()
            .filter(|row| seen.insert(row.id.clone()))
            .collect();
        self.publish();
    }

    fn contains(&self, id: &str) -> bool {
        self.bookmarks.iter().any(|b| b.id == id)
    }

    fn remove(&mut self, id: &str) -> bool {
        let before = self.bookmarks.len();
        self.bookmarks.retain(|b| b.id != id);
        self.bookmarks.len() != before
    }
}

/// Write visit counts one at a time, in the order they were recorded.
/// A count lower than one already stored for the same bookmark is skipped.
async fn write_visits<S: RemoteStore>(store: Arc<S>, mut writes: mpsc::UnboundedReceiver<VisitWrite>) {
    let mut stored: HashMap<String, u64> = HashMap::new();

    while let Some(VisitWrite { id, update, done }) = writes.recv().await {
        if stored.get(&id).is_some_and(|&count| update.visit_count < count) {
            debug!("Skipping stale visit count {} for {}", update.visit_count, id);
        } else {
            let count = update.visit_count;
            match store.update(&id, update).await {
                Ok(()) => {
                    debug!("Visit for {} stored", id);
                    stored.insert(id, count);
                }
                Err(e) => warn!("⚠️  Visit count for {} not stored, keeping local value: {}", id, e),
            }
        }
        // the caller may have stopped waiting
        let _ = done.send(());
    }
}

/// Ranked fetch, falling back to newest-first when the store reports the
/// ranking column unavailable. `None` means local state should be kept.
async fn fetch_with_fallback<S: RemoteStore>(store: &S, trigger: RefetchTrigger) -> Option<Vec<Bookmark>> {
    debug!("Refetch triggered by {:?}", trigger);

    match store.select_all(FetchOrder::Ranked).await {
        Ok(rows) => Some(rows),
        Err(RemoteError::SchemaUnavailable(detail)) => {
            warn!("⚠️  Ranked fetch unavailable ({}), falling back to newest first", detail);
            match store.select_all(FetchOrder::Newest).await {
                Ok(rows) => Some(rows),
                Err(e) => {
                    error!("❌ Fallback fetch failed, keeping local bookmarks: {}", e);
                    None
                }
            }
        }
        Err(e) => {
            error!("❌ Fetch failed, keeping local bookmarks: {}", e);
            None
        }
    }
}
