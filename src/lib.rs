//! Bookmark ranking and live sync against a hosted backend.
//!
//! The remote store owns persistence and row ownership; this crate keeps a
//! local collection consistent with it and derives display order, a
//! recommended next bookmark, and category filters from that collection.

pub mod bookmark;
pub mod classifier;
pub mod config;
pub mod error;
pub mod events;
pub mod preferences;
pub mod ranking;
pub mod remote;
pub mod scheduler;
pub mod state;
pub mod sync;
pub mod title;

pub use bookmark::{Bookmark, NewBookmark, User, VisitUpdate};
pub use classifier::{classify, Category};
pub use error::{RemoteError, SyncError};
pub use events::{ChangeEvent, ControllerInput, RefetchTrigger, Visibility};
pub use remote::{FetchOrder, MemoryStore, RemoteStore, RestStore};
pub use sync::SyncController;
