//! Typed messages consumed by the sync controller.
//!
//! Any push transport, a poller, or a fixture file can feed these into the
//! controller's channel.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::bookmark::{Bookmark, User};

/// Row-level change pushed by the remote store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ChangeEvent {
    Insert { row: Bookmark },
    Update { row: Bookmark },
    Delete { id: String },
}

impl ChangeEvent {
    pub fn id(&self) -> &str {
        match self {
            ChangeEvent::Insert { row } | ChangeEvent::Update { row } => &row.id,
            ChangeEvent::Delete { id } => id,
        }
    }
}

/// Why a full refetch was requested
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RefetchTrigger {
    InitialLoad,
    Visible,
    Focus,
    Scheduled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Hidden,
    Visible,
}

/// Everything the controller reacts to, delivered one at a time
#[derive(Debug, Clone, PartialEq)]
pub enum ControllerInput {
    Change(ChangeEvent),
    Refetch(RefetchTrigger),
    /// Document visibility changed; becoming visible after hidden refetches
    Visibility(Visibility),
    /// Window regained input focus
    Focus,
    /// Signed in as a user, or signed out
    Identity(Option<User>),
    Visit(String),
    Shutdown,
}

/// Read change events from a JSON-lines file, skipping blank lines
pub fn load_change_events(path: &Path) -> Result<Vec<ChangeEvent>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read change events from {:?}", path))?;

    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(number, line)| {
            serde_json::from_str(line)
                .with_context(|| format!("Invalid change event on line {}", number + 1))
        })
        .collect()
}
