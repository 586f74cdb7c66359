use crate::bookmark::Bookmark;
use crate::classifier::{self, ALL_CATEGORIES};
use crate::preferences::Preferences;
use crate::ranking;

/// Transitions accepted by [`AppState::apply`]
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// A new ranked snapshot from the sync controller
    Snapshot(Vec<Bookmark>),
    SelectCategory(String),
    ToggleDarkMode,
}

/// Everything a front end renders, owned in one place
#[derive(Debug, Clone, PartialEq)]
pub struct AppState {
    bookmarks: Vec<Bookmark>,
    category: String,
    preferences: Preferences,
}

impl AppState {
    pub fn new(preferences: Preferences) -> Self {
        Self {
            bookmarks: Vec::new(),
            category: ALL_CATEGORIES.to_string(),
            preferences,
        }
    }

    pub fn apply(mut self, action: Action) -> Self {
        match action {
            Action::Snapshot(bookmarks) => {
                self.bookmarks = ranking::rank(&bookmarks);
                // A filter whose category vanished falls back to everything
                if !self.categories().contains(&self.category) {
                    self.category = ALL_CATEGORIES.to_string();
                }
            }
            Action::SelectCategory(category) => {
                if self.categories().contains(&category) {
                    self.category = category;
                }
            }
            Action::ToggleDarkMode => {
                self.preferences.toggle_dark_mode();
            }
        }
        self
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn categories(&self) -> Vec<String> {
        classifier::available_categories(&self.bookmarks)
    }

    pub fn preferences(&self) -> &Preferences {
        &self.preferences
    }

    /// Ranked bookmarks under the current filter
    pub fn visible(&self) -> Vec<Bookmark> {
        classifier::filter_by_category(&self.bookmarks, &self.category)
    }

    /// Recommendation over the whole collection, ignoring the filter
    pub fn recommendation(&self) -> Option<&Bookmark> {
        ranking::recommend(&self.bookmarks)
    }
}
