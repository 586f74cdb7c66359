//! URL category classification for client-side filtering.
//!
//! Plain substring matching, case-sensitive. Rule sets are checked in a
//! fixed order and the first match wins.

use serde::{Deserialize, Serialize};

use crate::bookmark::Bookmark;

/// Filter label that keeps every bookmark
pub const ALL_CATEGORIES: &str = "All";

/// Code hosting, Q&A and API hosts
const DEV_TOOLS_PATTERNS: &[&str] = &[
    "github.com", "gitlab.com", "bitbucket.org",
    "stackoverflow.com", "stackexchange.com",
    "api.", "developer.", "docs.rs", "crates.io", "npmjs.com",
];

/// Search, documents and collaboration hosts
const PRODUCTIVITY_PATTERNS: &[&str] = &[
    "google.com", "notion.so", "docs.", "drive.",
    "slack.com", "trello.com", "figma.com", "atlassian.net", "dropbox.com",
];

/// Video, music and social hosts
const ENTERTAINMENT_PATTERNS: &[&str] = &[
    "youtube.com", "netflix.com", "twitch.tv", "spotify.com",
    "reddit.com", "twitter.com", "instagram.com", "facebook.com", "tiktok.com",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    DevTools,
    Productivity,
    Entertainment,
    General,
}

impl Category {
    /// Every category in precedence order
    pub const ALL: [Category; 4] = [
        Category::DevTools,
        Category::Productivity,
        Category::Entertainment,
        Category::General,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Category::DevTools => "Dev Tools",
            Category::Productivity => "Productivity",
            Category::Entertainment => "Entertainment",
            Category::General => "General",
        }
    }

    fn patterns(&self) -> &'static [&'static str] {
        match self {
            Category::DevTools => DEV_TOOLS_PATTERNS,
            Category::Productivity => PRODUCTIVITY_PATTERNS,
            Category::Entertainment => ENTERTAINMENT_PATTERNS,
            Category::General => &[],
        }
    }
}

/// Classify a URL. Total: anything unmatched is `General`.
pub fn classify(url: &str) -> Category {
    Category::ALL
        .into_iter()
        .find(|category| category.patterns().iter().any(|p| url.contains(p)))
        .unwrap_or(Category::General)
}

/// Filter list: "All" followed by the labels present, in precedence order
pub fn available_categories(bookmarks: &[Bookmark]) -> Vec<String> {
    let present: Vec<Category> = bookmarks.iter().map(|b| classify(&b.url)).collect();

    std::iter::once(ALL_CATEGORIES.to_string())
        .chain(
            Category::ALL
                .into_iter()
                .filter(|category| present.contains(category))
                .map(|category| category.label().to_string()),
        )
        .collect()
}

/// Keep the bookmarks whose label equals `filter`; "All" keeps everything
pub fn filter_by_category(bookmarks: &[Bookmark], filter: &str) -> Vec<Bookmark> {
    if filter == ALL_CATEGORIES {
        return bookmarks.to_vec();
    }
    bookmarks
        .iter()
        .filter(|b| classify(&b.url).label() == filter)
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn bookmark(url: &str) -> Bookmark {
        Bookmark {
            id: url.to_string(),
            user_id: "u1".to_string(),
            title: url.to_string(),
            url: url.to_string(),
            created_at: Utc::now(),
            visit_count: 0,
            last_visited_at: None,
        }
    }

    #[test]
    fn test_classify_each_label() {
        assert_eq!(classify("https://github.com/rust-lang/rust"), Category::DevTools);
        assert_eq!(classify("https://api.example.com/v1"), Category::DevTools);
        assert_eq!(classify("https://www.notion.so/workspace"), Category::Productivity);
        assert_eq!(classify("https://www.youtube.com/watch?v=1"), Category::Entertainment);
        assert_eq!(classify("https://blog.example.org"), Category::General);
    }

    #[test]
    fn test_dev_tools_takes_precedence() {
        // matches "docs." (productivity) and "docs.rs" (dev tools)
        assert_eq!(classify("https://docs.rs/tokio"), Category::DevTools);
        // matches "developer." (dev tools) and "google.com" (productivity)
        assert_eq!(classify("https://developer.google.com"), Category::DevTools);
    }

    #[test]
    fn test_matching_is_case_sensitive() {
        assert_eq!(classify("https://GITHUB.COM/x"), Category::General);
    }

    #[test]
    fn test_available_categories_only_present_labels() {
        let bookmarks = vec![
            bookmark("https://www.youtube.com/a"),
            bookmark("https://github.com/b"),
        ];
        assert_eq!(
            available_categories(&bookmarks),
            vec!["All", "Dev Tools", "Entertainment"]
        );
        assert_eq!(available_categories(&[]), vec!["All"]);
    }

    #[test]
    fn test_filter_by_category() {
        let bookmarks = vec![
            bookmark("https://www.youtube.com/a"),
            bookmark("https://github.com/b"),
            bookmark("https://example.org/c"),
        ];
        assert_eq!(filter_by_category(&bookmarks, ALL_CATEGORIES).len(), 3);

        let dev = filter_by_category(&bookmarks, "Dev Tools");
        assert_eq!(dev.len(), 1);
        assert_eq!(dev[0].url, "https://github.com/b");

        assert!(filter_by_category(&bookmarks, "Productivity").is_empty());
    }
}

#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn prop_classify_is_total_and_deterministic(url in ".{0,80}") {
            let first = classify(&url);
            prop_assert!(Category::ALL.contains(&first));
            prop_assert_eq!(first, classify(&url));
        }

        #[test]
        fn prop_dev_pattern_always_wins(prefix in "[a-z]{0,10}", suffix in "[a-z/]{0,10}") {
            let url = format!("https://{}github.com/{}youtube.com", prefix, suffix);
            prop_assert_eq!(classify(&url), Category::DevTools);
        }
    }
}
