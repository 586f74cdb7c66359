//! Display ordering and the "recommended next" pick.
//!
//! Order: visit count descending, then most recent activity descending
//! (last visit, or creation when never visited). Ties keep input order.

use std::cmp::Ordering;

use crate::bookmark::Bookmark;

/// Compare two bookmarks by display rank
pub fn compare(a: &Bookmark, b: &Bookmark) -> Ordering {
    b.visit_count
        .cmp(&a.visit_count)
        .then_with(|| b.recency().cmp(&a.recency()))
}

/// Rank in place. `sort_by` is stable, so equal keys keep their order.
pub fn sort(bookmarks: &mut [Bookmark]) {
    bookmarks.sort_by(compare);
}

/// Ranked copy of a collection
pub fn rank(bookmarks: &[Bookmark]) -> Vec<Bookmark> {
    let mut ranked = bookmarks.to_vec();
    sort(&mut ranked);
    ranked
}

/// Pick from the top two of an already ranked slice.
/// The second entry wins only with a strictly higher visit count.
pub fn recommend(ranked: &[Bookmark]) -> Option<&Bookmark> {
    match ranked {
        [] => None,
        [only] => Some(only),
        [first, second, ..] => {
            if second.visit_count > first.visit_count {
                Some(second)
            } else {
                Some(first)
            }
        }
    }
}
