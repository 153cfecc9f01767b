//! Per-viewer read/unread tracking for feedback.
//!
//! Read marks live in a local key-value store and never reach the server.
//! Each post gets one entry, `feedback-read:<post id>`, holding a JSON array
//! of the feedback ids the viewer has seen.

use std::collections::{BTreeSet, HashMap};

use tracing::warn;

use crate::entities::Post;

const KEY_PREFIX: &str = "feedback-read:";

/// String get/set by key, the capability a browser's local storage offers.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: String);
}

#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) {
        self.entries.insert(key.to_string(), value);
    }
}

fn key_for(post_id: &str) -> String {
    format!("{KEY_PREFIX}{post_id}")
}

#[derive(Debug, Default)]
pub struct ReadTracker<S> {
    store: S,
}

impl<S: KeyValueStore> ReadTracker<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn into_inner(self) -> S {
        self.store
    }

    fn read_ids(&self, post_id: &str) -> BTreeSet<String> {
        let Some(raw) = self.store.get(&key_for(post_id)) else {
            return BTreeSet::new();
        };
        serde_json::from_str(&raw).unwrap_or_else(|e| {
            warn!(post = post_id, error = %e, "discarding unreadable read-state entry");
            BTreeSet::new()
        })
    }

    fn write_ids(&mut self, post_id: &str, ids: &BTreeSet<String>) {
        // a set of strings always encodes
        let raw = serde_json::to_string(ids).unwrap_or_else(|_| "[]".to_string());
        self.store.set(&key_for(post_id), raw);
    }

    pub fn is_read(&self, post_id: &str, feedback_id: &str) -> bool {
        self.read_ids(post_id).contains(feedback_id)
    }

    pub fn unread_count(&self, post: &Post) -> usize {
        let read = self.read_ids(&post.id);
        post.feedback
            .iter()
            .filter(|entry| !read.contains(&entry.id))
            .count()
    }

    pub fn mark_read(&mut self, post_id: &str, feedback_id: &str) {
        let mut ids = self.read_ids(post_id);
        if ids.insert(feedback_id.to_string()) {
            self.write_ids(post_id, &ids);
        }
    }

    /// Marks every current feedback entry as read, e.g. when the feedback
    /// modal opens. Ids of entries no longer on the post are dropped, which
    /// keeps the entry from growing across revisions.
    pub fn mark_all_read(&mut self, post: &Post) {
        let ids: BTreeSet<String> = post.feedback.iter().map(|entry| entry.id.clone()).collect();
        self.write_ids(&post.id, &ids);
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::entities::{Feedback, PostType, Section, Status};

    fn post_with_feedback(ids: &[&str]) -> Post {
        Post {
            id: "p1".into(),
            author: "Alice".into(),
            content: None,
            section: Section::HomemadeDelights,
            custom_date: None,
            link: None,
            status: Status::StudentFeedback,
            post_type: PostType::Fun,
            revision: 1,
            feedback: ids
                .iter()
                .map(|id| Feedback {
                    id: id.to_string(),
                    feedbacker: "Helen".into(),
                    text: String::new(),
                    created_at: Utc::now(),
                })
                .collect(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn everything_starts_unread() {
        let tracker = ReadTracker::new(MemoryStore::default());
        let post = post_with_feedback(&["a", "b"]);

        assert_eq!(tracker.unread_count(&post), 2);
        assert!(!tracker.is_read("p1", "a"));
    }

    #[test]
    fn marking_reduces_unread_count() {
        let mut tracker = ReadTracker::new(MemoryStore::default());
        let post = post_with_feedback(&["a", "b", "c"]);

        tracker.mark_read("p1", "b");
        assert_eq!(tracker.unread_count(&post), 2);

        tracker.mark_all_read(&post);
        assert_eq!(tracker.unread_count(&post), 0);

        let store = tracker.into_inner();
        assert_eq!(store.get("feedback-read:p1").unwrap(), r#"["a","b","c"]"#);
    }

    #[test]
    fn new_feedback_after_reading_is_unread() {
        let mut tracker = ReadTracker::new(MemoryStore::default());
        tracker.mark_all_read(&post_with_feedback(&["a"]));

        assert_eq!(tracker.unread_count(&post_with_feedback(&["a", "b"])), 1);
    }

    #[test]
    fn garbage_entry_counts_as_nothing_read() {
        let mut store = MemoryStore::default();
        store.set("feedback-read:p1", "not json".into());
        let tracker = ReadTracker::new(store);

        assert_eq!(tracker.unread_count(&post_with_feedback(&["a"])), 1);
    }
}
