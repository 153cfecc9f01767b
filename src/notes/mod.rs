use chrono::Utc;
use tokio::sync::Mutex;
use tracing::info;
use uuid::Uuid;

use crate::entities::{Feedback, Post};
use crate::store::{NoteStore, StoreError};

mod input;

pub use input::{FeedbackDraft, NewNote, NotePatch};
use input::{author_or_anonymous, non_blank};

#[derive(Debug, thiserror::Error)]
pub enum NoteError {
    #[error("{0}")]
    Invalid(String),
    #[error("Note not found.")]
    NotFound,
    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type NoteResult<T> = Result<T, NoteError>;

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// Post operations over the JSON store. Every call reads the whole
/// collection, and mutations write it back in full.
///
/// Mutations within one process are serialized, which the original
/// lock-free board never did; separate processes sharing the file can
/// still lose each other's updates.
#[derive(Debug)]
pub struct NoteService {
    store: NoteStore,
    write_lock: Mutex<()>,
}

impl NoteService {
    pub fn new(store: NoteStore) -> Self {
        Self {
            store,
            write_lock: Mutex::new(()),
        }
    }

    pub fn store(&self) -> &NoteStore {
        &self.store
    }

    pub async fn list(&self) -> NoteResult<Vec<Post>> {
        Ok(self.store.load().await?.into_posts())
    }

    pub async fn get(&self, id: &str) -> NoteResult<Post> {
        self.store
            .load()
            .await?
            .find(id)
            .cloned()
            .ok_or(NoteError::NotFound)
    }

    pub async fn create(&self, input: NewNote) -> NoteResult<Post> {
        let note = input.check().map_err(NoteError::Invalid)?;

        let _guard = self.write_lock.lock().await;
        let mut posts = self.store.load().await?;
        let post = Post {
            id: new_id(),
            author: note.author,
            content: note.content,
            section: note.section,
            custom_date: note.custom_date,
            link: note.link,
            status: note.status,
            post_type: note.post_type,
            revision: note.revision,
            feedback: Vec::new(),
            created_at: Utc::now(),
        };
        posts.prepend(post.clone());
        self.store.save(&posts).await?;

        info!(id = %post.id, section = %post.section, "note created");
        Ok(post)
    }

    pub async fn update(&self, id: &str, patch: NotePatch) -> NoteResult<Post> {
        let patch = patch.check().map_err(NoteError::Invalid)?;

        let _guard = self.write_lock.lock().await;
        let mut posts = self.store.load().await?;
        let post = posts.find_mut(id).ok_or(NoteError::NotFound)?;

        if let Some(revision) = patch.revision {
            if revision != post.revision {
                post.feedback.clear();
            }
            post.revision = revision;
        }
        if let Some(author) = patch.author {
            post.author = author;
        }
        if let Some(content) = patch.content {
            post.content = content;
        }
        if let Some(section) = patch.section {
            post.section = section;
        }
        if let Some(status) = patch.status {
            post.status = status;
        }
        if let Some(post_type) = patch.post_type {
            post.post_type = post_type;
        }
        if let Some(custom_date) = patch.custom_date {
            post.custom_date = custom_date;
        }
        if let Some(link) = patch.link {
            post.link = link;
        }

        let updated = post.clone();
        self.store.save(&posts).await?;

        info!(id = %updated.id, status = %updated.status, "note updated");
        Ok(updated)
    }

    pub async fn append_feedback(&self, id: &str, draft: FeedbackDraft) -> NoteResult<Post> {
        let _guard = self.write_lock.lock().await;
        let mut posts = self.store.load().await?;
        let post = posts.find_mut(id).ok_or(NoteError::NotFound)?;

        let mut entry_id = new_id();
        while post.feedback_by_id(&entry_id).is_some() {
            entry_id = new_id();
        }
        post.feedback.push(Feedback {
            id: entry_id,
            feedbacker: author_or_anonymous(draft.feedbacker.as_deref()),
            text: non_blank(draft.text.as_deref()).unwrap_or_default(),
            created_at: Utc::now(),
        });

        let updated = post.clone();
        self.store.save(&posts).await?;

        info!(id = %updated.id, count = updated.feedback.len(), "feedback added");
        Ok(updated)
    }

    pub async fn delete(&self, id: &str) -> NoteResult<Post> {
        let _guard = self.write_lock.lock().await;
        let mut posts = self.store.load().await?;
        let removed = posts.remove(id).ok_or(NoteError::NotFound)?;
        self.store.save(&posts).await?;

        info!(id = %removed.id, "note deleted");
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;
    use crate::entities::{ANONYMOUS, PostType, Status};

    fn service() -> (TempDir, NoteService) {
        let tmp = tempfile::tempdir().unwrap();
        let service = NoteService::new(NoteStore::new(tmp.path()));
        (tmp, service)
    }

    fn draft(author: &str) -> NewNote {
        NewNote {
            author: Some(author.into()),
            content: Some("Hi".into()),
            section: Some("homemadedelights".into()),
            status: Some("student_feedback".into()),
            post_type: Some("fun".into()),
            ..NewNote::default()
        }
    }

    #[tokio::test]
    async fn create_prepends_and_assigns_ids() {
        let (_tmp, notes) = service();

        let first = notes.create(draft("Alice")).await.unwrap();
        let second = notes.create(draft("Bob")).await.unwrap();

        let all = notes.list().await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id, second.id);
        assert_eq!(all[1].id, first.id);
        assert_ne!(first.id, second.id);
        assert!(first.feedback.is_empty());
        assert_eq!(first.revision, 1);
    }

    #[tokio::test]
    async fn invalid_create_does_not_persist() {
        let (_tmp, notes) = service();
        let bad = NewNote {
            post_type: Some("poem".into()),
            ..draft("Alice")
        };

        let err = notes.create(bad).await.unwrap_err();

        assert!(matches!(err, NoteError::Invalid(_)));
        assert!(notes.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn revision_change_clears_feedback() {
        let (_tmp, notes) = service();
        let post = notes.create(draft("Alice")).await.unwrap();
        notes
            .append_feedback(&post.id, FeedbackDraft {
                feedbacker: Some("Helen".into()),
                text: Some("tighten the intro".into()),
            })
            .await
            .unwrap();

        let same = notes
            .update(&post.id, NotePatch {
                revision: Some(1),
                ..NotePatch::default()
            })
            .await
            .unwrap();
        assert_eq!(same.feedback.len(), 1);

        let bumped = notes
            .update(&post.id, NotePatch {
                revision: Some(2),
                ..NotePatch::default()
            })
            .await
            .unwrap();
        assert_eq!(bumped.revision, 2);
        assert!(bumped.feedback.is_empty());
        assert!(notes.get(&post.id).await.unwrap().feedback.is_empty());
    }

    #[tokio::test]
    async fn invalid_patch_changes_nothing() {
        let (_tmp, notes) = service();
        let post = notes.create(draft("Alice")).await.unwrap();

        let err = notes
            .update(&post.id, NotePatch {
                author: Some("Mallory".into()),
                post_type: Some("gossip".into()),
                ..NotePatch::default()
            })
            .await
            .unwrap_err();

        assert!(matches!(err, NoteError::Invalid(_)));
        assert_eq!(notes.get(&post.id).await.unwrap(), post);
    }

    #[tokio::test]
    async fn status_move_keeps_other_fields() {
        let (_tmp, notes) = service();
        let post = notes.create(draft("Alice")).await.unwrap();

        let moved = notes
            .update(&post.id, NotePatch::status(Status::HelenFeedback))
            .await
            .unwrap();

        assert_eq!(moved.status, Status::HelenFeedback);
        assert_eq!(moved.post_type, PostType::Fun);
        assert_eq!(moved.created_at, post.created_at);
    }

    #[tokio::test]
    async fn feedback_defaults_and_unique_ids() {
        let (_tmp, notes) = service();
        let post = notes.create(draft("Alice")).await.unwrap();

        notes
            .append_feedback(&post.id, FeedbackDraft {
                feedbacker: Some(" ".into()),
                text: None,
            })
            .await
            .unwrap();
        let updated = notes
            .append_feedback(&post.id, FeedbackDraft {
                feedbacker: Some("Helen".into()),
                text: Some("ok".into()),
            })
            .await
            .unwrap();

        assert_eq!(updated.feedback.len(), 2);
        assert_eq!(updated.feedback[0].feedbacker, ANONYMOUS);
        assert_eq!(updated.feedback[0].text, "");
        assert_eq!(updated.feedback[1].feedbacker, "Helen");
        assert_ne!(updated.feedback[0].id, updated.feedback[1].id);
    }

    #[tokio::test]
    async fn unknown_ids_are_not_found() {
        let (_tmp, notes) = service();

        assert!(matches!(notes.get("missing").await, Err(NoteError::NotFound)));
        assert!(matches!(notes.delete("missing").await, Err(NoteError::NotFound)));
        assert!(matches!(
            notes.update("missing", NotePatch::default()).await,
            Err(NoteError::NotFound)
        ));
        assert!(matches!(
            notes.append_feedback("missing", FeedbackDraft::default()).await,
            Err(NoteError::NotFound)
        ));
    }

    #[tokio::test]
    async fn delete_returns_removed_post() {
        let (_tmp, notes) = service();
        let post = notes.create(draft("Alice")).await.unwrap();

        let removed = notes.delete(&post.id).await.unwrap();

        assert_eq!(removed, post);
        assert!(matches!(notes.get(&post.id).await, Err(NoteError::NotFound)));
    }

    #[tokio::test]
    async fn concurrent_creates_are_both_kept() {
        let (_tmp, notes) = service();

        let (a, b) = tokio::join!(notes.create(draft("Alice")), notes.create(draft("Bob")));
        a.unwrap();
        b.unwrap();

        assert_eq!(notes.list().await.unwrap().len(), 2);
    }
}
