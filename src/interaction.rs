//! Client-side board state: the active section, the create/edit modal,
//! drag-and-drop moves and per-card toggles. Every accepted action yields
//! the single API call it stands for; the caller performs it and then
//! re-renders from a fresh list.

use std::collections::HashSet;

use crate::entities::{Post, Section, Status};
use crate::notes::{FeedbackDraft, NewNote, NotePatch};
use crate::read_state::{KeyValueStore, ReadTracker};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum FormError {
    #[error("Author name is required.")]
    AuthorRequired,
    #[error("Post type is required.")]
    PostTypeRequired,
    #[error("Revision must be a whole number.")]
    Revision,
    #[error("Please enter feedback text.")]
    FeedbackTextRequired,
    #[error("No post form is open.")]
    NotOpen,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Modal {
    #[default]
    Closed,
    Creating,
    Editing {
        note_id: String,
    },
}

/// Raw form fields, exactly as typed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PostForm {
    pub author: String,
    pub post_type: String,
    pub revision: String,
    pub custom_date: String,
    pub link: String,
    pub content: String,
}

impl PostForm {
    fn blank() -> Self {
        Self {
            revision: "1".to_string(),
            ..Self::default()
        }
    }

    fn prefilled(post: &Post) -> Self {
        Self {
            author: post.author.clone(),
            post_type: post.post_type.as_str().to_string(),
            revision: post.revision.to_string(),
            custom_date: post.custom_date.clone().unwrap_or_default(),
            link: post.link.clone().unwrap_or_default(),
            content: post.content.clone().unwrap_or_default(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Submission {
    Create(NewNote),
    Update { id: String, patch: NotePatch },
}

#[derive(Clone, Debug, PartialEq)]
pub struct StatusMove {
    pub id: String,
    pub patch: NotePatch,
}

fn trimmed(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

#[derive(Debug, Default)]
pub struct BoardState {
    active_section: Section,
    modal: Modal,
    dragging: Option<String>,
    expanded: HashSet<String>,
    feedback_open: HashSet<String>,
}

impl BoardState {
    pub fn new(section: Section) -> Self {
        Self {
            active_section: section,
            ..Self::default()
        }
    }

    pub fn active_section(&self) -> Section {
        self.active_section
    }

    pub fn modal(&self) -> &Modal {
        &self.modal
    }

    pub fn switch_section(&mut self, section: Section) {
        self.active_section = section;
        self.dragging = None;
    }

    /// Navigation by wire name; unknown names are ignored.
    pub fn switch_section_named(&mut self, name: &str) -> bool {
        match Section::parse(name) {
            Some(section) => {
                self.switch_section(section);
                true
            }
            None => false,
        }
    }

    pub fn open_create(&mut self) -> PostForm {
        self.modal = Modal::Creating;
        PostForm::blank()
    }

    pub fn open_edit(&mut self, post: &Post) -> PostForm {
        self.modal = Modal::Editing {
            note_id: post.id.clone(),
        };
        PostForm::prefilled(post)
    }

    pub fn close_modal(&mut self) {
        self.modal = Modal::Closed;
    }

    /// Turns the open form into an API call. New posts always start in
    /// `student_feedback`; edits never touch status, which only changes by
    /// dragging. The modal stays open until [`BoardState::close_modal`] so a
    /// failed request can be resubmitted.
    pub fn submit(&self, form: &PostForm) -> Result<Submission, FormError> {
        if self.modal == Modal::Closed {
            return Err(FormError::NotOpen);
        }
        let author = trimmed(&form.author).ok_or(FormError::AuthorRequired)?;
        let post_type = trimmed(&form.post_type).ok_or(FormError::PostTypeRequired)?;
        let revision = match form.revision.trim() {
            "" => 1,
            raw => raw.parse::<i64>().map_err(|_| FormError::Revision)?,
        };
        let section = self.active_section.as_str().to_string();

        match &self.modal {
            Modal::Closed => Err(FormError::NotOpen),
            Modal::Creating => Ok(Submission::Create(NewNote {
                author: Some(author),
                content: trimmed(&form.content),
                section: Some(section),
                status: Some(Status::StudentFeedback.as_str().to_string()),
                post_type: Some(post_type),
                revision: Some(revision),
                custom_date: trimmed(&form.custom_date),
                link: trimmed(&form.link),
            })),
            Modal::Editing { note_id } => Ok(Submission::Update {
                id: note_id.clone(),
                patch: NotePatch {
                    author: Some(author),
                    content: Some(trimmed(&form.content)),
                    section: Some(section),
                    status: None,
                    post_type: Some(post_type),
                    revision: Some(revision),
                    custom_date: Some(trimmed(&form.custom_date)),
                    link: Some(trimmed(&form.link)),
                },
            }),
        }
    }

    pub fn begin_drag(&mut self, id: impl Into<String>) {
        self.dragging = Some(id.into());
    }

    pub fn end_drag(&mut self) {
        self.dragging = None;
    }

    pub fn dragging(&self) -> Option<&str> {
        self.dragging.as_deref()
    }

    /// Dropping onto a column moves the dragged card there. Nothing is
    /// dragged, nothing happens.
    pub fn drop_on(&mut self, status: Status) -> Option<StatusMove> {
        self.dragging.take().map(|id| StatusMove {
            id,
            patch: NotePatch::status(status),
        })
    }

    /// A confirmed delete yields the id to send `DELETE` for, and drops the
    /// card's local state. Unconfirmed, nothing happens.
    pub fn delete(&mut self, id: &str, confirmed: bool) -> Option<String> {
        if !confirmed {
            return None;
        }
        self.expanded.remove(id);
        self.feedback_open.remove(id);
        if self.dragging.as_deref() == Some(id) {
            self.dragging = None;
        }
        if matches!(&self.modal, Modal::Editing { note_id } if note_id == id) {
            self.modal = Modal::Closed;
        }
        Some(id.to_string())
    }

    pub fn toggle_details(&mut self, id: &str) -> bool {
        toggle(&mut self.expanded, id)
    }

    pub fn is_expanded(&self, id: &str) -> bool {
        self.expanded.contains(id)
    }

    /// Shows or hides a card's feedback. Showing it marks every current
    /// entry as read.
    pub fn toggle_feedback<S: KeyValueStore>(
        &mut self,
        post: &Post,
        reads: &mut ReadTracker<S>,
    ) -> bool {
        let open = toggle(&mut self.feedback_open, &post.id);
        if open {
            reads.mark_all_read(post);
        }
        open
    }

    pub fn is_feedback_open(&self, id: &str) -> bool {
        self.feedback_open.contains(id)
    }

    pub fn feedback_submission(&self, name: &str, text: &str) -> Result<FeedbackDraft, FormError> {
        let text = trimmed(text).ok_or(FormError::FeedbackTextRequired)?;
        Ok(FeedbackDraft {
            feedbacker: trimmed(name),
            text: Some(text),
        })
    }
}

fn toggle(set: &mut HashSet<String>, id: &str) -> bool {
    if set.remove(id) {
        false
    } else {
        set.insert(id.to_string());
        true
    }
}
