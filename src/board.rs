//! Board view model: posts of one section laid out as status columns, each
//! split into post-type groups. Rebuilt from the full collection on every
//! fetch.

use chrono::{DateTime, Utc};

use crate::entities::{Feedback, Post, PostType, Section, Status};
use crate::interaction::BoardState;
use crate::read_state::{KeyValueStore, ReadTracker};

pub const NO_COMMENT: &str = "(No comment provided)";

#[derive(Clone, Debug, PartialEq)]
pub enum BoardView {
    /// The section has no posts; the client shows its placeholder.
    Empty { section: Section },
    Columns {
        section: Section,
        columns: Vec<StatusColumn>,
    },
}

#[derive(Clone, Debug, PartialEq)]
pub struct StatusColumn {
    pub status: Status,
    pub groups: Vec<PostTypeGroup>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PostTypeGroup {
    pub post_type: PostType,
    pub label: &'static str,
    pub cards: Vec<Card>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Card {
    pub id: String,
    pub author: String,
    pub type_label: &'static str,
    pub content: Option<String>,
    pub link: Option<String>,
    pub custom_date: Option<String>,
    pub revision: i64,
    pub feedback_count: usize,
    pub unread_count: usize,
    pub expanded: bool,
    pub details_button: &'static str,
    pub feedback_open: bool,
    pub feedback_button: String,
    pub feedback: Vec<FeedbackLine>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct FeedbackLine {
    pub id: String,
    pub feedbacker: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub read: bool,
}

impl BoardView {
    pub fn section(&self) -> Section {
        match self {
            BoardView::Empty { section } | BoardView::Columns { section, .. } => *section,
        }
    }

    pub fn column(&self, status: Status) -> Option<&StatusColumn> {
        match self {
            BoardView::Empty { .. } => None,
            BoardView::Columns { columns, .. } => columns.iter().find(|c| c.status == status),
        }
    }
}

pub fn details_button_caption(expanded: bool) -> &'static str {
    if expanded { "Hide Details" } else { "Show Details" }
}

/// An open feedback panel always offers to hide; a closed one shows the count.
pub fn feedback_button_caption(count: usize, open: bool) -> String {
    if open {
        "Hide Feedback".to_string()
    } else if count == 0 {
        "View/Add Feedback".to_string()
    } else {
        format!("View/Add Feedback ({count})")
    }
}

/// Feedback entries newest first, blank text replaced by a placeholder.
pub fn feedback_lines<S: KeyValueStore>(post: &Post, reads: &ReadTracker<S>) -> Vec<FeedbackLine> {
    let mut entries: Vec<&Feedback> = post.feedback.iter().collect();
    entries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    entries
        .into_iter()
        .map(|entry| FeedbackLine {
            id: entry.id.clone(),
            feedbacker: entry.feedbacker.clone(),
            text: if entry.text.trim().is_empty() {
                NO_COMMENT.to_string()
            } else {
                entry.text.clone()
            },
            created_at: entry.created_at,
            read: reads.is_read(&post.id, &entry.id),
        })
        .collect()
}

fn card<S: KeyValueStore>(post: &Post, state: &BoardState, reads: &ReadTracker<S>) -> Card {
    let expanded = state.is_expanded(&post.id);
    let feedback_open = state.is_feedback_open(&post.id);
    Card {
        id: post.id.clone(),
        author: post.author.clone(),
        type_label: post.post_type.label(),
        content: post.content.clone(),
        link: post.link.clone(),
        custom_date: post.custom_date.clone(),
        revision: post.revision,
        feedback_count: post.feedback.len(),
        unread_count: reads.unread_count(post),
        expanded,
        details_button: details_button_caption(expanded),
        feedback_open,
        feedback_button: feedback_button_caption(post.feedback.len(), feedback_open),
        feedback: feedback_lines(post, reads),
    }
}

/// Lays out the active section of `state`, with each card's toggles as the
/// client currently has them.
pub fn render<S: KeyValueStore>(
    posts: &[Post],
    state: &BoardState,
    reads: &ReadTracker<S>,
) -> BoardView {
    let section = state.active_section();
    let visible: Vec<&Post> = posts.iter().filter(|post| post.section == section).collect();
    if visible.is_empty() {
        return BoardView::Empty { section };
    }

    let columns = Status::ALL
        .iter()
        .map(|&status| {
            let groups = PostType::ALL
                .iter()
                .filter_map(|&post_type| {
                    let cards: Vec<Card> = visible
                        .iter()
                        .filter(|post| post.status == status && post.post_type == post_type)
                        .map(|post| card(post, state, reads))
                        .collect();
                    (!cards.is_empty()).then(|| PostTypeGroup {
                        post_type,
                        label: post_type.label(),
                        cards,
                    })
                })
                .collect();
            StatusColumn { status, groups }
        })
        .collect();

    BoardView::Columns { section, columns }
}
