use std::sync::Arc;

use poem_openapi::{
    ApiResponse, Object, OpenApi,
    param::Path,
    payload::Json,
    types::MaybeUndefined,
};
use tracing::error;

use crate::AppState;
use crate::entities::Post;
use crate::notes::{FeedbackDraft, NewNote, NoteError, NotePatch};

#[derive(Object)]
pub struct ErrorBody {
    pub message: String,
}

#[derive(Object)]
#[oai(rename_all = "camelCase")]
struct NoteCreate {
    author: Option<String>,
    content: Option<String>,
    section: Option<String>,
    status: Option<String>,
    post_type: Option<String>,
    revision: Option<i64>,
    custom_date: Option<String>,
    link: Option<String>,
}

/// Any subset of the mutable fields. `content`, `customDate` and `link`
/// accept `null` to clear the stored value.
#[derive(Object)]
#[oai(rename_all = "camelCase")]
struct NoteUpdate {
    author: Option<String>,
    content: MaybeUndefined<String>,
    section: Option<String>,
    status: Option<String>,
    post_type: Option<String>,
    revision: Option<i64>,
    custom_date: MaybeUndefined<String>,
    link: MaybeUndefined<String>,
}

#[derive(Object)]
#[oai(rename_all = "camelCase")]
struct FeedbackCreate {
    feedbacker: Option<String>,
    feedback_text: Option<String>,
}

fn settable<T>(value: MaybeUndefined<T>) -> Option<Option<T>> {
    match value {
        MaybeUndefined::Undefined => None,
        MaybeUndefined::Null => Some(None),
        MaybeUndefined::Value(v) => Some(Some(v)),
    }
}

impl From<NoteCreate> for NewNote {
    fn from(input: NoteCreate) -> Self {
        NewNote {
            author: input.author,
            content: input.content,
            section: input.section,
            status: input.status,
            post_type: input.post_type,
            revision: input.revision,
            custom_date: input.custom_date,
            link: input.link,
        }
    }
}

impl From<NoteUpdate> for NotePatch {
    fn from(input: NoteUpdate) -> Self {
        NotePatch {
            author: input.author,
            content: settable(input.content),
            section: input.section,
            status: input.status,
            post_type: input.post_type,
            revision: input.revision,
            custom_date: settable(input.custom_date),
            link: settable(input.link),
        }
    }
}

fn message(text: impl Into<String>) -> Json<ErrorBody> {
    Json(ErrorBody {
        message: text.into(),
    })
}

#[derive(ApiResponse)]
#[oai(bad_request_handler = "note_bad_request")]
pub enum NoteResponse {
    #[oai(status = 200)]
    Ok(Json<Post>),
    #[oai(status = 201)]
    Created(Json<Post>),
    #[oai(status = 400)]
    BadRequest(Json<ErrorBody>),
    #[oai(status = 404)]
    NotFound(Json<ErrorBody>),
    #[oai(status = 500)]
    InternalError(Json<ErrorBody>),
}

fn note_bad_request(err: poem::Error) -> NoteResponse {
    NoteResponse::BadRequest(message(err.to_string()))
}

impl NoteResponse {
    /// Maps a failed operation; storage failures are logged and hidden
    /// behind `failure`.
    fn failed(err: NoteError, failure: &str) -> Self {
        match err {
            NoteError::Invalid(reason) => NoteResponse::BadRequest(message(reason)),
            NoteError::NotFound => NoteResponse::NotFound(message("Note not found.")),
            NoteError::Store(e) => {
                error!(error = %e, "{failure}");
                NoteResponse::InternalError(message(failure))
            }
        }
    }
}

#[derive(ApiResponse)]
pub enum NoteListResponse {
    #[oai(status = 200)]
    Ok(Json<Vec<Post>>),
    #[oai(status = 500)]
    InternalError(Json<ErrorBody>),
}

pub struct Api {
    state: Arc<AppState>,
}

impl Api {
    pub fn new(state: Arc<AppState>) -> Self {
        Self { state }
    }
}

#[OpenApi]
impl Api {
    /// All posts, newest first
    #[oai(path = "/notes", method = "get")]
    async fn list_notes(&self) -> NoteListResponse {
        match self.state.notes.list().await {
            Ok(posts) => NoteListResponse::Ok(Json(posts)),
            Err(e) => {
                error!(error = %e, "Failed to read notes");
                NoteListResponse::InternalError(message("Failed to load notes."))
            }
        }
    }

    /// Single post
    #[oai(path = "/notes/:id", method = "get")]
    async fn get_note(&self, Path(id): Path<String>) -> NoteResponse {
        match self.state.notes.get(&id).await {
            Ok(post) => NoteResponse::Ok(Json(post)),
            Err(e) => NoteResponse::failed(e, "Failed to load note."),
        }
    }

    /// Create a post
    #[oai(path = "/notes", method = "post")]
    async fn create_note(&self, Json(input): Json<NoteCreate>) -> NoteResponse {
        match self.state.notes.create(input.into()).await {
            Ok(post) => NoteResponse::Created(Json(post)),
            Err(e) => NoteResponse::failed(e, "Failed to save note."),
        }
    }

    /// Merge fields into a post. Changing `revision` drops its feedback.
    #[oai(path = "/notes/:id", method = "patch")]
    async fn update_note(
        &self,
        Path(id): Path<String>,
        Json(input): Json<NoteUpdate>,
    ) -> NoteResponse {
        match self.state.notes.update(&id, input.into()).await {
            Ok(post) => NoteResponse::Ok(Json(post)),
            Err(e) => NoteResponse::failed(e, "Failed to update note."),
        }
    }

    /// Append a feedback entry
    #[oai(path = "/notes/:id/feedback", method = "post")]
    async fn add_feedback(
        &self,
        Path(id): Path<String>,
        Json(input): Json<FeedbackCreate>,
    ) -> NoteResponse {
        let draft = FeedbackDraft {
            feedbacker: input.feedbacker,
            text: input.feedback_text,
        };
        match self.state.notes.append_feedback(&id, draft).await {
            Ok(post) => NoteResponse::Ok(Json(post)),
            Err(e) => NoteResponse::failed(e, "Failed to add feedback."),
        }
    }

    /// Delete a post, returning it
    #[oai(path = "/notes/:id", method = "delete")]
    async fn delete_note(&self, Path(id): Path<String>) -> NoteResponse {
        match self.state.notes.delete(&id).await {
            Ok(post) => NoteResponse::Ok(Json(post)),
            Err(e) => NoteResponse::failed(e, "Failed to delete note."),
        }
    }
}
