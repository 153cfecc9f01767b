use std::path::PathBuf;
use std::sync::Arc;

use poem::{
    Endpoint, EndpointExt, Route, get, handler,
    endpoint::StaticFilesEndpoint,
    http::StatusCode,
    middleware::{Cors, Tracing},
};
use poem_openapi::OpenApiService;

pub mod api;
pub mod board;
pub mod config;
pub mod entities;
pub mod interaction;
pub mod notes;
pub mod read_state;
pub mod store;

use notes::NoteService;
use store::NoteStore;

pub struct AppState {
    pub notes: NoteService,
}

impl AppState {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            notes: NoteService::new(NoteStore::new(data_dir)),
        }
    }
}

#[handler]
fn healthz() -> StatusCode {
    StatusCode::OK
}

/// Full route tree: JSON API under `/api`, docs under `/docs`, static
/// assets everywhere else.
pub fn app(state: Arc<AppState>, public_dir: PathBuf) -> impl Endpoint + 'static {
    let api = OpenApiService::new(api::Api::new(state), "Note Board API", "1.0")
        .server("/api");
    let ui = api.swagger_ui();
    let spec = api.spec_endpoint();

    Route::new()
        .nest("/api", api)
        .nest("/docs", ui)
        .at("/openapi.json", spec)
        .at("/healthz", get(healthz))
        .nest(
            "/",
            StaticFilesEndpoint::new(public_dir).index_file("index.html"),
        )
        .with(Cors::new())
        .with(Tracing)
}
