use std::sync::Arc;

use note_board::{AppState, app, config::Config};
use poem::listener::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env()?;
    let state = Arc::new(AppState::new(&config.data_dir));
    // create the data file up front so a bad DATA_DIR fails at startup
    state.notes.list().await?;

    info!(
        addr = %config.addr,
        data = %state.notes.store().path().display(),
        "note board listening"
    );

    poem::Server::new(TcpListener::bind(config.addr))
        .run(app(state, config.public_dir.clone()))
        .await?;
    Ok(())
}
