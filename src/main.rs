use std::sync::Arc;

use anyhow::Context;

use docsqa::config::Settings;
use docsqa::logging;
use docsqa::server::build_router;
use docsqa::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::from_env().context("failed to load settings")?;
    logging::init(&settings);

    let state = AppState::initialize(&settings)
        .await
        .context("failed to initialize application state")?;
    let router = build_router(Arc::new(state));

    let addr = format!("127.0.0.1:{}", settings.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;

    tracing::info!("query server listening on http://{}", addr);
    axum::serve(listener, router)
        .await
        .context("server error")?;

    Ok(())
}
