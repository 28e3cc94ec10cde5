use anyhow::Result;
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::routes;
use crate::state::AppState;

pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(routes::next_event::router())
        .merge(routes::health::router())
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

pub async fn serve(state: AppState, host: &str, port: u16) -> Result<()> {
    let app = app(state);

    let listener = tokio::net::TcpListener::bind((host, port)).await?;
    tracing::info!("nextevent listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app).await?;

    Ok(())
}
