use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use tower_http::trace::TraceLayer;

use super::handler::{create_complaint, get_complaint, healthz, list_complaints, update_complaint};
use super::state::AppState;

pub fn build_router(state: Arc<AppState>) -> Router {
    let api_routes = Router::new()
        .route("/api/complaints", get(list_complaints).post(create_complaint))
        .route(
            "/api/complaints/{id}",
            get(get_complaint).put(update_complaint),
        );

    Router::new()
        .route("/healthz", get(healthz))
        .merge(api_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
