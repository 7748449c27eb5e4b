use crate::handlers;
use crate::state::AppState;
use axum::{routing::{get, post}, Router};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/index.html", get(handlers::index))
        .route("/results.html", get(handlers::results_page))
        .route("/submit", post(handlers::submit))
        .route("/results-data", get(handlers::results_data))
        .route("/reset", post(handlers::reset))
        .fallback(handlers::not_found)
        .with_state(state)
}
