use axum::{Router, routing::get};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::db::Store;

mod anime;
mod error;
mod types;

pub use error::ApiError;
pub use types::*;

pub struct AppState {
    pub store: Store,
}

pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any);

    Router::new()
        .route("/health", get(anime::health))
        .route("/anime/search", get(anime::search))
        .route("/anime/anilist/{id}", get(anime::get_by_anilist_id))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
