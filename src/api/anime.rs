use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use std::sync::Arc;

use super::{ApiError, ApiResponse, AppState, SearchPage};
use crate::db::AnimeDetail;

const MAX_PER_PAGE: u64 = 100;

#[derive(Deserialize)]
pub struct SearchQuery {
    pub q: String,
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_per_page")]
    pub per_page: u64,
}

const fn default_page() -> u64 {
    1
}

const fn default_per_page() -> u64 {
    25
}

/// Full persisted graph for one title, addressed by its AniList id.
pub async fn get_by_anilist_id(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<AnimeDetail>>, ApiError> {
    let detail = state
        .store
        .get_anime_detail(id)
        .await?
        .ok_or_else(|| ApiError::anime_not_found(id))?;

    Ok(Json(ApiResponse::success(detail)))
}

/// Paginated substring search over the four title columns.
pub async fn search(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchQuery>,
) -> Result<Json<ApiResponse<SearchPage>>, ApiError> {
    let query = params.q.trim();
    if query.is_empty() {
        return Err(ApiError::validation("query must not be empty"));
    }

    let page = params.page.max(1);
    let per_page = params.per_page.clamp(1, MAX_PER_PAGE);

    let (results, total) = state.store.search_titles(query, page, per_page).await?;

    Ok(Json(ApiResponse::success(SearchPage {
        results,
        page,
        per_page,
        total,
    })))
}

pub async fn health(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<&'static str>>, ApiError> {
    state
        .store
        .ping()
        .await
        .map_err(|e| ApiError::DatabaseError(e.to_string()))?;

    Ok(Json(ApiResponse::success("ok")))
}
