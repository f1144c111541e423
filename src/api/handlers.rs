//! API Handlers
//!
//! HTTP request handlers for each admin endpoint.

use axum::{
    extract::{Path, State},
    Json,
};
use tracing::info;

use crate::cache::key_for;
use crate::engine::ApiCache;
use crate::error::{CacheError, Result};
use crate::models::{
    DeleteEntryRequest, DeleteResponse, EventsResponse, FetchRequest, FetchResultResponse,
    HealthResponse, InvalidatePatternRequest, InvalidateResponse, InvalidateTagsRequest,
    StatsResponse,
};

/// Application state shared across all handlers.
#[derive(Clone, Debug)]
pub struct AppState {
    /// Shared cache engine
    pub cache: ApiCache,
}

impl AppState {
    /// Creates a new AppState around the given cache.
    pub fn new(cache: ApiCache) -> Self {
        Self { cache }
    }
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

/// Handler for GET /stats
///
/// Returns current cache statistics.
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(state.cache.stats().into())
}

/// Handler for GET /events
///
/// Returns the most recent hit/miss events, oldest first.
pub async fn events_handler(State(state): State<AppState>) -> Json<EventsResponse> {
    Json(EventsResponse {
        events: state.cache.events(),
    })
}

/// Handler for POST /invalidate/tags
pub async fn invalidate_tags_handler(
    State(state): State<AppState>,
    Json(req): Json<InvalidateTagsRequest>,
) -> Result<Json<InvalidateResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let removed = state.cache.invalidate_by_tags(&req.tags);
    info!(tags = ?req.tags, removed, "Invalidated by tags");
    Ok(Json(InvalidateResponse::new(removed)))
}

/// Handler for POST /invalidate/pattern
///
/// A pattern that does not compile is rejected with 400.
pub async fn invalidate_pattern_handler(
    State(state): State<AppState>,
    Json(req): Json<InvalidatePatternRequest>,
) -> Result<Json<InvalidateResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let removed = state.cache.invalidate_by_pattern_str(&req.pattern)?;
    info!(pattern = %req.pattern, removed, "Invalidated by pattern");
    Ok(Json(InvalidateResponse::new(removed)))
}

/// Handler for DELETE /namespace/:name
pub async fn invalidate_namespace_handler(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Json<InvalidateResponse> {
    let removed = state.cache.namespace(&name).invalidate();
    info!(namespace = %name, removed, "Invalidated namespace");
    Json(InvalidateResponse::new(removed))
}

/// Handler for POST /namespace/:name/invalidate/tags
///
/// The namespace's own tag is part of the match and other namespaces are
/// never touched.
pub async fn namespace_tags_handler(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(req): Json<InvalidateTagsRequest>,
) -> Result<Json<InvalidateResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let removed = state.cache.namespace(&name).invalidate_tags(&req.tags);
    info!(namespace = %name, tags = ?req.tags, removed, "Invalidated namespace tags");
    Ok(Json(InvalidateResponse::new(removed)))
}

/// Handler for DELETE /entries
///
/// Removes every entry.
pub async fn clear_handler(State(state): State<AppState>) -> Json<InvalidateResponse> {
    Json(InvalidateResponse::new(state.cache.clear()))
}

/// Handler for POST /entries/delete
///
/// Removes the entry produced by the described request, if any.
pub async fn delete_entry_handler(
    State(state): State<AppState>,
    Json(req): Json<DeleteEntryRequest>,
) -> Result<Json<DeleteResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let key = key_for(&req.url, &req.options);
    let removed = state.cache.delete(&key);
    Ok(Json(DeleteResponse::new(key.as_str(), removed)))
}

/// Handler for POST /fetch
///
/// Fetches through the cache. Upstream failures map to 502.
pub async fn fetch_handler(
    State(state): State<AppState>,
    Json(req): Json<FetchRequest>,
) -> Result<Json<FetchResultResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let response = state
        .cache
        .cached_fetch(&req.url, req.options, req.cache)
        .await?;
    Ok(Json(response.into()))
}
