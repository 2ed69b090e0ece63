use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use uuid::Uuid;

use super::types::WatchlistAdd;
use crate::db::{DbError, WatchlistEntry, WatchlistRepo};
use crate::error::ApiError;
use crate::server::AppState;

pub async fn add_to_watchlist(
    State(state): State<AppState>,
    Json(body): Json<WatchlistAdd>,
) -> Result<(StatusCode, Json<WatchlistEntry>), ApiError> {
    if body.user_email.trim().is_empty() || body.movie_id.trim().is_empty() {
        return Err(ApiError::bad_request("userEmail and movieId are required"));
    }

    let entry = WatchlistEntry {
        id: Uuid::new_v4().to_string(),
        user_email: body.user_email,
        movie_id: body.movie_id,
        created_at: Some(Utc::now()),
    };

    match state.db.add_watchlist_entry(&entry).await {
        Ok(()) => Ok((StatusCode::CREATED, Json(entry))),
        Err(DbError::AlreadyExists(_)) => Err(ApiError::bad_request("Already in watchList")),
        Err(e) => Err(e.into()),
    }
}

pub async fn list_for_user(
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> Result<Json<Vec<WatchlistEntry>>, ApiError> {
    let entries = state.db.list_watchlist(&email).await?;
    Ok(Json(entries))
}
