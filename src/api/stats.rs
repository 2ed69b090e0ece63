use axum::{extract::State, Json};

use super::types::Stats;
use crate::db::{MovieRepo, UserRepo};
use crate::error::ApiError;
use crate::server::AppState;

pub async fn get_stats(State(state): State<AppState>) -> Result<Json<Stats>, ApiError> {
    let total_movies = state.db.count_movies().await?;
    let total_users = state.db.count_users().await?;
    Ok(Json(Stats {
        total_movies,
        total_users,
    }))
}
