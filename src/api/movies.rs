use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use uuid::Uuid;

use super::types::*;
use crate::db::{Movie, MovieFilter, MovieRepo};
use crate::error::ApiError;
use crate::server::AppState;

pub async fn list_movies(
    State(state): State<AppState>,
    Query(query): Query<MovieListQuery>,
) -> Result<Json<Vec<Movie>>, ApiError> {
    let mut filter = MovieFilter {
        min_rating: query.min_rating,
        max_rating: query.max_rating,
        ..Default::default()
    };
    if let Some(genres) = query.genres {
        filter.genres = genres
            .split(',')
            .map(|g| g.trim().to_string())
            .filter(|g| !g.is_empty())
            .collect();
    }

    let movies = state.db.list_movies(&filter).await?;
    Ok(Json(movies))
}

pub async fn my_collection(
    State(state): State<AppState>,
    Query(query): Query<MyCollectionQuery>,
) -> Result<Json<Vec<Movie>>, ApiError> {
    let filter = MovieFilter {
        added_by: query.email,
        ..Default::default()
    };
    let movies = state.db.list_movies(&filter).await?;
    Ok(Json(movies))
}

pub async fn top_rated(
    State(state): State<AppState>,
    Query(query): Query<LimitQuery>,
) -> Result<Json<Vec<Movie>>, ApiError> {
    let movies = state.db.top_rated(query.limit.unwrap_or(5)).await?;
    Ok(Json(movies))
}

pub async fn recently_added(
    State(state): State<AppState>,
    Query(query): Query<LimitQuery>,
) -> Result<Json<Vec<Movie>>, ApiError> {
    let movies = state.db.recently_added(query.limit.unwrap_or(6)).await?;
    Ok(Json(movies))
}

pub async fn get_movie(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Movie>, ApiError> {
    let movie = state.db.get_movie(&id).await?;
    Ok(Json(movie))
}

pub async fn add_movie(
    State(state): State<AppState>,
    Json(body): Json<NewMovie>,
) -> Result<(StatusCode, Json<MovieAdded>), ApiError> {
    if body.title.trim().is_empty() {
        return Err(ApiError::bad_request("Movie title must not be empty"));
    }

    let movie = Movie {
        id: Uuid::new_v4().to_string(),
        title: body.title,
        genre: body.genre,
        rating: body.rating,
        added_by: body.added_by,
        year: body.year,
        overview: body.overview,
        poster_url: body.poster_url,
        created_at: Some(Utc::now()),
    };
    state.db.insert_movie(&movie).await?;

    Ok((
        StatusCode::CREATED,
        Json(MovieAdded {
            message: "Movie added successfully".to_string(),
            movie_id: movie.id,
        }),
    ))
}

pub async fn update_movie(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<UpdateMovie>,
) -> Result<Json<UpdateSummary>, ApiError> {
    let patch = body.into_patch();
    if patch.is_empty() {
        return Err(ApiError::bad_request("No fields to update"));
    }

    let matched = state.db.update_movie(&id, &patch).await?;
    Ok(Json(UpdateSummary {
        matched_count: matched,
        modified_count: matched,
    }))
}

pub async fn delete_movie(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DeleteSummary>, ApiError> {
    let deleted = state.db.delete_movie(&id).await?;
    Ok(Json(DeleteSummary {
        deleted_count: deleted,
    }))
}
