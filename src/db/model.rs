use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A movie document. `genre` is stored as a list; input may arrive as a
/// single string and is normalized at the API boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Movie {
    pub id: String,
    pub title: String,
    pub genre: Vec<String>,
    pub rating: Option<f64>,
    pub added_by: Option<String>,
    pub year: Option<i32>,
    pub overview: Option<String>,
    pub poster_url: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: Option<String>,
    pub photo_url: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchlistEntry {
    pub id: String,
    pub user_email: String,
    pub movie_id: String,
    pub created_at: Option<DateTime<Utc>>,
}

/// Filter for the movie listing. All constraints are optional; an empty
/// filter matches everything. Rating bounds are inclusive, genres match
/// if the movie carries any of the given genres.
#[derive(Debug, Clone, Default)]
pub struct MovieFilter {
    pub genres: Vec<String>,
    pub min_rating: Option<f64>,
    pub max_rating: Option<f64>,
    pub added_by: Option<String>,
}

impl MovieFilter {
    pub fn matches_genres(&self, movie_genres: &[String]) -> bool {
        if self.genres.is_empty() {
            return true;
        }
        movie_genres.iter().any(|g| self.genres.contains(g))
    }
}

/// Field-level patch for a movie. Only fields that are present overwrite
/// the stored value; there is no deep merge.
#[derive(Debug, Clone, Default)]
pub struct MoviePatch {
    pub title: Option<String>,
    pub genre: Option<Vec<String>>,
    pub rating: Option<f64>,
    pub added_by: Option<String>,
    pub year: Option<i32>,
    pub overview: Option<String>,
    pub poster_url: Option<String>,
}

impl MoviePatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.genre.is_none()
            && self.rating.is_none()
            && self.added_by.is_none()
            && self.year.is_none()
            && self.overview.is_none()
            && self.poster_url.is_none()
    }
}

/// Outcome of a user insert. The email uniqueness constraint is the source
/// of truth; a conflicting insert yields the already stored record.
#[derive(Debug, Clone)]
pub enum UserInsert {
    Created(User),
    Exists(User),
}

#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("Database error: {0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Already exists: {0}")]
    AlreadyExists(String),
    #[error("Corrupt record: {0}")]
    Corrupt(String),
}

pub type DbResult<T> = Result<T, DbError>;
