use serde::{Deserialize, Deserializer, Serialize};

use crate::db::{MoviePatch, User};

/// `genre` arrives from clients either as a single string or as a list.
#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

fn genre_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(s) => vec![s],
        OneOrMany::Many(v) => v,
    })
}

fn opt_genre_list<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<OneOrMany>::deserialize(deserializer)?.map(|g| match g {
        OneOrMany::One(s) => vec![s],
        OneOrMany::Many(v) => v,
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMovie {
    pub title: String,
    #[serde(default, deserialize_with = "genre_list")]
    pub genre: Vec<String>,
    pub rating: Option<f64>,
    pub added_by: Option<String>,
    pub year: Option<i32>,
    pub overview: Option<String>,
    pub poster_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMovie {
    pub title: Option<String>,
    #[serde(default, deserialize_with = "opt_genre_list")]
    pub genre: Option<Vec<String>>,
    pub rating: Option<f64>,
    pub added_by: Option<String>,
    pub year: Option<i32>,
    pub overview: Option<String>,
    pub poster_url: Option<String>,
}

impl UpdateMovie {
    pub fn into_patch(self) -> MoviePatch {
        MoviePatch {
            title: self.title,
            genre: self.genre,
            rating: self.rating,
            added_by: self.added_by,
            year: self.year,
            overview: self.overview,
            poster_url: self.poster_url,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub email: String,
    pub name: Option<String>,
    pub photo_url: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchlistAdd {
    pub user_email: String,
    pub movie_id: String,
}

/// Non-numeric `minRating` / `maxRating` values are rejected by the Query
/// extractor with a 400 rather than silently ignored.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovieListQuery {
    pub genres: Option<String>,
    pub min_rating: Option<f64>,
    pub max_rating: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct MyCollectionQuery {
    pub email: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<u32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MovieAdded {
    pub message: String,
    pub movie_id: String,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub message: String,
    pub user: User,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSummary {
    pub matched_count: u64,
    pub modified_count: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteSummary {
    pub deleted_count: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    pub total_movies: i64,
    pub total_users: i64,
}
