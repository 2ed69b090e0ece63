use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use tracing::info;

use super::model::*;
use super::repo::*;

const MOVIE_COLS: &str = "id, title, genre, rating, added_by, year, overview, poster_url, created";

type MovieRow = (
    String,
    String,
    String,
    Option<f64>,
    Option<String>,
    Option<i32>,
    Option<String>,
    Option<String>,
    Option<String>,
);

pub struct SqliteRepository {
    pool: SqlitePool,
}

impl SqliteRepository {
    pub async fn new(db_path: &str) -> DbResult<Self> {
        let options = SqliteConnectOptions::from_str(db_path)?.create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        let repo = Self { pool };
        repo.init_schema().await?;

        info!("Database initialized at {}", db_path);

        Ok(repo)
    }

    /// Private in-memory database, used by the test suites. A single
    /// connection, because every `:memory:` connection is its own database.
    pub async fn in_memory() -> DbResult<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;

        let repo = Self { pool };
        repo.init_schema().await?;

        Ok(repo)
    }

    async fn init_schema(&self) -> DbResult<()> {
        let schema = include_str!("schema.sql");
        sqlx::query(schema).execute(&self.pool).await?;
        Ok(())
    }
}

fn parse_timestamp(s: Option<String>) -> Option<DateTime<Utc>> {
    s.and_then(|s| {
        DateTime::parse_from_rfc3339(&s)
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
    })
}

fn movie_from_row(row: MovieRow) -> DbResult<Movie> {
    let genre: Vec<String> = serde_json::from_str(&row.2)
        .map_err(|e| DbError::Corrupt(format!("genre of movie {}: {}", row.0, e)))?;
    Ok(Movie {
        id: row.0,
        title: row.1,
        genre,
        rating: row.3,
        added_by: row.4,
        year: row.5,
        overview: row.6,
        poster_url: row.7,
        created_at: parse_timestamp(row.8),
    })
}

fn genre_json(genre: &[String]) -> DbResult<String> {
    serde_json::to_string(genre).map_err(|e| DbError::Corrupt(format!("genre encode: {}", e)))
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    e.as_database_error()
        .map(|db| db.is_unique_violation())
        .unwrap_or(false)
}

#[async_trait]
impl MovieRepo for SqliteRepository {
    async fn list_movies(&self, filter: &MovieFilter) -> DbResult<Vec<Movie>> {
        let mut sql = format!("SELECT {} FROM movies", MOVIE_COLS);

        let mut clauses = Vec::new();
        if filter.min_rating.is_some() {
            clauses.push("rating >= ?");
        }
        if filter.max_rating.is_some() {
            clauses.push("rating <= ?");
        }
        if filter.added_by.is_some() {
            clauses.push("added_by = ?");
        }
        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }
        sql.push_str(" ORDER BY seq");

        let mut query = sqlx::query_as::<_, MovieRow>(&sql);
        if let Some(min) = filter.min_rating {
            query = query.bind(min);
        }
        if let Some(max) = filter.max_rating {
            query = query.bind(max);
        }
        if let Some(ref added_by) = filter.added_by {
            query = query.bind(added_by);
        }

        let rows = query.fetch_all(&self.pool).await?;

        // Genre membership is checked here rather than in SQL; the genre
        // column holds a JSON list.
        let mut movies = Vec::new();
        for row in rows {
            let movie = movie_from_row(row)?;
            if filter.matches_genres(&movie.genre) {
                movies.push(movie);
            }
        }
        Ok(movies)
    }

    async fn top_rated(&self, limit: u32) -> DbResult<Vec<Movie>> {
        let rows = sqlx::query_as::<_, MovieRow>(&format!(
            "SELECT {} FROM movies ORDER BY rating DESC LIMIT ?",
            MOVIE_COLS
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(movie_from_row).collect()
    }

    async fn recently_added(&self, limit: u32) -> DbResult<Vec<Movie>> {
        let rows = sqlx::query_as::<_, MovieRow>(&format!(
            "SELECT {} FROM movies ORDER BY seq DESC LIMIT ?",
            MOVIE_COLS
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(movie_from_row).collect()
    }

    async fn get_movie(&self, id: &str) -> DbResult<Movie> {
        let row = sqlx::query_as::<_, MovieRow>(&format!(
            "SELECT {} FROM movies WHERE id = ?",
            MOVIE_COLS
        ))
        .bind(id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => DbError::NotFound(format!("Movie not found: {}", id)),
            _ => DbError::Sqlx(e),
        })?;

        movie_from_row(row)
    }

    async fn insert_movie(&self, movie: &Movie) -> DbResult<()> {
        sqlx::query(
            "INSERT INTO movies
            (id, title, genre, rating, added_by, year, overview, poster_url, created)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&movie.id)
        .bind(&movie.title)
        .bind(genre_json(&movie.genre)?)
        .bind(movie.rating)
        .bind(&movie.added_by)
        .bind(movie.year)
        .bind(&movie.overview)
        .bind(&movie.poster_url)
        .bind(movie.created_at.as_ref().map(|dt| dt.to_rfc3339()))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn update_movie(&self, id: &str, patch: &MoviePatch) -> DbResult<u64> {
        let genre = match patch.genre {
            Some(ref g) => Some(genre_json(g)?),
            None => None,
        };

        let result = sqlx::query(
            "UPDATE movies SET
                title = COALESCE(?, title),
                genre = COALESCE(?, genre),
                rating = COALESCE(?, rating),
                added_by = COALESCE(?, added_by),
                year = COALESCE(?, year),
                overview = COALESCE(?, overview),
                poster_url = COALESCE(?, poster_url)
            WHERE id = ?",
        )
        .bind(&patch.title)
        .bind(genre)
        .bind(patch.rating)
        .bind(&patch.added_by)
        .bind(patch.year)
        .bind(&patch.overview)
        .bind(&patch.poster_url)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn delete_movie(&self, id: &str) -> DbResult<u64> {
        let result = sqlx::query("DELETE FROM movies WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn count_movies(&self) -> DbResult<i64> {
        let row = sqlx::query_as::<_, (i64,)>("SELECT COUNT(*) FROM movies")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.0)
    }
}

#[async_trait]
impl UserRepo for SqliteRepository {
    async fn list_users(&self) -> DbResult<Vec<User>> {
        let rows = sqlx::query_as::<_, (String, String, Option<String>, Option<String>, Option<String>)>(
            "SELECT id, email, name, photo_url, created FROM users ORDER BY seq",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| User {
                id: r.0,
                email: r.1,
                name: r.2,
                photo_url: r.3,
                created_at: parse_timestamp(r.4),
            })
            .collect())
    }

    async fn get_user_by_email(&self, email: &str) -> DbResult<User> {
        let row = sqlx::query_as::<_, (String, String, Option<String>, Option<String>, Option<String>)>(
            "SELECT id, email, name, photo_url, created FROM users WHERE email = ?",
        )
        .bind(email)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => DbError::NotFound(format!("User not found: {}", email)),
            _ => DbError::Sqlx(e),
        })?;

        Ok(User {
            id: row.0,
            email: row.1,
            name: row.2,
            photo_url: row.3,
            created_at: parse_timestamp(row.4),
        })
    }

    async fn insert_user(&self, user: &User) -> DbResult<UserInsert> {
        // The UNIQUE index on email is the source of truth for duplicates;
        // no separate existence check, so concurrent inserts cannot race.
        let result = sqlx::query(
            "INSERT INTO users (id, email, name, photo_url, created)
             VALUES (?, ?, ?, ?, ?)
             ON CONFLICT (email) DO NOTHING",
        )
        .bind(&user.id)
        .bind(&user.email)
        .bind(&user.name)
        .bind(&user.photo_url)
        .bind(user.created_at.as_ref().map(|dt| dt.to_rfc3339()))
        .execute(&self.pool)
        .await?;

        let stored = self.get_user_by_email(&user.email).await?;
        if result.rows_affected() == 0 {
            Ok(UserInsert::Exists(stored))
        } else {
            Ok(UserInsert::Created(stored))
        }
    }

    async fn count_users(&self) -> DbResult<i64> {
        let row = sqlx::query_as::<_, (i64,)>("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.0)
    }
}

#[async_trait]
impl WatchlistRepo for SqliteRepository {
    async fn add_watchlist_entry(&self, entry: &WatchlistEntry) -> DbResult<()> {
        sqlx::query(
            "INSERT INTO watchlist (id, user_email, movie_id, created) VALUES (?, ?, ?, ?)",
        )
        .bind(&entry.id)
        .bind(&entry.user_email)
        .bind(&entry.movie_id)
        .bind(entry.created_at.as_ref().map(|dt| dt.to_rfc3339()))
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                DbError::AlreadyExists(format!(
                    "watch-list entry {}/{}",
                    entry.user_email, entry.movie_id
                ))
            } else {
                DbError::Sqlx(e)
            }
        })?;
        Ok(())
    }

    async fn list_watchlist(&self, user_email: &str) -> DbResult<Vec<WatchlistEntry>> {
        let rows = sqlx::query_as::<_, (String, String, String, Option<String>)>(
            "SELECT id, user_email, movie_id, created FROM watchlist
             WHERE user_email = ? ORDER BY seq",
        )
        .bind(user_email)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| WatchlistEntry {
                id: r.0,
                user_email: r.1,
                movie_id: r.2,
                created_at: parse_timestamp(r.3),
            })
            .collect())
    }
}

impl Repository for SqliteRepository {
    fn close(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn movie(title: &str, rating: Option<f64>, genres: &[&str]) -> Movie {
        Movie {
            id: Uuid::new_v4().to_string(),
            title: title.to_string(),
            genre: genres.iter().map(|g| g.to_string()).collect(),
            rating,
            added_by: None,
            year: None,
            overview: None,
            poster_url: None,
            created_at: Some(Utc::now()),
        }
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let repo = SqliteRepository::in_memory().await.unwrap();
        let m = movie("Heat", Some(8.3), &["Crime"]);
        repo.insert_movie(&m).await.unwrap();

        assert_eq!(repo.delete_movie(&m.id).await.unwrap(), 1);
        assert_eq!(repo.delete_movie(&m.id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn duplicate_user_returns_existing_record() {
        let repo = SqliteRepository::in_memory().await.unwrap();
        let first = User {
            id: Uuid::new_v4().to_string(),
            email: "a@b.com".to_string(),
            name: Some("A".to_string()),
            photo_url: None,
            created_at: Some(Utc::now()),
        };
        let second = User {
            id: Uuid::new_v4().to_string(),
            name: Some("B".to_string()),
            ..first.clone()
        };

        let created = repo.insert_user(&first).await.unwrap();
        assert!(matches!(created, UserInsert::Created(_)));

        match repo.insert_user(&second).await.unwrap() {
            UserInsert::Exists(stored) => {
                assert_eq!(stored.id, first.id);
                assert_eq!(stored.name.as_deref(), Some("A"));
            }
            UserInsert::Created(_) => panic!("duplicate email must not create a second record"),
        }

        assert_eq!(repo.count_users().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn duplicate_watchlist_pair_is_rejected() {
        let repo = SqliteRepository::in_memory().await.unwrap();
        let entry = WatchlistEntry {
            id: Uuid::new_v4().to_string(),
            user_email: "a@b.com".to_string(),
            movie_id: "m1".to_string(),
            created_at: Some(Utc::now()),
        };
        repo.add_watchlist_entry(&entry).await.unwrap();

        let dup = WatchlistEntry {
            id: Uuid::new_v4().to_string(),
            ..entry.clone()
        };
        let err = repo.add_watchlist_entry(&dup).await.unwrap_err();
        assert!(matches!(err, DbError::AlreadyExists(_)));
    }

    #[tokio::test]
    async fn rating_and_genre_filters() {
        let repo = SqliteRepository::in_memory().await.unwrap();
        repo.insert_movie(&movie("m3", Some(3.0), &["A"])).await.unwrap();
        repo.insert_movie(&movie("m5", Some(5.0), &["B"])).await.unwrap();
        repo.insert_movie(&movie("m7", Some(7.0), &["A"])).await.unwrap();
        repo.insert_movie(&movie("m9", Some(9.0), &["C"])).await.unwrap();

        let filter = MovieFilter {
            min_rating: Some(5.0),
            max_rating: Some(8.0),
            ..Default::default()
        };
        let hits = repo.list_movies(&filter).await.unwrap();
        let titles: Vec<&str> = hits.iter().map(|m| m.title.as_str()).collect();
        assert_eq!(titles, vec!["m5", "m7"]);

        let filter = MovieFilter {
            genres: vec!["A".to_string(), "B".to_string()],
            ..Default::default()
        };
        let hits = repo.list_movies(&filter).await.unwrap();
        let titles: Vec<&str> = hits.iter().map(|m| m.title.as_str()).collect();
        assert_eq!(titles, vec!["m3", "m5", "m7"]);
    }

    #[tokio::test]
    async fn top_rated_and_recent_ordering() {
        let repo = SqliteRepository::in_memory().await.unwrap();
        repo.insert_movie(&movie("low", Some(3.0), &[])).await.unwrap();
        repo.insert_movie(&movie("high", Some(9.0), &[])).await.unwrap();
        repo.insert_movie(&movie("mid", Some(6.0), &[])).await.unwrap();

        let top = repo.top_rated(2).await.unwrap();
        let titles: Vec<&str> = top.iter().map(|m| m.title.as_str()).collect();
        assert_eq!(titles, vec!["high", "mid"]);

        let recent = repo.recently_added(2).await.unwrap();
        let titles: Vec<&str> = recent.iter().map(|m| m.title.as_str()).collect();
        assert_eq!(titles, vec!["mid", "high"]);
    }

    #[tokio::test]
    async fn patch_overwrites_only_present_fields() {
        let repo = SqliteRepository::in_memory().await.unwrap();
        let m = movie("Alien", Some(8.0), &["Horror"]);
        repo.insert_movie(&m).await.unwrap();

        let patch = MoviePatch {
            rating: Some(9.0),
            ..Default::default()
        };
        assert_eq!(repo.update_movie(&m.id, &patch).await.unwrap(), 1);

        let stored = repo.get_movie(&m.id).await.unwrap();
        assert_eq!(stored.rating, Some(9.0));
        assert_eq!(stored.title, "Alien");
        assert_eq!(stored.genre, vec!["Horror".to_string()]);

        assert_eq!(repo.update_movie("missing", &patch).await.unwrap(), 0);
    }
}
