use async_trait::async_trait;

use super::model::*;

#[async_trait]
pub trait MovieRepo: Send + Sync {
    async fn list_movies(&self, filter: &MovieFilter) -> DbResult<Vec<Movie>>;
    async fn top_rated(&self, limit: u32) -> DbResult<Vec<Movie>>;
    async fn recently_added(&self, limit: u32) -> DbResult<Vec<Movie>>;
    async fn get_movie(&self, id: &str) -> DbResult<Movie>;
    async fn insert_movie(&self, movie: &Movie) -> DbResult<()>;
    /// Returns the number of matched rows.
    async fn update_movie(&self, id: &str, patch: &MoviePatch) -> DbResult<u64>;
    /// Returns the number of deleted rows (0 when the id is unknown).
    async fn delete_movie(&self, id: &str) -> DbResult<u64>;
    async fn count_movies(&self) -> DbResult<i64>;
}

#[async_trait]
pub trait UserRepo: Send + Sync {
    async fn list_users(&self) -> DbResult<Vec<User>>;
    async fn get_user_by_email(&self, email: &str) -> DbResult<User>;
    async fn insert_user(&self, user: &User) -> DbResult<UserInsert>;
    async fn count_users(&self) -> DbResult<i64>;
}

#[async_trait]
pub trait WatchlistRepo: Send + Sync {
    /// Fails with `DbError::AlreadyExists` when the (userEmail, movieId)
    /// pair is already present.
    async fn add_watchlist_entry(&self, entry: &WatchlistEntry) -> DbResult<()>;
    async fn list_watchlist(&self, user_email: &str) -> DbResult<Vec<WatchlistEntry>>;
}

pub trait Repository: MovieRepo + UserRepo + WatchlistRepo + Send + Sync {
    fn close(&self);
}
