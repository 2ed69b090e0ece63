pub mod movies;
pub mod stats;
pub mod types;
pub mod users;
pub mod watchlist;
