use axum::{
    extract::Request,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch, post},
    Router,
};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config::Config;
use crate::db::SqliteRepository;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub db: Arc<SqliteRepository>,
}

impl AppState {
    pub fn new(config: Config, db: Arc<SqliteRepository>) -> Self {
        Self {
            config: Arc::new(config),
            db,
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root_handler))
        .route(
            "/users",
            get(crate::api::users::list_users).post(crate::api::users::create_user),
        )
        .route(
            "/users/watch-list",
            post(crate::api::watchlist::add_to_watchlist),
        )
        .route(
            "/users/watch-list/:email",
            get(crate::api::watchlist::list_for_user),
        )
        .route("/users/:email", get(crate::api::users::get_user))
        .route("/movies", get(crate::api::movies::list_movies))
        .route(
            "/movies/my-collection",
            get(crate::api::movies::my_collection),
        )
        .route("/movies/top-rated", get(crate::api::movies::top_rated))
        .route("/movies/recent", get(crate::api::movies::recently_added))
        .route("/movies/add", post(crate::api::movies::add_movie))
        .route(
            "/movies/update/:id",
            patch(crate::api::movies::update_movie),
        )
        .route(
            "/movies/:id",
            get(crate::api::movies::get_movie).delete(crate::api::movies::delete_movie),
        )
        .route("/stats", get(crate::api::stats::get_stats))
        .fallback(fallback_handler)
        .layer(axum::middleware::from_fn(crate::middleware::log_request))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn root_handler() -> &'static str {
    "Movie Master is running"
}

async fn fallback_handler(req: Request<axum::body::Body>) -> impl IntoResponse {
    // CORS preflight for unmatched paths still gets its headers from the
    // CorsLayer; everything else is a 404.
    if req.method() == axum::http::Method::OPTIONS {
        return StatusCode::OK.into_response();
    }
    StatusCode::NOT_FOUND.into_response()
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Method, Request};
    use axum::response::Response;

    pub async fn test_app() -> Router {
        let db = Arc::new(SqliteRepository::in_memory().await.unwrap());
        build_router(AppState::new(Config::default(), db))
    }

    pub fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    pub fn delete(uri: &str) -> Request<Body> {
        Request::builder()
            .method(Method::DELETE)
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    pub fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    pub fn patch_json(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method(Method::PATCH)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    pub async fn body_json(res: Response) -> serde_json::Value {
        let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use tower::ServiceExt;

    use super::testing::*;

    #[tokio::test]
    async fn root_reports_liveness() {
        let app = test_app().await;
        let res = app.oneshot(get("/")).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn unknown_route_is_404() {
        let app = test_app().await;
        let res = app.oneshot(get("/nope")).await.unwrap();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }
}
