use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use uuid::Uuid;

use super::types::*;
use crate::db::{User, UserInsert, UserRepo};
use crate::error::ApiError;
use crate::server::AppState;

pub async fn list_users(State(state): State<AppState>) -> Result<Json<Vec<User>>, ApiError> {
    let users = state.db.list_users().await?;
    Ok(Json(users))
}

pub async fn get_user(
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> Result<Json<User>, ApiError> {
    let user = state.db.get_user_by_email(&email).await?;
    Ok(Json(user))
}

pub async fn create_user(
    State(state): State<AppState>,
    Json(body): Json<NewUser>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    if !body.email.contains('@') {
        return Err(ApiError::bad_request("Invalid email address"));
    }

    let user = User {
        id: Uuid::new_v4().to_string(),
        email: body.email,
        name: body.name,
        photo_url: body.photo_url,
        created_at: Some(Utc::now()),
    };

    match state.db.insert_user(&user).await? {
        UserInsert::Created(user) => Ok((
            StatusCode::CREATED,
            Json(UserResponse {
                message: "User created successfully".to_string(),
                user,
            }),
        )),
        UserInsert::Exists(user) => Ok((
            StatusCode::OK,
            Json(UserResponse {
                message: "User already exists".to_string(),
                user,
            }),
        )),
    }
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;
    use tower::ServiceExt;

    use crate::server::testing::*;

    #[tokio::test]
    async fn duplicate_email_returns_original_record() {
        let app = test_app().await;

        let res = app
            .clone()
            .oneshot(post_json(
                "/users",
                json!({"email": "a@b.com", "name": "Alice"}),
            ))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::CREATED);
        let body = body_json(res).await;
        assert_eq!(body["message"], "User created successfully");
        let first_id = body["user"]["id"].as_str().unwrap().to_string();

        let res = app
            .clone()
            .oneshot(post_json(
                "/users",
                json!({"email": "a@b.com", "name": "Impostor"}),
            ))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let body = body_json(res).await;
        assert_eq!(body["message"], "User already exists");
        assert_eq!(body["user"]["id"], first_id.as_str());
        assert_eq!(body["user"]["name"], "Alice");

        let res = app.oneshot(get("/users")).await.unwrap();
        let body = body_json(res).await;
        assert_eq!(body.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn lookup_by_email() {
        let app = test_app().await;

        app.clone()
            .oneshot(post_json("/users", json!({"email": "a@b.com"})))
            .await
            .unwrap();

        let res = app.clone().oneshot(get("/users/a@b.com")).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let body = body_json(res).await;
        assert_eq!(body["email"], "a@b.com");

        let res = app.oneshot(get("/users/nobody@b.com")).await.unwrap();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn invalid_email_is_rejected() {
        let app = test_app().await;
        let res = app
            .oneshot(post_json("/users", json!({"email": "not-an-email"})))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }
}
