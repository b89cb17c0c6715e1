use axum::{
    extract::Extension, http::StatusCode, response::IntoResponse, routing::post, Json, Router,
};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, Set};
use serde::Deserialize;
use serde_json::json;
use validator::Validate;

use crate::entities::user::{self, Entity as UserEntity};
use crate::error::ApiError;
use crate::middleware::auth::{generate_token, hash_password};
use crate::services::catalog::conflict_or_db;
use crate::state::AppState;

pub fn auth_router(state: AppState) -> Router {
    Router::new()
        .route("/register", post(register_user))
        .route("/login", post(login))
        .layer(Extension(state))
}

async fn register_user(
    Extension(state): Extension<AppState>,
    Json(payload): Json<RegisterUser>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|err| ApiError::Validation(err.to_string()))?;

    let password = hash_password(&payload.password).map_err(|_| ApiError::Internal)?;

    let new_user = user::ActiveModel {
        username: Set(payload.username),
        email: Set(payload.email),
        password: Set(password),
        phone_number: Set(payload.phone_number),
        is_seller: Set(false),
        is_staff: Set(false),
        ..Default::default()
    };

    user::Entity::insert(new_user)
        .exec(&*state.db)
        .await
        .map_err(|err| conflict_or_db(err, "Username or email already exists"))?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "User registered successfully"
        })),
    ))
}

async fn login(
    Extension(state): Extension<AppState>,
    Json(payload): Json<UserLogin>,
) -> Result<impl IntoResponse, ApiError> {
    let result = UserEntity::find()
        .filter(user::Column::Username.eq(&*payload.username))
        .one(&*state.db)
        .await?;

    let model = match result {
        Some(model) => model,
        None => return Err(ApiError::Unauthorized),
    };

    model
        .check_hash(&payload.password)
        .map_err(|_| ApiError::Unauthorized)?;

    let token = generate_token(model.id).map_err(|_| ApiError::Internal)?;

    Ok((
        StatusCode::OK,
        Json(json!({
            "token": token
        })),
    ))
}

#[derive(Deserialize, Validate)]
struct RegisterUser {
    #[validate(length(min = 3, max = 30))]
    username: String,
    #[validate(email)]
    email: String,
    #[validate(length(min = 8))]
    password: String,
    phone_number: Option<String>,
}

#[derive(Deserialize)]
struct UserLogin {
    username: String,
    password: String,
}
