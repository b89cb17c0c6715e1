use crate::entities::user::{self, Entity as UserEntity};
use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use sea_orm::{DatabaseConnection, EntityTrait};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHasher, SaltString},
    Argon2,
};

/// Authenticates the bearer token and attaches the full `user::Model` to the
/// request. Role checks happen later, in `permissions::authorize`, so this
/// middleware is the same for every protected route.
pub async fn auth_middleware(
    State(state): State<AuthState>,
    mut req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let db = state.db;

    let auth_header = req
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok());

    let token = match auth_header {
        Some(header) if header.starts_with("Bearer ") => match header.strip_prefix("Bearer ") {
            Some(token) => token,
            _ => return Err(StatusCode::UNAUTHORIZED),
        },
        _ => return Err(StatusCode::UNAUTHORIZED),
    };

    let actor = match validate_token(db.clone(), token).await {
        Ok(actor) => actor,
        Err(err) => {
            tracing::debug!(error = %err, "Rejected bearer token");
            return Err(StatusCode::UNAUTHORIZED);
        }
    };

    req.extensions_mut().insert(actor);
    Ok(next.run(req).await)
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: i32,
    pub exp: usize,
}

#[derive(Clone, Debug)]
pub struct AuthState {
    pub db: Arc<DatabaseConnection>,
}

pub fn generate_token(user_id: i32) -> Result<String, AuthMiddlewareError> {
    let exp = Utc::now()
        .checked_add_signed(Duration::hours(24))
        .ok_or(AuthMiddlewareError::GenerationFail)?
        .timestamp() as usize;

    let claims = Claims { user_id, exp };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(get_secret_key().as_bytes()),
    )
    .map_err(|_| AuthMiddlewareError::GenerationFail)
}

/// Decodes the token and resolves it to a live user row. A token for a
/// deleted user is rejected.
pub async fn validate_token(
    db: Arc<DatabaseConnection>,
    token: &str,
) -> Result<user::Model, AuthMiddlewareError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;

    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(get_secret_key().as_bytes()),
        &validation,
    )
    .map_err(|_| AuthMiddlewareError::TokenExpired)?;

    match UserEntity::find_by_id(token_data.claims.user_id)
        .one(&*db)
        .await
    {
        Ok(Some(model)) => Ok(model),
        Ok(None) => Err(AuthMiddlewareError::InvalidUser),
        Err(_) => Err(AuthMiddlewareError::InternalServerError),
    }
}

pub fn hash_password(password: &str) -> Result<String, AuthMiddlewareError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthMiddlewareError::HashFail)
}

#[derive(Error, Debug)]
pub enum AuthMiddlewareError {
    #[error("Invalid user id")]
    InvalidUser,
    #[error("Token expired")]
    TokenExpired,
    #[error("Failed to validate token")]
    ValidationFail,
    #[error("Failed to generate token")]
    GenerationFail,
    #[error("Failed to hash password")]
    HashFail,
    #[error("Internal server error")]
    InternalServerError,
}

fn get_secret_key() -> String {
    dotenvy::dotenv().ok();
    std::env::var("SECRET").expect("SECRET not found in .env file")
}
