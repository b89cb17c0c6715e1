use axum::{
    extract::Extension, http::StatusCode, response::IntoResponse, routing::get, Json, Router,
};
use sea_orm::{ActiveModelTrait, Set};
use serde::Deserialize;
use serde_json::json;

use crate::entities::user;
use crate::error::ApiError;
use crate::services::catalog::conflict_or_db;
use crate::state::AppState;

pub fn profile_router(state: AppState) -> Router {
    Router::new()
        .route("/profile", get(get_profile).patch(patch_profile))
        .layer(Extension(state))
}

async fn get_profile(Extension(actor): Extension<user::Model>) -> impl IntoResponse {
    (StatusCode::OK, Json(actor))
}

async fn patch_profile(
    Extension(state): Extension<AppState>,
    Extension(actor): Extension<user::Model>,
    Json(payload): Json<PatchProfile>,
) -> Result<impl IntoResponse, ApiError> {
    let mut active: user::ActiveModel = actor.into();

    if let Some(username) = payload.username {
        active.username = Set(username);
    }
    if let Some(phone_number) = payload.phone_number {
        active.phone_number = Set(Some(phone_number));
    }

    active
        .update(&*state.db)
        .await
        .map_err(|err| conflict_or_db(err, "Username already exists"))?;

    Ok((
        StatusCode::OK,
        Json(json!({
            "message": "Profile patched successfully"
        })),
    ))
}

#[derive(Deserialize)]
struct PatchProfile {
    username: Option<String>,
    phone_number: Option<String>,
}
