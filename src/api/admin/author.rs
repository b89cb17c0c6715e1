use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{patch, post},
    Json, Router,
};
use sea_orm::{ActiveModelTrait, EntityTrait, Set};
use serde::Deserialize;
use serde_json::json;

use crate::entities::author::{self, Entity as AuthorEntity};
use crate::entities::user;
use crate::error::ApiError;
use crate::permissions::{authorize, Action};
use crate::state::AppState;

pub fn admin_author_router(state: AppState) -> Router {
    Router::new()
        .route("/author", post(create_author))
        .route("/author/:id", patch(patch_author).delete(delete_author))
        .layer(Extension(state))
}

async fn create_author(
    Extension(state): Extension<AppState>,
    Extension(actor): Extension<user::Model>,
    Json(payload): Json<CreateAuthor>,
) -> Result<impl IntoResponse, ApiError> {
    authorize(&actor, Action::ManageCatalog)?;

    if payload.full_name.trim().is_empty() {
        return Err(ApiError::Validation(
            "Full name must not be empty".to_string(),
        ));
    }

    let new_author = author::ActiveModel {
        full_name: Set(payload.full_name),
        biography: Set(payload.biography),
        birth_date: Set(payload.birth_date),
        ..Default::default()
    };

    let created = new_author.insert(&*state.db).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn patch_author(
    Path(id): Path<i32>,
    Extension(state): Extension<AppState>,
    Extension(actor): Extension<user::Model>,
    Json(payload): Json<PatchAuthor>,
) -> Result<impl IntoResponse, ApiError> {
    authorize(&actor, Action::ManageCatalog)?;

    let existing = AuthorEntity::find_by_id(id)
        .one(&*state.db)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("No author with id {} was found", id)))?;

    let mut active: author::ActiveModel = existing.into();
    if let Some(full_name) = payload.full_name {
        active.full_name = Set(full_name);
    }
    if let Some(biography) = payload.biography {
        active.biography = Set(Some(biography));
    }
    if let Some(birth_date) = payload.birth_date {
        active.birth_date = Set(Some(birth_date));
    }

    let updated = active.update(&*state.db).await?;
    Ok((StatusCode::OK, Json(updated)))
}

async fn delete_author(
    Path(id): Path<i32>,
    Extension(state): Extension<AppState>,
    Extension(actor): Extension<user::Model>,
) -> Result<impl IntoResponse, ApiError> {
    authorize(&actor, Action::ManageCatalog)?;

    let existing = AuthorEntity::find_by_id(id)
        .one(&*state.db)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("No author with id {} was found", id)))?;

    let active: author::ActiveModel = existing.into();
    active.delete(&*state.db).await?;

    Ok((
        StatusCode::OK,
        Json(json!({
            "message": "Author deleted successfully"
        })),
    ))
}

#[derive(Deserialize)]
struct CreateAuthor {
    full_name: String,
    biography: Option<String>,
    birth_date: Option<chrono::NaiveDate>,
}

#[derive(Deserialize)]
struct PatchAuthor {
    full_name: Option<String>,
    biography: Option<String>,
    birth_date: Option<chrono::NaiveDate>,
}
