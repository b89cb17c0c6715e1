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

use crate::entities::category::{self, Entity as CategoryEntity};
use crate::entities::user;
use crate::error::ApiError;
use crate::permissions::{authorize, Action};
use crate::services::catalog::{conflict_or_db, slugify};
use crate::state::AppState;

pub fn admin_category_router(state: AppState) -> Router {
    Router::new()
        .route("/category", post(create_category))
        .route("/category/:id", patch(patch_category).delete(delete_category))
        .layer(Extension(state))
}

async fn create_category(
    Extension(state): Extension<AppState>,
    Extension(actor): Extension<user::Model>,
    Json(payload): Json<CreateCategory>,
) -> Result<impl IntoResponse, ApiError> {
    authorize(&actor, Action::ManageCatalog)?;

    if payload.name.trim().is_empty() {
        return Err(ApiError::Validation("Name must not be empty".to_string()));
    }

    let slug = payload.slug.unwrap_or_else(|| slugify(&payload.name));

    let new_category = category::ActiveModel {
        name: Set(payload.name),
        slug: Set(slug),
        ..Default::default()
    };

    let created = new_category
        .insert(&*state.db)
        .await
        .map_err(|err| conflict_or_db(err, "Category with this name or slug already exists"))?;

    Ok((StatusCode::CREATED, Json(created)))
}

async fn patch_category(
    Path(id): Path<i32>,
    Extension(state): Extension<AppState>,
    Extension(actor): Extension<user::Model>,
    Json(payload): Json<PatchCategory>,
) -> Result<impl IntoResponse, ApiError> {
    authorize(&actor, Action::ManageCatalog)?;

    let existing = CategoryEntity::find_by_id(id)
        .one(&*state.db)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("No category with id {} was found", id)))?;

    let mut active: category::ActiveModel = existing.into();
    if let Some(name) = payload.name {
        active.slug = Set(slugify(&name));
        active.name = Set(name);
    }
    if let Some(slug) = payload.slug {
        active.slug = Set(slug);
    }

    let updated = active
        .update(&*state.db)
        .await
        .map_err(|err| conflict_or_db(err, "Category with this name or slug already exists"))?;

    Ok((StatusCode::OK, Json(updated)))
}

async fn delete_category(
    Path(id): Path<i32>,
    Extension(state): Extension<AppState>,
    Extension(actor): Extension<user::Model>,
) -> Result<impl IntoResponse, ApiError> {
    authorize(&actor, Action::ManageCatalog)?;

    let existing = CategoryEntity::find_by_id(id)
        .one(&*state.db)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("No category with id {} was found", id)))?;

    let active: category::ActiveModel = existing.into();
    active.delete(&*state.db).await?;

    Ok((
        StatusCode::OK,
        Json(json!({
            "message": "Category deleted successfully"
        })),
    ))
}

#[derive(Deserialize)]
struct CreateCategory {
    name: String,
    slug: Option<String>,
}

#[derive(Deserialize)]
struct PatchCategory {
    name: Option<String>,
    slug: Option<String>,
}
