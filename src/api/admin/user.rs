use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch},
    Json, Router,
};
use sea_orm::{ActiveModelTrait, ColumnTrait, Condition, EntityTrait, QueryFilter, QueryOrder, Set};
use serde::Deserialize;

use crate::entities::user::{self, Entity as UserEntity};
use crate::error::ApiError;
use crate::permissions::{authorize, Action};
use crate::state::AppState;

pub fn admin_user_router(state: AppState) -> Router {
    Router::new()
        .route("/user", get(get_users))
        .route("/user/:id", patch(patch_user))
        .layer(Extension(state))
}

async fn get_users(
    Query(params): Query<UsersQuery>,
    Extension(state): Extension<AppState>,
    Extension(actor): Extension<user::Model>,
) -> Result<impl IntoResponse, ApiError> {
    authorize(&actor, Action::ManageCatalog)?;

    let mut query = UserEntity::find().order_by_asc(user::Column::Username);

    if let Some(search) = params.search {
        query = query.filter(
            Condition::any()
                .add(user::Column::Username.contains(&search))
                .add(user::Column::Email.contains(&search)),
        );
    }

    let users = query.all(&*state.db).await?;
    Ok((StatusCode::OK, Json(users)))
}

/// Staff can grant or revoke the seller/staff flags.
async fn patch_user(
    Path(id): Path<i32>,
    Extension(state): Extension<AppState>,
    Extension(actor): Extension<user::Model>,
    Json(payload): Json<PatchUser>,
) -> Result<impl IntoResponse, ApiError> {
    authorize(&actor, Action::ManageCatalog)?;

    let existing = UserEntity::find_by_id(id)
        .one(&*state.db)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("No user with id {} was found", id)))?;

    let mut active: user::ActiveModel = existing.into();
    if let Some(is_seller) = payload.is_seller {
        active.is_seller = Set(is_seller);
    }
    if let Some(is_staff) = payload.is_staff {
        active.is_staff = Set(is_staff);
    }

    let updated = active.update(&*state.db).await?;
    Ok((StatusCode::OK, Json(updated)))
}

#[derive(Deserialize)]
struct UsersQuery {
    search: Option<String>,
}

#[derive(Deserialize)]
struct PatchUser {
    is_seller: Option<bool>,
    is_staff: Option<bool>,
}
