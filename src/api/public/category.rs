use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder};
use serde::Deserialize;

use crate::entities::category::{self, Entity as CategoryEntity};
use crate::error::ApiError;
use crate::state::AppState;

pub fn category_router(state: AppState) -> Router {
    Router::new()
        .route("/category", get(get_categories))
        .route("/category/:id", get(get_category))
        .layer(Extension(state))
}

async fn get_categories(
    Query(params): Query<CategoriesQuery>,
    Extension(state): Extension<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let mut query = CategoryEntity::find().order_by_asc(category::Column::Name);

    if let Some(search) = params.search {
        query = query.filter(category::Column::Name.contains(&search));
    }

    let categories = query.all(&*state.db).await?;
    Ok((StatusCode::OK, Json(categories)))
}

async fn get_category(
    Path(id): Path<i32>,
    Extension(state): Extension<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let result = CategoryEntity::find_by_id(id)
        .one(&*state.db)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("No category with id {} was found", id)))?;

    Ok((StatusCode::OK, Json(result)))
}

#[derive(Deserialize)]
struct CategoriesQuery {
    search: Option<String>,
}
