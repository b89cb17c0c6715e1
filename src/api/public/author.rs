use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use sea_orm::{ColumnTrait, Condition, EntityTrait, QueryFilter, QueryOrder};
use serde::Deserialize;

use crate::entities::author::{self, Entity as AuthorEntity};
use crate::error::ApiError;
use crate::state::AppState;

pub fn author_router(state: AppState) -> Router {
    Router::new()
        .route("/author", get(get_authors))
        .route("/author/:id", get(get_author))
        .layer(Extension(state))
}

async fn get_authors(
    Query(params): Query<AuthorsQuery>,
    Extension(state): Extension<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let mut query = AuthorEntity::find().order_by_asc(author::Column::FullName);

    if let Some(search) = params.search {
        query = query.filter(
            Condition::any()
                .add(author::Column::FullName.contains(&search))
                .add(author::Column::Biography.contains(&search)),
        );
    }

    let authors = query.all(&*state.db).await?;
    Ok((StatusCode::OK, Json(authors)))
}

async fn get_author(
    Path(id): Path<i32>,
    Extension(state): Extension<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let result = AuthorEntity::find_by_id(id)
        .one(&*state.db)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("No author with id {} was found", id)))?;

    Ok((StatusCode::OK, Json(result)))
}

#[derive(Deserialize)]
struct AuthorsQuery {
    search: Option<String>,
}
