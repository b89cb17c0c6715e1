use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use crate::error::ApiError;
use crate::services::reviews::{self, ReviewFilter};
use crate::state::AppState;

pub fn review_router(state: AppState) -> Router {
    Router::new()
        .route("/review", get(get_reviews))
        .route("/review/:id", get(get_review))
        .layer(Extension(state))
}

async fn get_reviews(
    Query(params): Query<ReviewsQuery>,
    Extension(state): Extension<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let filter = ReviewFilter {
        book_id: params.book,
        rating: params.rating,
        search: params.search,
        ordering: params.ordering,
    };

    let views = reviews::list_reviews(&state.db, None, filter).await?;
    Ok((StatusCode::OK, Json(views)))
}

async fn get_review(
    Path(id): Path<i32>,
    Extension(state): Extension<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let view = reviews::get_review(&state.db, None, id).await?;
    Ok((StatusCode::OK, Json(view)))
}

#[derive(Deserialize)]
struct ReviewsQuery {
    book: Option<i32>,
    rating: Option<i16>,
    search: Option<String>,
    ordering: Option<String>,
}
