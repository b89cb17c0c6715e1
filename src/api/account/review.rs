use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{patch, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use crate::entities::{review_reaction::ReactionKind, user};
use crate::error::ApiError;
use crate::services::reviews::{self, NewReview};
use crate::state::AppState;

pub fn review_router(state: AppState) -> Router {
    Router::new()
        .route("/review", post(create_review))
        .route("/review/:id", patch(patch_review).delete(delete_review))
        .route("/review/:id/like", post(toggle_like))
        .route("/review/:id/dislike", post(toggle_dislike))
        .layer(Extension(state))
}

async fn create_review(
    Extension(state): Extension<AppState>,
    Extension(actor): Extension<user::Model>,
    Json(payload): Json<CreateReview>,
) -> Result<impl IntoResponse, ApiError> {
    let created = reviews::create_review(
        &state.db,
        &actor,
        NewReview {
            book_id: payload.book_id,
            rating: payload.rating,
            comment: payload.comment.unwrap_or_default(),
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(created)))
}

async fn patch_review(
    Path(id): Path<i32>,
    Extension(state): Extension<AppState>,
    Extension(actor): Extension<user::Model>,
    Json(payload): Json<PatchReview>,
) -> Result<impl IntoResponse, ApiError> {
    let updated =
        reviews::update_review(&state.db, &actor, id, payload.rating, payload.comment).await?;
    Ok((StatusCode::OK, Json(updated)))
}

async fn delete_review(
    Path(id): Path<i32>,
    Extension(state): Extension<AppState>,
    Extension(actor): Extension<user::Model>,
) -> Result<impl IntoResponse, ApiError> {
    reviews::delete_review(&state.db, &actor, id).await?;
    Ok((
        StatusCode::OK,
        Json(json!({
            "message": "Review deleted successfully"
        })),
    ))
}

async fn toggle_like(
    Path(id): Path<i32>,
    Extension(state): Extension<AppState>,
    Extension(actor): Extension<user::Model>,
) -> Result<impl IntoResponse, ApiError> {
    let liked = reviews::toggle_reaction(&state.db, &actor, id, ReactionKind::Like).await?;
    Ok((
        StatusCode::OK,
        Json(json!({
            "liked": liked
        })),
    ))
}

async fn toggle_dislike(
    Path(id): Path<i32>,
    Extension(state): Extension<AppState>,
    Extension(actor): Extension<user::Model>,
) -> Result<impl IntoResponse, ApiError> {
    let disliked = reviews::toggle_reaction(&state.db, &actor, id, ReactionKind::Dislike).await?;
    Ok((
        StatusCode::OK,
        Json(json!({
            "disliked": disliked
        })),
    ))
}

#[derive(Deserialize)]
struct CreateReview {
    book_id: i32,
    rating: i16,
    comment: Option<String>,
}

#[derive(Deserialize)]
struct PatchReview {
    rating: Option<i16>,
    comment: Option<String>,
}
