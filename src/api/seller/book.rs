use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{patch, post},
    Json, Router,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;

use crate::entities::user;
use crate::error::ApiError;
use crate::permissions::{authorize, Action};
use crate::services::catalog::{self, BookPatch, NewBook};
use crate::state::AppState;

pub fn seller_book_router(state: AppState) -> Router {
    Router::new()
        .route("/book", post(create_book))
        .route("/book/:id", patch(patch_book).delete(delete_book))
        .layer(Extension(state))
}

async fn create_book(
    Extension(state): Extension<AppState>,
    Extension(actor): Extension<user::Model>,
    Json(payload): Json<CreateBook>,
) -> Result<impl IntoResponse, ApiError> {
    authorize(&actor, Action::PublishBook)?;

    let created = catalog::create_book(
        &state.db,
        &*state.mailer,
        NewBook {
            title: payload.title,
            author_id: payload.author_id,
            category_id: payload.category_id,
            description: payload.description.unwrap_or_default(),
            price: payload.price,
            stock: payload.stock.unwrap_or(0),
            isbn: payload.isbn,
            published_date: payload.published_date,
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(created)))
}

async fn patch_book(
    Path(id): Path<i32>,
    Extension(state): Extension<AppState>,
    Extension(actor): Extension<user::Model>,
    Json(payload): Json<PatchBook>,
) -> Result<impl IntoResponse, ApiError> {
    authorize(&actor, Action::PublishBook)?;

    let updated = catalog::update_book(
        &state.db,
        id,
        BookPatch {
            title: payload.title,
            author_id: payload.author_id,
            category_id: payload.category_id,
            description: payload.description,
            price: payload.price,
            stock: payload.stock,
            isbn: payload.isbn,
            published_date: payload.published_date,
        },
    )
    .await?;

    Ok((StatusCode::OK, Json(updated)))
}

async fn delete_book(
    Path(id): Path<i32>,
    Extension(state): Extension<AppState>,
    Extension(actor): Extension<user::Model>,
) -> Result<impl IntoResponse, ApiError> {
    authorize(&actor, Action::PublishBook)?;

    catalog::delete_book(&state.db, id).await?;
    Ok((
        StatusCode::OK,
        Json(json!({
            "message": "Book deleted successfully"
        })),
    ))
}

#[derive(Deserialize)]
struct CreateBook {
    title: String,
    author_id: i32,
    category_id: Option<i32>,
    description: Option<String>,
    price: Decimal,
    stock: Option<i32>,
    isbn: String,
    published_date: Option<chrono::NaiveDate>,
}

// `category_id` distinguishes "leave unchanged" (absent) from "clear"
// (explicit null) with a double Option.
#[derive(Deserialize)]
struct PatchBook {
    title: Option<String>,
    author_id: Option<i32>,
    #[serde(default, deserialize_with = "double_option")]
    category_id: Option<Option<i32>>,
    description: Option<String>,
    price: Option<Decimal>,
    stock: Option<i32>,
    isbn: Option<String>,
    published_date: Option<chrono::NaiveDate>,
}

fn double_option<'de, D>(deserializer: D) -> Result<Option<Option<i32>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Option::<i32>::deserialize(deserializer).map(Some)
}
