use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use sea_orm::{ColumnTrait, Condition, EntityTrait, QueryFilter, QueryOrder};
use serde::{Deserialize, Serialize};

use crate::entities::book::{self, Entity as BookEntity};
use crate::error::ApiError;
use crate::services::catalog;
use crate::state::AppState;

pub fn book_router(state: AppState) -> Router {
    Router::new()
        .route("/book", get(get_books))
        .route("/book/:id", get(get_book))
        .layer(Extension(state))
}

async fn get_books(
    Query(params): Query<BooksQuery>,
    Extension(state): Extension<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let mut query = BookEntity::find();

    if let Some(category_id) = params.category {
        query = query.filter(book::Column::CategoryId.eq(category_id));
    }
    if let Some(author_id) = params.author {
        query = query.filter(book::Column::AuthorId.eq(author_id));
    }
    if let Some(search) = params.search {
        query = query.filter(
            Condition::any()
                .add(book::Column::Title.contains(&search))
                .add(book::Column::Description.contains(&search))
                .add(book::Column::Isbn.contains(&search)),
        );
    }

    query = match params.ordering.as_deref() {
        Some("price") => query.order_by_asc(book::Column::Price),
        Some("-price") => query.order_by_desc(book::Column::Price),
        Some("title") => query.order_by_asc(book::Column::Title),
        Some("-title") => query.order_by_desc(book::Column::Title),
        Some("-id") => query.order_by_desc(book::Column::Id),
        _ => query.order_by_asc(book::Column::Id),
    };

    let books = query.all(&*state.db).await?;

    let mut response = Vec::with_capacity(books.len());
    for model in books {
        let average_rating = catalog::average_rating(&*state.db, model.id).await?;
        response.push(BookResponse {
            book: model,
            average_rating,
        });
    }

    Ok((StatusCode::OK, Json(response)))
}

async fn get_book(
    Path(id): Path<i32>,
    Extension(state): Extension<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let result = BookEntity::find_by_id(id)
        .one(&*state.db)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("No book with id {} was found", id)))?;

    let average_rating = catalog::average_rating(&*state.db, result.id).await?;

    Ok((
        StatusCode::OK,
        Json(BookResponse {
            book: result,
            average_rating,
        }),
    ))
}

#[derive(Deserialize)]
struct BooksQuery {
    category: Option<i32>,
    author: Option<i32>,
    search: Option<String>,
    ordering: Option<String>,
}

#[derive(Serialize)]
struct BookResponse {
    #[serde(flatten)]
    book: book::Model,
    // Computed from reviews on every read, never stored.
    average_rating: f64,
}
