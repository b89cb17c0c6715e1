pub mod author;
pub mod book;
pub mod category;
pub mod review;

use axum::Router;

use crate::state::AppState;

use author::author_router;
use book::book_router;
use category::category_router;
use review::review_router;

pub fn public_api_router(state: AppState) -> Router {
    let category_router = category_router(state.clone());
    let author_router = author_router(state.clone());
    let book_router = book_router(state.clone());
    let review_router = review_router(state);

    Router::new()
        .merge(category_router)
        .merge(author_router)
        .merge(book_router)
        .merge(review_router)
}
