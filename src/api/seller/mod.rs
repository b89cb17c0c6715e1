pub mod book;

use axum::{middleware::from_fn_with_state, Router};

use crate::middleware::auth::{auth_middleware, AuthState};
use crate::state::AppState;

use book::seller_book_router;

pub fn seller_api_router(state: AppState) -> Router {
    Router::new()
        .merge(seller_book_router(state.clone()))
        .layer(from_fn_with_state(
            AuthState {
                db: state.db.clone(),
            },
            auth_middleware,
        ))
}
