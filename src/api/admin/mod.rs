pub mod author;
pub mod category;
pub mod user;

use axum::{middleware::from_fn_with_state, Router};

use crate::middleware::auth::{auth_middleware, AuthState};
use crate::state::AppState;

use author::admin_author_router;
use category::admin_category_router;
use user::admin_user_router;

pub fn admin_api_router(state: AppState) -> Router {
    let admin_category_router = admin_category_router(state.clone());
    let admin_author_router = admin_author_router(state.clone());
    let admin_user_router = admin_user_router(state.clone());

    Router::new()
        .merge(admin_category_router)
        .merge(admin_author_router)
        .merge(admin_user_router)
        .layer(from_fn_with_state(
            AuthState {
                db: state.db.clone(),
            },
            auth_middleware,
        ))
}
