pub mod account;
pub mod admin;
pub mod auth;
pub mod public;
pub mod seller;

use axum::{middleware::from_fn, Router};

use crate::middleware::logging::logging_middleware;
use crate::state::AppState;

use account::account_api_router;
use admin::admin_api_router;
use auth::auth_router;
use public::public_api_router;
use seller::seller_api_router;

pub fn create_api_router(state: AppState) -> Router {
    Router::new()
        .merge(auth_router(state.clone()))
        .nest("/api", public_api_router(state.clone()))
        .nest("/api/account", account_api_router(state.clone()))
        .nest("/api/seller", seller_api_router(state.clone()))
        .nest("/api/admin", admin_api_router(state))
        .layer(from_fn(logging_middleware))
}
