pub mod order;
pub mod payment;
pub mod profile;
pub mod review;

use axum::{middleware::from_fn_with_state, Router};

use crate::middleware::auth::{auth_middleware, AuthState};
use crate::state::AppState;

use order::order_router;
use payment::payment_router;
use profile::profile_router;
use review::review_router;

pub fn account_api_router(state: AppState) -> Router {
    Router::new()
        .merge(profile_router(state.clone()))
        .merge(review_router(state.clone()))
        .merge(order_router(state.clone()))
        .merge(payment_router(state.clone()))
        .layer(from_fn_with_state(
            AuthState {
                db: state.db.clone(),
            },
            auth_middleware,
        ))
}
