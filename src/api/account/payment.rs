use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use std::str::FromStr;

use crate::entities::{payment, user};
use crate::error::ApiError;
use crate::services::payments::{self, NewPayment};
use crate::state::AppState;

pub fn payment_router(state: AppState) -> Router {
    Router::new()
        .route("/payment", get(get_payments).post(create_payment))
        .route("/payment/:id", get(get_payment).patch(patch_payment))
        .layer(Extension(state))
}

async fn get_payments(
    Extension(state): Extension<AppState>,
    Extension(actor): Extension<user::Model>,
) -> Result<impl IntoResponse, ApiError> {
    let result = payments::list_payments(&state.db, &actor).await?;
    Ok((StatusCode::OK, Json(result)))
}

async fn create_payment(
    Extension(state): Extension<AppState>,
    Extension(actor): Extension<user::Model>,
    Json(payload): Json<CreatePayment>,
) -> Result<impl IntoResponse, ApiError> {
    let status = match payload.status.as_deref() {
        Some(raw) => payment::Status::from_str(raw).map_err(ApiError::Validation)?,
        None => payment::Status::Pending,
    };

    let created = payments::record_payment(
        &state.db,
        &actor,
        NewPayment {
            order_id: payload.order_id,
            payment_method: payload.payment_method,
            transaction_id: payload.transaction_id,
            status,
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(created)))
}

async fn get_payment(
    Path(id): Path<i32>,
    Extension(state): Extension<AppState>,
    Extension(actor): Extension<user::Model>,
) -> Result<impl IntoResponse, ApiError> {
    let result = payments::get_payment(&state.db, &actor, id).await?;
    Ok((StatusCode::OK, Json(result)))
}

async fn patch_payment(
    Path(id): Path<i32>,
    Extension(state): Extension<AppState>,
    Extension(actor): Extension<user::Model>,
    Json(payload): Json<PatchPayment>,
) -> Result<impl IntoResponse, ApiError> {
    let status = payment::Status::from_str(&payload.status).map_err(ApiError::Validation)?;
    let updated = payments::set_status(&state.db, &actor, id, status).await?;
    Ok((StatusCode::OK, Json(updated)))
}

#[derive(Deserialize)]
struct CreatePayment {
    order_id: i32,
    payment_method: String,
    transaction_id: String,
    status: Option<String>,
}

#[derive(Deserialize)]
struct PatchPayment {
    status: String,
}
