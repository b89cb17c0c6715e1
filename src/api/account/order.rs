use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::str::FromStr;

use crate::entities::{order, order_item, user};
use crate::error::ApiError;
use crate::services::orders::{self, NewOrderItem, OrderFilter};
use crate::state::AppState;

pub fn order_router(state: AppState) -> Router {
    Router::new()
        .route("/order", get(get_orders).post(create_order))
        .route("/order/:id", get(get_order))
        .route("/order/:id/item", post(add_item))
        .route("/item/:id", patch(patch_item).delete(delete_item))
        .layer(Extension(state))
}

async fn get_orders(
    Query(params): Query<OrdersQuery>,
    Extension(state): Extension<AppState>,
    Extension(actor): Extension<user::Model>,
) -> Result<impl IntoResponse, ApiError> {
    let status = match params.status.as_deref() {
        Some(raw) => Some(
            order::Status::from_str(raw).map_err(ApiError::Validation)?,
        ),
        None => None,
    };

    let filter = OrderFilter {
        status,
        is_paid: params.is_paid,
    };

    let result = orders::list_orders(&state.db, &actor, filter).await?;
    Ok((StatusCode::OK, Json(result)))
}

async fn create_order(
    Extension(state): Extension<AppState>,
    Extension(actor): Extension<user::Model>,
    Json(payload): Json<CreateOrder>,
) -> Result<impl IntoResponse, ApiError> {
    let items = payload
        .items
        .into_iter()
        .map(|item| NewOrderItem {
            book_id: item.book_id,
            quantity: item.quantity,
        })
        .collect();

    let created = orders::create_order(&state.db, &actor, items).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn get_order(
    Path(id): Path<i32>,
    Extension(state): Extension<AppState>,
    Extension(actor): Extension<user::Model>,
) -> Result<impl IntoResponse, ApiError> {
    let (order, items) = orders::get_order(&state.db, &actor, id).await?;
    Ok((StatusCode::OK, Json(OrderResponse { order, items })))
}

async fn add_item(
    Path(id): Path<i32>,
    Extension(state): Extension<AppState>,
    Extension(actor): Extension<user::Model>,
    Json(payload): Json<CreateOrderItem>,
) -> Result<impl IntoResponse, ApiError> {
    let created = orders::add_item(
        &state.db,
        &actor,
        id,
        NewOrderItem {
            book_id: payload.book_id,
            quantity: payload.quantity,
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(created)))
}

async fn patch_item(
    Path(id): Path<i32>,
    Extension(state): Extension<AppState>,
    Extension(actor): Extension<user::Model>,
    Json(payload): Json<PatchOrderItem>,
) -> Result<impl IntoResponse, ApiError> {
    let updated = orders::update_item(&state.db, &actor, id, payload.quantity).await?;
    Ok((StatusCode::OK, Json(updated)))
}

async fn delete_item(
    Path(id): Path<i32>,
    Extension(state): Extension<AppState>,
    Extension(actor): Extension<user::Model>,
) -> Result<impl IntoResponse, ApiError> {
    orders::delete_item(&state.db, &actor, id).await?;
    Ok((
        StatusCode::OK,
        Json(json!({
            "message": "Order item deleted successfully"
        })),
    ))
}

#[derive(Deserialize)]
struct OrdersQuery {
    status: Option<String>,
    is_paid: Option<bool>,
}

#[derive(Deserialize)]
struct CreateOrder {
    items: Vec<CreateOrderItem>,
}

#[derive(Deserialize)]
struct CreateOrderItem {
    book_id: i32,
    quantity: i32,
}

#[derive(Deserialize)]
struct PatchOrderItem {
    quantity: i32,
}

#[derive(Serialize)]
struct OrderResponse {
    #[serde(flatten)]
    order: order::Model,
    items: Vec<order_item::Model>,
}
