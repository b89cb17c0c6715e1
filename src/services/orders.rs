use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};

use crate::entities::{book, order, order_item, user};
use crate::error::ApiError;
use crate::permissions::{authorize, sees_all_orders, Action};

pub struct NewOrderItem {
    pub book_id: i32,
    pub quantity: i32,
}

#[derive(Default)]
pub struct OrderFilter {
    pub status: Option<order::Status>,
    pub is_paid: Option<bool>,
}

fn validate_quantity(quantity: i32) -> Result<(), ApiError> {
    if quantity < 1 {
        return Err(ApiError::Validation(
            "Quantity must be at least 1".to_string(),
        ));
    }
    Ok(())
}

/// Recomputes the order total as the sum of price x quantity over the full
/// current item set and persists it. Always runs inside the transaction of
/// the item mutation that triggered it, so a reader who observes the
/// mutation also observes the new total. Computing from the full set (never
/// incrementally) makes repeated invocation idempotent.
pub async fn recompute_total<C: ConnectionTrait>(
    conn: &C,
    order_id: i32,
) -> Result<Decimal, ApiError> {
    let existing = order::Entity::find_by_id(order_id)
        .one(conn)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("No order with id {} was found", order_id)))?;

    let items = order_item::Entity::find()
        .filter(order_item::Column::OrderId.eq(order_id))
        .all(conn)
        .await?;

    let total: Decimal = items
        .iter()
        .map(|item| item.price * Decimal::from(item.quantity))
        .sum();

    let mut active: order::ActiveModel = existing.into();
    active.total_amount = Set(total);
    active.update(conn).await?;

    Ok(total)
}

/// Creates an order together with its initial items; the total is computed
/// before the transaction commits. Each item snapshots the book's current
/// price, so later catalog price changes do not affect it.
pub async fn create_order(
    db: &DatabaseConnection,
    actor: &user::Model,
    items: Vec<NewOrderItem>,
) -> Result<order::Model, ApiError> {
    for item in &items {
        validate_quantity(item.quantity)?;
    }

    let txn = db.begin().await?;

    let new_order = order::ActiveModel {
        user_id: Set(actor.id),
        is_paid: Set(false),
        total_amount: Set(Decimal::ZERO),
        status: Set(order::Status::Pending),
        created_at: Set(Utc::now()),
        ..Default::default()
    };
    let created = new_order.insert(&txn).await?;

    for item in items {
        insert_item(&txn, created.id, item).await?;
    }

    recompute_total(&txn, created.id).await?;

    let created = order::Entity::find_by_id(created.id)
        .one(&txn)
        .await?
        .ok_or(ApiError::Internal)?;

    txn.commit().await?;
    Ok(created)
}

async fn insert_item<C: ConnectionTrait>(
    conn: &C,
    order_id: i32,
    item: NewOrderItem,
) -> Result<order_item::Model, ApiError> {
    let book = book::Entity::find_by_id(item.book_id)
        .one(conn)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("No book with id {} was found", item.book_id)))?;

    let new_item = order_item::ActiveModel {
        order_id: Set(order_id),
        book_id: Set(Some(book.id)),
        quantity: Set(item.quantity),
        price: Set(book.price),
        ..Default::default()
    };

    Ok(new_item.insert(conn).await?)
}

/// Adds a line item to an existing order and recomputes the total in the
/// same transaction.
pub async fn add_item(
    db: &DatabaseConnection,
    actor: &user::Model,
    order_id: i32,
    item: NewOrderItem,
) -> Result<order_item::Model, ApiError> {
    validate_quantity(item.quantity)?;

    let txn = db.begin().await?;

    let existing = order::Entity::find_by_id(order_id)
        .one(&txn)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("No order with id {} was found", order_id)))?;
    authorize(
        actor,
        Action::AccessOwned {
            owner_id: existing.user_id,
        },
    )?;

    let created = insert_item(&txn, order_id, item).await?;
    recompute_total(&txn, order_id).await?;

    txn.commit().await?;
    Ok(created)
}

pub async fn update_item(
    db: &DatabaseConnection,
    actor: &user::Model,
    item_id: i32,
    quantity: i32,
) -> Result<order_item::Model, ApiError> {
    validate_quantity(quantity)?;

    let txn = db.begin().await?;

    let (item, parent) = find_item_with_order(&txn, item_id).await?;
    authorize(
        actor,
        Action::AccessOwned {
            owner_id: parent.user_id,
        },
    )?;

    let mut active: order_item::ActiveModel = item.into();
    active.quantity = Set(quantity);
    let updated = active.update(&txn).await?;

    recompute_total(&txn, parent.id).await?;

    txn.commit().await?;
    Ok(updated)
}

/// Removes a line item; deleting the last one resets the total to zero.
pub async fn delete_item(
    db: &DatabaseConnection,
    actor: &user::Model,
    item_id: i32,
) -> Result<(), ApiError> {
    let txn = db.begin().await?;

    let (item, parent) = find_item_with_order(&txn, item_id).await?;
    authorize(
        actor,
        Action::AccessOwned {
            owner_id: parent.user_id,
        },
    )?;

    let active: order_item::ActiveModel = item.into();
    active.delete(&txn).await?;

    recompute_total(&txn, parent.id).await?;

    txn.commit().await?;
    Ok(())
}

async fn find_item_with_order<C: ConnectionTrait>(
    conn: &C,
    item_id: i32,
) -> Result<(order_item::Model, order::Model), ApiError> {
    let item = order_item::Entity::find_by_id(item_id)
        .one(conn)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("No order item with id {} was found", item_id)))?;

    let parent = order::Entity::find_by_id(item.order_id)
        .one(conn)
        .await?
        .ok_or(ApiError::Internal)?;

    Ok((item, parent))
}

pub async fn get_order(
    db: &DatabaseConnection,
    actor: &user::Model,
    order_id: i32,
) -> Result<(order::Model, Vec<order_item::Model>), ApiError> {
    let existing = order::Entity::find_by_id(order_id)
        .one(db)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("No order with id {} was found", order_id)))?;

    if !sees_all_orders(actor) && existing.user_id != actor.id {
        return Err(ApiError::Permission(format!(
            "User {} is not allowed to view this order",
            actor.id
        )));
    }

    let items = order_item::Entity::find()
        .filter(order_item::Column::OrderId.eq(order_id))
        .all(db)
        .await?;

    Ok((existing, items))
}

pub async fn list_orders(
    db: &DatabaseConnection,
    actor: &user::Model,
    filter: OrderFilter,
) -> Result<Vec<order::Model>, ApiError> {
    let mut query = order::Entity::find().order_by_desc(order::Column::CreatedAt);

    if !sees_all_orders(actor) {
        query = query.filter(order::Column::UserId.eq(actor.id));
    }
    if let Some(status) = filter.status {
        query = query.filter(order::Column::Status.eq(status));
    }
    if let Some(is_paid) = filter.is_paid {
        query = query.filter(order::Column::IsPaid.eq(is_paid));
    }

    Ok(query.all(db).await?)
}
