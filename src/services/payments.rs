use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, JoinType,
    QueryFilter, QueryOrder, QuerySelect, RelationTrait, Set, TransactionTrait,
};

use crate::entities::{order, payment, user};
use crate::error::ApiError;
use crate::permissions::{authorize, Action};
use crate::services::catalog::conflict_or_db;

pub struct NewPayment {
    pub order_id: i32,
    pub payment_method: String,
    pub transaction_id: String,
    pub status: payment::Status,
}

/// Records a payment for an order. If it is recorded as successful, the
/// owning order is marked paid within the same transaction.
pub async fn record_payment(
    db: &DatabaseConnection,
    actor: &user::Model,
    payload: NewPayment,
) -> Result<payment::Model, ApiError> {
    if payload.transaction_id.is_empty() {
        return Err(ApiError::Validation(
            "Transaction id must not be empty".to_string(),
        ));
    }

    let txn = db.begin().await?;

    let owning_order = order::Entity::find_by_id(payload.order_id)
        .one(&txn)
        .await?
        .ok_or_else(|| {
            ApiError::NotFound(format!("No order with id {} was found", payload.order_id))
        })?;
    authorize(
        actor,
        Action::AccessOwned {
            owner_id: owning_order.user_id,
        },
    )?;

    let paid_at = match payload.status {
        payment::Status::Success => Some(Utc::now()),
        _ => None,
    };

    let new_payment = payment::ActiveModel {
        order_id: Set(payload.order_id),
        payment_method: Set(payload.payment_method),
        transaction_id: Set(payload.transaction_id),
        status: Set(payload.status),
        paid_at: Set(paid_at),
        created_at: Set(Utc::now()),
        ..Default::default()
    };

    let created = match new_payment.insert(&txn).await {
        Ok(model) => model,
        Err(err) => {
            let _ = txn.rollback().await;
            return Err(conflict_or_db(
                err,
                "This order already has a payment, or the transaction id is taken",
            ));
        }
    };

    if created.status == payment::Status::Success {
        mark_order_paid(&txn, owning_order).await?;
    }

    txn.commit().await?;
    Ok(created)
}

/// Updates a payment's status. Only the transition to `success` propagates
/// to the order; `pending` and `failed` never touch it, and there is no
/// reversal path from a paid order.
pub async fn set_status(
    db: &DatabaseConnection,
    actor: &user::Model,
    payment_id: i32,
    new_status: payment::Status,
) -> Result<payment::Model, ApiError> {
    let txn = db.begin().await?;

    let existing = payment::Entity::find_by_id(payment_id)
        .one(&txn)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("No payment with id {} was found", payment_id)))?;

    let owning_order = order::Entity::find_by_id(existing.order_id)
        .one(&txn)
        .await?
        .ok_or(ApiError::Internal)?;
    authorize(
        actor,
        Action::AccessOwned {
            owner_id: owning_order.user_id,
        },
    )?;

    let mut active: payment::ActiveModel = existing.into();
    active.status = Set(new_status);
    if new_status == payment::Status::Success {
        active.paid_at = Set(Some(Utc::now()));
    }
    let updated = active.update(&txn).await?;

    if updated.status == payment::Status::Success {
        mark_order_paid(&txn, owning_order).await?;
    }

    txn.commit().await?;
    Ok(updated)
}

async fn mark_order_paid<C: ConnectionTrait>(
    conn: &C,
    owning_order: order::Model,
) -> Result<(), ApiError> {
    let mut active: order::ActiveModel = owning_order.into();
    active.status = Set(order::Status::Paid);
    active.is_paid = Set(true);
    active.update(conn).await?;
    Ok(())
}

pub async fn get_payment(
    db: &DatabaseConnection,
    actor: &user::Model,
    payment_id: i32,
) -> Result<payment::Model, ApiError> {
    let existing = payment::Entity::find_by_id(payment_id)
        .one(db)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("No payment with id {} was found", payment_id)))?;

    let owning_order = order::Entity::find_by_id(existing.order_id)
        .one(db)
        .await?
        .ok_or(ApiError::Internal)?;
    authorize(
        actor,
        Action::AccessOwned {
            owner_id: owning_order.user_id,
        },
    )?;

    Ok(existing)
}

pub async fn list_payments(
    db: &DatabaseConnection,
    actor: &user::Model,
) -> Result<Vec<payment::Model>, ApiError> {
    let mut query = payment::Entity::find().order_by_desc(payment::Column::CreatedAt);

    if !actor.is_staff {
        query = query
            .join(JoinType::InnerJoin, payment::Relation::Order.def())
            .filter(order::Column::UserId.eq(actor.id));
    }

    Ok(query.all(db).await?)
}
