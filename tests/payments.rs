mod common;

use common::{create_author, create_book, create_user, setup_db};

use rust_bookstore::entities::{order, payment};
use rust_bookstore::error::ApiError;
use rust_bookstore::services::orders::{self, NewOrderItem};
use rust_bookstore::services::payments::{self, NewPayment};

async fn order_for(
    db: &sea_orm::DatabaseConnection,
    buyer: &rust_bookstore::entities::user::Model,
    isbn: &str,
) -> order::Model {
    let author = create_author(db, "A. Author").await;
    let book = create_book(db, author.id, "T", "100", isbn).await;
    orders::create_order(
        db,
        buyer,
        vec![NewOrderItem {
            book_id: book.id,
            quantity: 2,
        }],
    )
    .await
    .expect("Failed to create order")
}

#[tokio::test]
async fn successful_payment_marks_order_paid() {
    let db = setup_db().await;
    let buyer = create_user(&db, "buyer", "buyer@example.com", false, false).await;
    let placed = order_for(&db, &buyer, "1111111111111").await;
    assert_eq!(placed.status, order::Status::Pending);
    assert!(!placed.is_paid);

    let paid = payments::record_payment(
        &db,
        &buyer,
        NewPayment {
            order_id: placed.id,
            payment_method: "card".to_string(),
            transaction_id: "txn-1".to_string(),
            status: payment::Status::Success,
        },
    )
    .await
    .expect("Failed to record payment");
    assert!(paid.paid_at.is_some());

    let (reloaded, _) = orders::get_order(&db, &buyer, placed.id)
        .await
        .expect("Failed to fetch order");
    assert_eq!(reloaded.status, order::Status::Paid);
    assert!(reloaded.is_paid);
}

#[tokio::test]
async fn pending_and_failed_payments_leave_order_untouched() {
    let db = setup_db().await;
    let buyer = create_user(&db, "buyer", "buyer@example.com", false, false).await;
    let placed = order_for(&db, &buyer, "2222222222222").await;

    let recorded = payments::record_payment(
        &db,
        &buyer,
        NewPayment {
            order_id: placed.id,
            payment_method: "card".to_string(),
            transaction_id: "txn-2".to_string(),
            status: payment::Status::Pending,
        },
    )
    .await
    .expect("Failed to record payment");
    assert!(recorded.paid_at.is_none());

    let (reloaded, _) = orders::get_order(&db, &buyer, placed.id)
        .await
        .expect("Failed to fetch order");
    assert_eq!(reloaded.status, order::Status::Pending);
    assert!(!reloaded.is_paid);

    payments::set_status(&db, &buyer, recorded.id, payment::Status::Failed)
        .await
        .expect("Failed to update payment");

    let (reloaded, _) = orders::get_order(&db, &buyer, placed.id)
        .await
        .expect("Failed to fetch order");
    assert_eq!(reloaded.status, order::Status::Pending);
    assert!(!reloaded.is_paid);
}

#[tokio::test]
async fn pending_payment_turning_successful_marks_order_paid() {
    let db = setup_db().await;
    let buyer = create_user(&db, "buyer", "buyer@example.com", false, false).await;
    let placed = order_for(&db, &buyer, "3333333333333").await;

    let recorded = payments::record_payment(
        &db,
        &buyer,
        NewPayment {
            order_id: placed.id,
            payment_method: "card".to_string(),
            transaction_id: "txn-3".to_string(),
            status: payment::Status::Pending,
        },
    )
    .await
    .expect("Failed to record payment");

    let updated = payments::set_status(&db, &buyer, recorded.id, payment::Status::Success)
        .await
        .expect("Failed to update payment");
    assert!(updated.paid_at.is_some());

    let (reloaded, _) = orders::get_order(&db, &buyer, placed.id)
        .await
        .expect("Failed to fetch order");
    assert_eq!(reloaded.status, order::Status::Paid);
    assert!(reloaded.is_paid);
}

#[tokio::test]
async fn later_failure_does_not_revert_a_paid_order() {
    let db = setup_db().await;
    let buyer = create_user(&db, "buyer", "buyer@example.com", false, false).await;
    let placed = order_for(&db, &buyer, "4444444444444").await;

    let recorded = payments::record_payment(
        &db,
        &buyer,
        NewPayment {
            order_id: placed.id,
            payment_method: "card".to_string(),
            transaction_id: "txn-4".to_string(),
            status: payment::Status::Success,
        },
    )
    .await
    .expect("Failed to record payment");

    payments::set_status(&db, &buyer, recorded.id, payment::Status::Failed)
        .await
        .expect("Failed to update payment");

    // Forward-only transition: the order stays paid.
    let (reloaded, _) = orders::get_order(&db, &buyer, placed.id)
        .await
        .expect("Failed to fetch order");
    assert_eq!(reloaded.status, order::Status::Paid);
    assert!(reloaded.is_paid);
}

#[tokio::test]
async fn one_payment_per_order() {
    let db = setup_db().await;
    let buyer = create_user(&db, "buyer", "buyer@example.com", false, false).await;
    let placed = order_for(&db, &buyer, "5555555555555").await;

    payments::record_payment(
        &db,
        &buyer,
        NewPayment {
            order_id: placed.id,
            payment_method: "card".to_string(),
            transaction_id: "txn-5".to_string(),
            status: payment::Status::Pending,
        },
    )
    .await
    .expect("Failed to record payment");

    let duplicate = payments::record_payment(
        &db,
        &buyer,
        NewPayment {
            order_id: placed.id,
            payment_method: "cash".to_string(),
            transaction_id: "txn-6".to_string(),
            status: payment::Status::Pending,
        },
    )
    .await;
    assert!(matches!(duplicate, Err(ApiError::Conflict(_))));
}

#[tokio::test]
async fn transaction_ids_are_unique() {
    let db = setup_db().await;
    let buyer = create_user(&db, "buyer", "buyer@example.com", false, false).await;
    let first = order_for(&db, &buyer, "6666666666666").await;
    let second = order_for(&db, &buyer, "7777777777777").await;

    payments::record_payment(
        &db,
        &buyer,
        NewPayment {
            order_id: first.id,
            payment_method: "card".to_string(),
            transaction_id: "txn-7".to_string(),
            status: payment::Status::Pending,
        },
    )
    .await
    .expect("Failed to record payment");

    let duplicate = payments::record_payment(
        &db,
        &buyer,
        NewPayment {
            order_id: second.id,
            payment_method: "card".to_string(),
            transaction_id: "txn-7".to_string(),
            status: payment::Status::Pending,
        },
    )
    .await;
    assert!(matches!(duplicate, Err(ApiError::Conflict(_))));
}

#[tokio::test]
async fn only_owner_or_staff_see_a_payment() {
    let db = setup_db().await;
    let buyer = create_user(&db, "buyer", "buyer@example.com", false, false).await;
    let other = create_user(&db, "other", "other@example.com", false, false).await;
    let staff = create_user(&db, "staff", "staff@example.com", false, true).await;
    let placed = order_for(&db, &buyer, "8888888888888").await;

    let recorded = payments::record_payment(
        &db,
        &buyer,
        NewPayment {
            order_id: placed.id,
            payment_method: "card".to_string(),
            transaction_id: "txn-8".to_string(),
            status: payment::Status::Pending,
        },
    )
    .await
    .expect("Failed to record payment");

    let denied = payments::get_payment(&db, &other, recorded.id).await;
    assert!(matches!(denied, Err(ApiError::Permission(_))));

    payments::get_payment(&db, &staff, recorded.id)
        .await
        .expect("Staff should see any payment");

    assert!(payments::list_payments(&db, &other)
        .await
        .expect("Failed to list payments")
        .is_empty());
    assert_eq!(
        payments::list_payments(&db, &buyer)
            .await
            .expect("Failed to list payments")
            .len(),
        1
    );
}
