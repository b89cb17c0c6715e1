pub mod author;
pub mod book;
pub mod category;
pub mod order;
pub mod order_item;
pub mod payment;
pub mod review;
pub mod review_reaction;
pub mod user;

use sea_orm::sea_query::Index;
use sea_orm::{ConnectionTrait, DatabaseConnection, EntityTrait, PaginatorTrait, Set};
use std::sync::Arc;

use crate::entities::{
    author::Entity as Author, book::Entity as Book, category::Entity as Category,
    order::Entity as Order, order_item::Entity as OrderItem, payment::Entity as Payment,
    review::Entity as Review, review_reaction::Entity as ReviewReaction, user::Entity as User,
};
use crate::middleware::auth::hash_password;

pub async fn setup_schema(db: &DatabaseConnection) {
    let schema = sea_orm::Schema::new(db.get_database_backend());
    let create_user_table = schema.create_table_from_entity(User);
    let create_category_table = schema.create_table_from_entity(Category);
    let create_author_table = schema.create_table_from_entity(Author);
    let create_book_table = schema.create_table_from_entity(Book);
    let create_review_table = schema.create_table_from_entity(Review);
    let create_reaction_table = schema.create_table_from_entity(ReviewReaction);
    let create_order_table = schema.create_table_from_entity(Order);
    let create_order_item_table = schema.create_table_from_entity(OrderItem);
    let create_payment_table = schema.create_table_from_entity(Payment);

    db.execute(db.get_database_backend().build(&create_user_table))
        .await
        .expect("Failed to create users schema");
    db.execute(db.get_database_backend().build(&create_category_table))
        .await
        .expect("Failed to create categories schema");
    db.execute(db.get_database_backend().build(&create_author_table))
        .await
        .expect("Failed to create authors schema");
    db.execute(db.get_database_backend().build(&create_book_table))
        .await
        .expect("Failed to create books schema");
    db.execute(db.get_database_backend().build(&create_review_table))
        .await
        .expect("Failed to create reviews schema");
    db.execute(db.get_database_backend().build(&create_reaction_table))
        .await
        .expect("Failed to create review_reactions schema");
    db.execute(db.get_database_backend().build(&create_order_table))
        .await
        .expect("Failed to create orders schema");
    db.execute(db.get_database_backend().build(&create_order_item_table))
        .await
        .expect("Failed to create order_items schema");
    db.execute(db.get_database_backend().build(&create_payment_table))
        .await
        .expect("Failed to create payments schema");

    // One review per (user, book); a user appears at most once per reaction
    // set of a review.
    let review_identity_index = Index::create()
        .name("idx_reviews_user_book")
        .table(Review)
        .col(review::Column::UserId)
        .col(review::Column::BookId)
        .unique()
        .to_owned();
    db.execute(db.get_database_backend().build(&review_identity_index))
        .await
        .expect("Failed to create review identity index");

    let reaction_identity_index = Index::create()
        .name("idx_review_reactions_identity")
        .table(ReviewReaction)
        .col(review_reaction::Column::ReviewId)
        .col(review_reaction::Column::UserId)
        .col(review_reaction::Column::Kind)
        .unique()
        .to_owned();
    db.execute(db.get_database_backend().build(&reaction_identity_index))
        .await
        .expect("Failed to create review reaction identity index");
}

/// Seeds the initial staff account on an empty database.
pub async fn primary_setup(db: Arc<DatabaseConnection>) {
    let existing = User::find()
        .count(&*db)
        .await
        .expect("Failed to count users during primary setup");
    if existing > 0 {
        return;
    }

    let admin_password =
        std::env::var("ADMIN_PASSWORD").expect("ADMIN_PASSWORD not found in .env file");
    let admin_email =
        std::env::var("ADMIN_EMAIL").unwrap_or_else(|_| "admin@bookstore.local".to_string());
    let password_hash =
        hash_password(&admin_password).expect("Failed to hash admin password during setup");

    let new_admin = user::ActiveModel {
        username: Set("admin".to_owned()),
        email: Set(admin_email),
        password: Set(password_hash),
        phone_number: Set(None),
        is_seller: Set(false),
        is_staff: Set(true),
        ..Default::default()
    };

    user::Entity::insert(new_admin)
        .exec(&*db)
        .await
        .expect("Failed to seed admin user, but primary setup was requested");
}
