use async_trait::async_trait;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, Database, DatabaseConnection, Set};
use std::sync::Arc;
use tokio::sync::Mutex;

use rust_bookstore::entities::{author, book, setup_schema, user};
use rust_bookstore::mailer::{MailError, Mailer};
use rust_bookstore::middleware::auth::hash_password;

pub const TEST_PASSWORD: &str = "Secret15!";

/// Fresh in-memory database with the full schema. A single pooled
/// connection keeps the memory database alive for the whole test.
pub async fn setup_db() -> Arc<DatabaseConnection> {
    std::env::set_var("SECRET", "test-secret-key");

    let mut options = sea_orm::ConnectOptions::new("sqlite::memory:".to_owned());
    options.max_connections(1);

    let db = Database::connect(options)
        .await
        .expect("Failed to open in-memory database");
    setup_schema(&db).await;
    Arc::new(db)
}

pub async fn create_user(
    db: &DatabaseConnection,
    username: &str,
    email: &str,
    is_seller: bool,
    is_staff: bool,
) -> user::Model {
    let new_user = user::ActiveModel {
        username: Set(username.to_owned()),
        email: Set(email.to_owned()),
        password: Set(hash_password(TEST_PASSWORD).expect("Failed to hash password")),
        phone_number: Set(None),
        is_seller: Set(is_seller),
        is_staff: Set(is_staff),
        ..Default::default()
    };
    new_user.insert(db).await.expect("Failed to insert user")
}

pub async fn create_author(db: &DatabaseConnection, full_name: &str) -> author::Model {
    let new_author = author::ActiveModel {
        full_name: Set(full_name.to_owned()),
        biography: Set(None),
        birth_date: Set(None),
        ..Default::default()
    };
    new_author.insert(db).await.expect("Failed to insert author")
}

pub async fn create_book(
    db: &DatabaseConnection,
    author_id: i32,
    title: &str,
    price: &str,
    isbn: &str,
) -> book::Model {
    let new_book = book::ActiveModel {
        title: Set(title.to_owned()),
        author_id: Set(author_id),
        category_id: Set(None),
        description: Set(String::new()),
        price: Set(price.parse::<Decimal>().expect("Invalid price literal")),
        stock: Set(10),
        isbn: Set(isbn.to_owned()),
        published_date: Set(None),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    };
    new_book.insert(db).await.expect("Failed to insert book")
}

pub fn dec(value: &str) -> Decimal {
    value.parse().expect("Invalid decimal literal")
}

/// Captures outgoing mail instead of sending it.
#[derive(Default)]
pub struct RecordingMailer {
    pub sent: Mutex<Vec<SentMail>>,
}

pub struct SentMail {
    pub subject: String,
    pub body: String,
    pub recipients: Vec<String>,
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(
        &self,
        subject: &str,
        body: &str,
        recipients: &[String],
    ) -> Result<(), MailError> {
        self.sent.lock().await.push(SentMail {
            subject: subject.to_owned(),
            body: body.to_owned(),
            recipients: recipients.to_vec(),
        });
        Ok(())
    }
}

/// Always fails, standing in for an unreachable mail server.
pub struct FailingMailer;

#[async_trait]
impl Mailer for FailingMailer {
    async fn send(&self, _: &str, _: &str, _: &[String]) -> Result<(), MailError> {
        Err(MailError::Transport("connection refused".to_string()))
    }
}
