use chrono::Utc;
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, Set, TransactionTrait,
};

use crate::entities::{author, book, category, order_item, review};
use crate::error::ApiError;
use crate::mailer::Mailer;
use crate::services::notify;

static ISBN_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{13}$").unwrap());

pub struct NewBook {
    pub title: String,
    pub author_id: i32,
    pub category_id: Option<i32>,
    pub description: String,
    pub price: Decimal,
    pub stock: i32,
    pub isbn: String,
    pub published_date: Option<chrono::NaiveDate>,
}

pub struct BookPatch {
    pub title: Option<String>,
    pub author_id: Option<i32>,
    pub category_id: Option<Option<i32>>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub stock: Option<i32>,
    pub isbn: Option<String>,
    pub published_date: Option<chrono::NaiveDate>,
}

/// Derives a URL slug from a category name when none was supplied.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut last_was_dash = true;
    for ch in name.chars() {
        if ch.is_alphanumeric() {
            slug.extend(ch.to_lowercase());
            last_was_dash = false;
        } else if !last_was_dash {
            slug.push('-');
            last_was_dash = true;
        }
    }
    slug.trim_end_matches('-').to_string()
}

fn validate_isbn(isbn: &str) -> Result<(), ApiError> {
    if ISBN_REGEX.is_match(isbn) {
        Ok(())
    } else {
        Err(ApiError::Validation(
            "ISBN must be a 13-digit number".to_string(),
        ))
    }
}

fn validate_price(price: Decimal) -> Result<(), ApiError> {
    if price < Decimal::ZERO {
        return Err(ApiError::Validation(
            "Price must not be negative".to_string(),
        ));
    }
    Ok(())
}

fn validate_stock(stock: i32) -> Result<(), ApiError> {
    if stock < 0 {
        return Err(ApiError::Validation(
            "Stock must not be negative".to_string(),
        ));
    }
    Ok(())
}

/// Mean of the book's review ratings, rounded to one decimal place. A book
/// with no reviews rates 0.0; this never fails on absence.
pub async fn average_rating<C: ConnectionTrait>(conn: &C, book_id: i32) -> Result<f64, DbErr> {
    let reviews = review::Entity::find()
        .filter(review::Column::BookId.eq(book_id))
        .all(conn)
        .await?;

    if reviews.is_empty() {
        return Ok(0.0);
    }

    let sum: f64 = reviews.iter().map(|r| r.rating as f64).sum();
    let mean = sum / reviews.len() as f64;
    Ok((mean * 10.0).round() / 10.0)
}

/// Creates a book and fires the new-book notification. The notification is
/// sent only after the insert committed and its outcome never affects the
/// returned result.
pub async fn create_book(
    db: &DatabaseConnection,
    mailer: &dyn Mailer,
    payload: NewBook,
) -> Result<book::Model, ApiError> {
    validate_isbn(&payload.isbn)?;
    validate_price(payload.price)?;
    validate_stock(payload.stock)?;

    let txn = db.begin().await?;

    let book_author = author::Entity::find_by_id(payload.author_id)
        .one(&txn)
        .await?
        .ok_or_else(|| {
            ApiError::NotFound(format!("No author with id {} was found", payload.author_id))
        })?;

    if let Some(category_id) = payload.category_id {
        category::Entity::find_by_id(category_id)
            .one(&txn)
            .await?
            .ok_or_else(|| {
                ApiError::NotFound(format!("No category with id {} was found", category_id))
            })?;
    }

    let new_book = book::ActiveModel {
        title: Set(payload.title),
        author_id: Set(payload.author_id),
        category_id: Set(payload.category_id),
        description: Set(payload.description),
        price: Set(payload.price),
        stock: Set(payload.stock),
        isbn: Set(payload.isbn),
        published_date: Set(payload.published_date),
        created_at: Set(Utc::now()),
        ..Default::default()
    };

    let created = match new_book.insert(&txn).await {
        Ok(model) => model,
        Err(err) => {
            let _ = txn.rollback().await;
            return Err(conflict_or_db(err, "A book with this ISBN already exists"));
        }
    };
    txn.commit().await?;

    notify::notify_new_book(db, mailer, &created, &book_author.full_name).await;

    Ok(created)
}

pub async fn update_book(
    db: &DatabaseConnection,
    book_id: i32,
    patch: BookPatch,
) -> Result<book::Model, ApiError> {
    let txn = db.begin().await?;

    let existing = book::Entity::find_by_id(book_id)
        .one(&txn)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("No book with id {} was found", book_id)))?;

    let mut active: book::ActiveModel = existing.into();

    if let Some(title) = patch.title {
        active.title = Set(title);
    }
    if let Some(author_id) = patch.author_id {
        author::Entity::find_by_id(author_id)
            .one(&txn)
            .await?
            .ok_or_else(|| {
                ApiError::NotFound(format!("No author with id {} was found", author_id))
            })?;
        active.author_id = Set(author_id);
    }
    if let Some(category_id) = patch.category_id {
        if let Some(id) = category_id {
            category::Entity::find_by_id(id)
                .one(&txn)
                .await?
                .ok_or_else(|| ApiError::NotFound(format!("No category with id {} was found", id)))?;
        }
        active.category_id = Set(category_id);
    }
    if let Some(description) = patch.description {
        active.description = Set(description);
    }
    if let Some(price) = patch.price {
        validate_price(price)?;
        active.price = Set(price);
    }
    if let Some(stock) = patch.stock {
        validate_stock(stock)?;
        active.stock = Set(stock);
    }
    if let Some(isbn) = patch.isbn {
        validate_isbn(&isbn)?;
        active.isbn = Set(isbn);
    }
    if let Some(published_date) = patch.published_date {
        active.published_date = Set(Some(published_date));
    }

    let updated = match active.update(&txn).await {
        Ok(model) => model,
        Err(err) => {
            let _ = txn.rollback().await;
            return Err(conflict_or_db(err, "A book with this ISBN already exists"));
        }
    };
    txn.commit().await?;

    Ok(updated)
}

/// Deletes a book while preserving order history: line items that reference
/// it keep their snapshot price and lose only the book reference.
pub async fn delete_book(db: &DatabaseConnection, book_id: i32) -> Result<(), ApiError> {
    let txn = db.begin().await?;

    let existing = book::Entity::find_by_id(book_id)
        .one(&txn)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("No book with id {} was found", book_id)))?;

    order_item::Entity::update_many()
        .col_expr(order_item::Column::BookId, sea_orm::sea_query::Expr::value(sea_orm::Value::Int(None)))
        .filter(order_item::Column::BookId.eq(book_id))
        .exec(&txn)
        .await?;

    let active: book::ActiveModel = existing.into();
    active.delete(&txn).await?;

    txn.commit().await?;
    Ok(())
}

pub(crate) fn conflict_or_db(err: DbErr, conflict_message: &str) -> ApiError {
    match err.sql_err() {
        Some(sea_orm::SqlErr::UniqueConstraintViolation(_)) => {
            ApiError::Conflict(conflict_message.to_string())
        }
        _ => ApiError::Database(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugify_lowercases_and_dashes() {
        assert_eq!(slugify("Science Fiction"), "science-fiction");
        assert_eq!(slugify("  Poetry &  Drama "), "poetry-drama");
        assert_eq!(slugify("O'zbek adabiyoti"), "o-zbek-adabiyoti");
    }

    #[test]
    fn isbn_must_be_thirteen_digits() {
        assert!(validate_isbn("1234567890123").is_ok());
        assert!(validate_isbn("123456789012").is_err());
        assert!(validate_isbn("12345678901234").is_err());
        assert!(validate_isbn("12345678901ab").is_err());
    }
}
