use sea_orm::{ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter};
use std::collections::BTreeSet;

use crate::entities::{book, user};
use crate::mailer::Mailer;

/// Sends the new-book announcement to every seller and staff account with an
/// email address. Fire-and-forget: any failure is logged as a warning and
/// never reaches the caller, so book creation cannot fail on mail transport.
pub async fn notify_new_book(
    db: &DatabaseConnection,
    mailer: &dyn Mailer,
    book: &book::Model,
    author_name: &str,
) {
    let recipients = match collect_recipients(db).await {
        Ok(recipients) => recipients,
        Err(err) => {
            tracing::warn!(error = %err, "Failed to load notification recipients");
            return;
        }
    };

    if recipients.is_empty() {
        return;
    }

    let subject = "New book added to the store";
    let body = format!(
        "A new book has just been added to the store:\n\n\
         Title: {}\n\
         Author: {}\n\
         Price: {}\n\n\
         Visit the bookstore to see it now!",
        book.title, author_name, book.price
    );

    if let Err(err) = mailer.send(subject, &body, &recipients).await {
        tracing::warn!(
            error = %err,
            book_id = book.id,
            "Failed to send new book notification"
        );
    } else {
        tracing::info!(
            book_id = book.id,
            recipients = recipients.len(),
            "Sent new book notification"
        );
    }
}

/// De-duplicated emails of all sellers and staff, excluding empty addresses.
async fn collect_recipients(db: &DatabaseConnection) -> Result<Vec<String>, sea_orm::DbErr> {
    let users = user::Entity::find()
        .filter(
            Condition::any()
                .add(user::Column::IsSeller.eq(true))
                .add(user::Column::IsStaff.eq(true)),
        )
        .all(db)
        .await?;

    let unique: BTreeSet<String> = users
        .into_iter()
        .map(|u| u.email)
        .filter(|email| !email.is_empty())
        .collect();

    Ok(unique.into_iter().collect())
}
