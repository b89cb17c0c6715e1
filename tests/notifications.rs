mod common;

use common::{create_author, create_user, dec, setup_db, FailingMailer, RecordingMailer};

use rust_bookstore::services::catalog::{self, NewBook};

fn sample_book(author_id: i32, isbn: &str) -> NewBook {
    NewBook {
        title: "The Left Hand of Darkness".to_string(),
        author_id,
        category_id: None,
        description: String::new(),
        price: dec("25.99"),
        stock: 5,
        isbn: isbn.to_string(),
        published_date: None,
    }
}

#[tokio::test]
async fn sellers_and_staff_get_one_mail_each() {
    let db = setup_db().await;
    let author = create_author(&db, "Ursula K. Le Guin").await;

    create_user(&db, "seller", "a@example.com", true, false).await;
    create_user(&db, "both", "b@example.com", true, true).await;
    create_user(&db, "staff", "c@example.com", false, true).await;
    create_user(&db, "buyer", "d@example.com", false, false).await;

    let mailer = RecordingMailer::default();
    let created = catalog::create_book(&db, &mailer, sample_book(author.id, "1111111111111"))
        .await
        .expect("Failed to create book");

    let sent = mailer.sent.lock().await;
    assert_eq!(sent.len(), 1);

    let mail = &sent[0];
    let mut recipients = mail.recipients.clone();
    recipients.sort();
    assert_eq!(
        recipients,
        vec!["a@example.com", "b@example.com", "c@example.com"]
    );
    assert_eq!(mail.subject, "New book added to the store");
    assert!(mail.body.contains(&created.title));
    assert!(mail.body.contains("Ursula K. Le Guin"));
    assert!(mail.body.contains("25.99"));
}

#[tokio::test]
async fn no_mail_without_sellers_or_staff() {
    let db = setup_db().await;
    let author = create_author(&db, "A. Author").await;
    create_user(&db, "buyer", "buyer@example.com", false, false).await;

    let mailer = RecordingMailer::default();
    catalog::create_book(&db, &mailer, sample_book(author.id, "2222222222222"))
        .await
        .expect("Failed to create book");

    assert!(mailer.sent.lock().await.is_empty());
}

#[tokio::test]
async fn mail_failure_does_not_fail_book_creation() {
    let db = setup_db().await;
    let author = create_author(&db, "A. Author").await;
    create_user(&db, "seller", "seller@example.com", true, false).await;

    let created = catalog::create_book(&db, &FailingMailer, sample_book(author.id, "3333333333333"))
        .await
        .expect("Book creation must survive a mail outage");
    assert_eq!(created.isbn, "3333333333333");
}
