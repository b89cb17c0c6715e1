use sea_orm::{Database, DatabaseConnection};
use std::sync::Arc;

use rust_bookstore::api::create_api_router;
use rust_bookstore::entities::{primary_setup, setup_schema};
use rust_bookstore::mailer::{LogMailer, MailConfig, Mailer, SmtpMailer};
use rust_bookstore::state::AppState;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    dotenvy::dotenv().ok();

    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let db: DatabaseConnection = Database::connect(&database_url)
        .await
        .expect("Failed to connect to the database");
    setup_schema(&db).await;

    let shared_db = Arc::new(db);
    primary_setup(shared_db.clone()).await;

    let mailer: Arc<dyn Mailer> = match MailConfig::from_env() {
        Some(config) => Arc::new(
            SmtpMailer::new(config).expect("Failed to build SMTP transport from configuration"),
        ),
        None => {
            tracing::warn!("SMTP_HOST not set, new book notifications will only be logged");
            Arc::new(LogMailer)
        }
    };

    let state = AppState::new(shared_db, mailer);
    let app = create_api_router(state);

    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .expect("Failed to bind listener");
    tracing::info!("Running at {:?}", listener);
    axum::serve(listener, app).await.expect("Server error");
}
