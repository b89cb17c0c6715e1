use sea_orm::DatabaseConnection;
use std::sync::Arc;

use crate::mailer::Mailer;

/// Shared state handed to every handler through an `Extension` layer.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub mailer: Arc<dyn Mailer>,
}

impl AppState {
    pub fn new(db: Arc<DatabaseConnection>, mailer: Arc<dyn Mailer>) -> Self {
        AppState { db, mailer }
    }
}
