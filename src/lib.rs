pub mod api;
pub mod entities;
pub mod error;
pub mod mailer;
pub mod middleware;
pub mod permissions;
pub mod services;
pub mod state;
