//! Notification service: admin mailboxes and user-change fan-out
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod models;
pub mod repository;
pub mod services;
pub mod websocket;

pub use config::Config;
pub use error::{AppError, Result};
pub use services::AppState;
pub use websocket::{ConnectionManager, WebSocketMessage};
