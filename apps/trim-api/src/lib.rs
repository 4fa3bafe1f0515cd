//! # Trim API
//!
//! REST server for salons and barbershops: business schedules, the staff
//! and service menu, public booking with slot availability, checkout
//! invoices with optional inventory tracking, and revenue reports.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                            Trim API                                     │
//! │                                                                         │
//! │  HTTP ──► TraceLayer ──► CorsLayer ──► Router (routes/*)                │
//! │                                            │                            │
//! │                          ┌─────────────────┼──────────────────┐         │
//! │                          ▼                 ▼                  ▼         │
//! │                   ┌─────────────┐  ┌───────────────┐  ┌──────────────┐  │
//! │                   │ AuthService │  │BookingService │  │InvoiceService│  │
//! │                   │ register    │  │ create        │  │ create       │  │
//! │                   │ login       │  │ available     │  │ list         │  │
//! │                   │             │  │ slots         │  │ revenue      │  │
//! │                   └──────┬──────┘  └───────┬───────┘  └──────┬───────┘  │
//! │                          │                 │                 │          │
//! │                          ▼                 ▼                 ▼          │
//! │                   ┌─────────────────────────────────────────────────┐   │
//! │                   │  trim-db (SQLite)            Notifier (email)   │   │
//! │                   └─────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration
//! Environment variables (a `.env` file is read first):
//! - `HTTP_PORT` - listen port (default: 5000)
//! - `DATABASE_PATH` - SQLite file (default: ./trim.db)
//! - `DB_MAX_CONNECTIONS` - pool size (default: 5)
//! - `JWT_SECRET` - secret for signing tokens
//! - `JWT_ACCESS_LIFETIME_SECS` - token lifetime (default: 86400)
//! - `BUSINESS_TIMEZONE` - zone for slot times (default: America/New_York)
//! - `NOTIFY_TIMEOUT_SECS` - bound on one notification attempt (default: 5)
//! - `CORS_PERMISSIVE` - allow any origin (default: true)

pub mod auth;
pub mod config;
pub mod error;
pub mod extract;
pub mod notify;
pub mod routes;
pub mod services;
pub mod state;

use axum::Router;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

// Re-exports
pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use notify::{LogNotifier, Notifier};
pub use state::AppState;

/// The complete HTTP application.
pub fn app(state: Arc<AppState>) -> Router {
    let cors = if state.config.cors_permissive {
        CorsLayer::permissive()
    } else {
        CorsLayer::new()
    };

    routes::router(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
