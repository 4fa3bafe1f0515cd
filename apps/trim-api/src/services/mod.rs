//! Service layer.
//!
//! Operations that span several repositories or collaborators. Handlers
//! with a single repository call go straight to `trim-db`.

pub mod auth_service;
pub mod booking_service;
pub mod health_service;
pub mod invoice_service;
