//! Health check service.
//!
//! Liveness plus a database round-trip, for load balancers and uptime
//! monitors.

use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use tracing::warn;

use crate::state::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServingStatus {
    Serving,
    NotServing,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    pub status: ServingStatus,
    pub database: ServingStatus,
    pub version: &'static str,
    pub server_time: String,
}

pub struct HealthService {
    state: Arc<AppState>,
}

impl HealthService {
    pub fn new(state: Arc<AppState>) -> Self {
        HealthService { state }
    }

    pub async fn check(&self) -> HealthReport {
        let database = if self.state.db.health_check().await {
            ServingStatus::Serving
        } else {
            warn!("Database health check failed");
            ServingStatus::NotServing
        };

        HealthReport {
            // Nothing but the database can take the API down.
            status: database,
            database,
            version: env!("CARGO_PKG_VERSION"),
            server_time: Utc::now().to_rfc3339(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::testing::state;

    #[tokio::test]
    async fn test_serving_with_open_database() {
        let state = state().await;
        let report = HealthService::new(state.clone()).check().await;
        assert_eq!(report.status, ServingStatus::Serving);

        state.db.close().await;
        let report = HealthService::new(state).check().await;
        assert_eq!(report.database, ServingStatus::NotServing);
    }
}
