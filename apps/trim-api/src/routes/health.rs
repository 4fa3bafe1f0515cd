//! Health check endpoint

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use std::sync::Arc;

use crate::services::health_service::{HealthReport, HealthService, ServingStatus};
use crate::state::AppState;

/// GET /health
pub async fn health_check(State(state): State<Arc<AppState>>) -> (StatusCode, Json<HealthReport>) {
    let report = HealthService::new(state).check().await;
    let status = match report.status {
        ServingStatus::Serving => StatusCode::OK,
        ServingStatus::NotServing => StatusCode::SERVICE_UNAVAILABLE,
    };
    (status, Json(report))
}

#[cfg(test)]
mod tests {
    use crate::routes::testing::send;
    use crate::state::testing::state;
    use axum::http::{Method, StatusCode};

    #[tokio::test]
    async fn test_health() {
        let app = crate::app(state().await);
        let (status, body) = send(&app, Method::GET, "/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["database"], "SERVING");
    }
}
