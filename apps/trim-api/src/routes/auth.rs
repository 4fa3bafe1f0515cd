//! Registration and login endpoints

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use std::sync::Arc;

use crate::error::ApiResult;
use crate::extract::ApiJson;
use crate::services::auth_service::{AuthResponse, AuthService, LoginRequest, RegisterRequest};
use crate::state::AppState;

/// POST /api/auth/register
pub async fn register(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<AuthResponse>)> {
    let response = AuthService::new(state).register(&req).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> ApiResult<Json<AuthResponse>> {
    Ok(Json(AuthService::new(state).login(&req).await?))
}

/// POST /api/auth/employee-login
pub async fn employee_login(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> ApiResult<Json<AuthResponse>> {
    Ok(Json(AuthService::new(state).employee_login(&req).await?))
}

#[cfg(test)]
mod tests {
    use crate::routes::testing::{owner, send};
    use crate::state::testing::state;
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    #[tokio::test]
    async fn test_register_and_login_over_http() {
        let app = crate::app(state().await);
        let (_, business_id) = owner(&app, "owner@fade.test").await;

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": "owner@fade.test", "password": "password123" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["businessId"], business_id.as_str());
        assert_eq!(body["role"], "owner");
        assert_eq!(body["tokenType"], "Bearer");

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": "owner@fade.test", "password": "wrong-password" })),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["code"], "UNAUTHORIZED");
    }
}
