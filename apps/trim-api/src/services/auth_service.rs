//! Authentication service.
//!
//! Owner registration and login, and employee login. Both issue the same
//! kind of access token; the role claim tells them apart.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};
use trim_core::validation::{non_blank, validate_email, validate_name, validate_password};

use crate::auth::{hash_password, verify_password, Role};
use crate::error::{ApiError, ApiResult};
use crate::notify::{deliver, Notification};
use crate::state::AppState;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RegisterRequest {
    pub business_name: Option<String>,
    /// Owner's full name.
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub token: String,
    pub token_type: &'static str,
    pub expires_in: i64,
    pub role: Role,
    /// Business id for owners, employee id for employees.
    pub subject: String,
    pub business_id: String,
    pub name: String,
}

pub struct AuthService {
    state: Arc<AppState>,
}

impl AuthService {
    pub fn new(state: Arc<AppState>) -> Self {
        AuthService { state }
    }

    /// Creates a business and signs its owner in.
    ///
    /// ## Errors
    /// * `ValidationError` - missing field, bad email, short password
    /// * `Conflict` - email already registered
    pub async fn register(&self, req: &RegisterRequest) -> ApiResult<AuthResponse> {
        let business_name = validate_name(
            &non_blank(req.business_name.as_deref(), "businessName")?,
            "businessName",
        )?;
        let owner_name = validate_name(&non_blank(req.name.as_deref(), "name")?, "name")?;
        let email = validate_email(&non_blank(req.email.as_deref(), "email")?)?;
        let password = req.password.as_deref().unwrap_or_default();
        validate_password(password)?;

        let business = self
            .state
            .db
            .businesses()
            .insert(&business_name, &owner_name, &email, &hash_password(password)?)
            .await?;

        info!(business_id = %business.id, "Business registered");

        deliver(
            self.state.notifier.as_ref(),
            self.state.config.notify_timeout,
            Notification {
                recipient: email,
                subject: "Welcome to Trim!".to_string(),
                body: format!(
                    "Hi {owner_name},\n\nYour account for {} has been created.",
                    business.name
                ),
            },
        )
        .await;

        self.issue(&business.id, &business.id, Role::Owner, owner_name)
    }

    pub async fn login(&self, req: &LoginRequest) -> ApiResult<AuthResponse> {
        let (email, password) = credentials(req)?;
        let found = self.state.db.businesses().credentials_by_email(&email).await?;

        match found {
            Some(c) if verify_password(&password, &c.password_hash) => {
                info!(business_id = %c.business.id, "Owner logged in");
                let business = c.business;
                self.issue(&business.id, &business.id, Role::Owner, business.owner_name)
            }
            _ => {
                warn!(email = %email, "Owner login rejected");
                Err(invalid_credentials())
            }
        }
    }

    pub async fn employee_login(&self, req: &LoginRequest) -> ApiResult<AuthResponse> {
        let (email, password) = credentials(req)?;
        let found = self.state.db.employees().credentials_by_email(&email).await?;

        match found {
            Some(c) if verify_password(&password, &c.password_hash) => {
                info!(employee_id = %c.employee.id, "Employee logged in");
                let employee = c.employee;
                self.issue(&employee.id, &employee.business_id, Role::Employee, employee.name)
            }
            _ => {
                warn!(email = %email, "Employee login rejected");
                Err(invalid_credentials())
            }
        }
    }

    fn issue(
        &self,
        subject: &str,
        business_id: &str,
        role: Role,
        name: String,
    ) -> ApiResult<AuthResponse> {
        let token = self
            .state
            .jwt
            .generate_access_token(subject, business_id, role)?;
        Ok(AuthResponse {
            token,
            token_type: "Bearer",
            expires_in: self.state.jwt.access_lifetime_secs(),
            role,
            subject: subject.to_string(),
            business_id: business_id.to_string(),
            name,
        })
    }
}

fn credentials(req: &LoginRequest) -> ApiResult<(String, String)> {
    let email = non_blank(req.email.as_deref(), "email")?.to_lowercase();
    let password = non_blank(req.password.as_deref(), "password")?;
    Ok((email, password))
}

fn invalid_credentials() -> ApiError {
    ApiError::unauthorized("Invalid email or password")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::notify::testing::RecordingNotifier;
    use crate::state::testing::{state, state_with};
    use trim_core::ScheduleSpec;

    fn registration() -> RegisterRequest {
        RegisterRequest {
            business_name: Some("Fade Factory".into()),
            name: Some("Sam Rivera".into()),
            email: Some("Owner@Fade.test".into()),
            password: Some("password123".into()),
        }
    }

    #[tokio::test]
    async fn test_register_then_login() {
        let recorder = Arc::new(RecordingNotifier::default());
        let state = state_with(recorder.clone()).await;
        let auth = AuthService::new(state.clone());

        let registered = auth.register(&registration()).await.unwrap();
        assert_eq!(registered.role, Role::Owner);
        assert_eq!(registered.subject, registered.business_id);
        assert_eq!(recorder.sent()[0].recipient, "owner@fade.test");

        let logged_in = auth
            .login(&LoginRequest {
                email: Some("owner@fade.test".into()),
                password: Some("password123".into()),
            })
            .await
            .unwrap();
        assert_eq!(logged_in.business_id, registered.business_id);

        let claims = state.jwt.validate_token(&logged_in.token).unwrap();
        assert_eq!(claims.role, Role::Owner);
    }

    #[tokio::test]
    async fn test_duplicate_email_conflicts() {
        let state = state().await;
        let auth = AuthService::new(state);

        auth.register(&registration()).await.unwrap();
        let err = auth.register(&registration()).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::Conflict);
    }

    #[tokio::test]
    async fn test_register_validation() {
        let state = state().await;
        let auth = AuthService::new(state);

        let mut req = registration();
        req.password = Some("short".into());
        assert_eq!(auth.register(&req).await.unwrap_err().code, ErrorCode::ValidationError);

        let mut req = registration();
        req.business_name = None;
        let err = auth.register(&req).await.unwrap_err();
        assert!(err.message.contains("businessName"));
    }

    #[tokio::test]
    async fn test_wrong_password_rejected() {
        let state = state().await;
        let auth = AuthService::new(state);
        auth.register(&registration()).await.unwrap();

        let err = auth
            .login(&LoginRequest {
                email: Some("owner@fade.test".into()),
                password: Some("password124".into()),
            })
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::Unauthorized);

        let err = auth
            .login(&LoginRequest {
                email: Some("nobody@fade.test".into()),
                password: Some("password123".into()),
            })
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::Unauthorized);
    }

    #[tokio::test]
    async fn test_employee_login() {
        let state = state().await;
        let auth = AuthService::new(state.clone());
        let owner = auth.register(&registration()).await.unwrap();

        let employee = state
            .db
            .employees()
            .insert(
                &owner.business_id,
                "Alex",
                "alex@fade.test",
                None,
                &hash_password("clippers99").unwrap(),
                &[],
                &ScheduleSpec::default(),
            )
            .await
            .unwrap();

        let response = auth
            .employee_login(&LoginRequest {
                email: Some("alex@fade.test".into()),
                password: Some("clippers99".into()),
            })
            .await
            .unwrap();
        assert_eq!(response.role, Role::Employee);
        assert_eq!(response.subject, employee.id);
        assert_eq!(response.business_id, owner.business_id);
    }
}
