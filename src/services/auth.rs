//! `/api/v1/auth`

use tracing::{info, warn};

use crate::client::ApiClient;
use crate::error::{ApiError, ApiResult};
use crate::models::{LoginRequest, LoginResponse};
use crate::store::{Session, SessionStore};

#[derive(Clone)]
pub struct AuthService {
    client: ApiClient,
}

impl AuthService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// Log in and persist token and profile locally
    pub async fn login(&self, store: &SessionStore, email: &str, password: &str) -> ApiResult<Session> {
        let request = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        let response: LoginResponse = self.client.post_json("/auth/login", &request).await?;

        store
            .save_login(&response.token, &response.user)
            .map_err(ApiError::storage)?;
        info!(user_id = response.user.id, role = %response.user.role, "Logged in");

        Ok(Session {
            token: response.token,
            user: response.user,
        })
    }

    /// Tell the backend, then forget the local session regardless of the outcome
    pub async fn logout(&self, store: &SessionStore) -> ApiResult<()> {
        if let Err(e) = self.client.post_empty("/auth/logout").await {
            warn!(error = %e, "Backend logout failed, clearing local session anyway");
        }
        store.clear_login().map_err(ApiError::storage)
    }

    /// Session persisted by the last login, if any
    pub fn current(&self, store: &SessionStore) -> ApiResult<Option<Session>> {
        store.session().map_err(ApiError::storage)
    }
}
