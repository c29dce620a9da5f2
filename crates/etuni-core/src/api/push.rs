use reqwest::Method;
use serde_json::json;

use super::client::{ApiClient, RequestOptions};
use super::ApiError;

const PUSH_TOKEN_PATH: &str = "/api/push-token";

impl ApiClient {
    /// Register this device's push token for the signed-in user
    pub async fn register_push_token(&self, push_token: &str) -> Result<(), ApiError> {
        let body = json!({ "pushToken": push_token.trim() });
        self.auth_fetch(PUSH_TOKEN_PATH, RequestOptions::json(Method::POST, &body)?)
            .await?
            .error_for_status()?;
        Ok(())
    }

    /// Stop push notifications for the signed-in user
    pub async fn revoke_push_token(&self) -> Result<(), ApiError> {
        self.auth_fetch(PUSH_TOKEN_PATH, RequestOptions::delete())
            .await?
            .error_for_status()?;
        Ok(())
    }

    /// Revoke with an already-read session token (used while signing out)
    pub(crate) async fn revoke_push_token_with(&self, token: Option<&str>) -> Result<(), ApiError> {
        self.fetch_with_token(PUSH_TOKEN_PATH, RequestOptions::delete(), token)
            .await?
            .error_for_status()?;
        Ok(())
    }
}
