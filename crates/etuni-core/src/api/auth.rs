//! Sign-in and sign-out against the backend.

use chrono::Utc;
use reqwest::Method;
use tracing::info;

use super::client::{ApiClient, RequestOptions};
use super::ApiError;
use crate::auth::{normalize_token, SessionProfile};
use crate::models::auth::LoginBody;
use crate::models::{LoginRequest, UserView};
use crate::utils::best_effort;

const LOGIN_PATH: &str = "/api/auth/login";
const LOGOUT_PATH: &str = "/api/auth/logout";

impl ApiClient {
    /// Exchange credentials for a token and start a session.
    ///
    /// On success the token and the user's university and role are stored
    /// in the token store. A rejected login leaves any existing session alone.
    pub async fn login(&self, email: &str, password: &str) -> Result<UserView, ApiError> {
        let request = LoginRequest {
            email: email.trim().to_string(),
            password: password.to_string(),
        };
        let response = self
            .public_fetch(LOGIN_PATH, RequestOptions::json(Method::POST, &request)?)
            .await?;

        if response.is_auth_rejection() {
            let message = response
                .error_message()
                .unwrap_or_else(|| "invalid email or password".to_string());
            return Err(ApiError::InvalidCredentials(message));
        }
        let response = response.error_for_status()?;

        let login = response.json::<LoginBody>()?.into_response();
        let token = login
            .token
            .as_deref()
            .and_then(normalize_token)
            .ok_or(ApiError::MissingToken)?;

        let user = login.user.unwrap_or_default();
        self.tokens().set_token(&token);
        self.tokens().remember_profile(&SessionProfile {
            university_id: user.university_id,
            role: user.role.clone(),
            signed_in_at: Some(Utc::now()),
        });
        info!(user_id = ?user.id, role = ?user.role, "Signed in");

        Ok(user)
    }

    /// Sign out everywhere we can, then always sign out locally.
    ///
    /// Push-token revocation and the server logout are attempted in order;
    /// their failures are logged and ignored. The local session is cleared
    /// whatever happened on the network, and it ends as a sign-out, never as
    /// a rejection.
    pub async fn logout_from_server(&self) {
        // Both calls carry the token we started with, even if the first is rejected
        let token = self.tokens().get_token().await;
        let token = token.as_deref();

        best_effort("revoke push token", self.revoke_push_token_with(token)).await;
        best_effort("server logout", self.server_logout_with(token)).await;
        self.tokens().clear_token();
    }

    /// Tell the backend this session is over
    async fn server_logout_with(&self, token: Option<&str>) -> Result<(), ApiError> {
        self.fetch_with_token(LOGOUT_PATH, RequestOptions::method(Method::POST), token)
            .await?
            .error_for_status()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use reqwest::header;

    use super::*;
    use crate::api::client::testing::{client, Reply};
    use crate::auth::SessionEvent;

    const LOGIN_OK: &str = r#"{"success":true,"message":"Giriş başarılı","data":{"token":"Bearer eyJ.fresh","type":"Bearer","user":{"id":5,"role":"STUDENT","universityId":2}}}"#;

    #[tokio::test]
    async fn test_login_stores_normalized_token_and_profile() {
        let (api, transport) = client(None, vec![Reply::Status(200, LOGIN_OK)]);
        let user = api.login(" ali@etu.edu.tr ", "Secret123").await.unwrap();

        assert_eq!(user.id, Some(5));
        assert_eq!(api.tokens().get_token().await.as_deref(), Some("eyJ.fresh"));
        let profile = api.tokens().profile().await.unwrap();
        assert_eq!(profile.university_id, Some(2));
        assert_eq!(profile.role.as_deref(), Some("STUDENT"));
        assert!(profile.signed_in_at.is_some());

        let sent = transport.last();
        assert_eq!(sent.method, Method::POST);
        assert!(sent.url.ends_with(LOGIN_PATH));
        assert!(sent.headers.get(header::AUTHORIZATION).is_none());
        let body: serde_json::Value = serde_json::from_str(sent.body.as_deref().unwrap()).unwrap();
        assert_eq!(body["email"], "ali@etu.edu.tr");
        assert_eq!(body["password"], "Secret123");
    }

    #[tokio::test]
    async fn test_failed_login_keeps_existing_session() {
        let (api, _) = client(
            Some("old"),
            vec![Reply::Status(401, r#"{"success":false,"message":"E-posta veya şifre hatalı"}"#)],
        );
        match api.login("ali@etu.edu.tr", "wrong").await {
            Err(ApiError::InvalidCredentials(message)) => {
                assert_eq!(message, "E-posta veya şifre hatalı")
            }
            other => panic!("unexpected result: {:?}", other),
        }
        assert_eq!(api.tokens().get_token().await.as_deref(), Some("old"));
    }

    #[tokio::test]
    async fn test_login_without_token_is_an_error() {
        let (api, _) = client(None, vec![Reply::Status(200, r#"{"success":true,"data":{"token":"null"}}"#)]);
        assert!(matches!(
            api.login("ali@etu.edu.tr", "x").await,
            Err(ApiError::MissingToken)
        ));
        assert_eq!(api.tokens().get_token().await, None);
    }

    #[tokio::test]
    async fn test_logout_revokes_push_token_then_logs_out() {
        let (api, transport) = client(Some("abc"), vec![]);
        api.logout_from_server().await;

        let sent = transport.requests();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].method, Method::DELETE);
        assert!(sent[0].url.ends_with("/api/push-token"));
        assert_eq!(sent[1].method, Method::POST);
        assert!(sent[1].url.ends_with(LOGOUT_PATH));
        assert_eq!(sent[1].headers[header::AUTHORIZATION], "Bearer abc");
        assert_eq!(api.tokens().get_token().await, None);
    }

    #[tokio::test]
    async fn test_rejected_revoke_still_logs_out_with_token() {
        let (api, transport) = client(Some("abc"), vec![Reply::Status(401, ""), Reply::Status(200, "")]);
        let mut events = api.tokens().subscribe();
        api.logout_from_server().await;

        let sent = transport.requests();
        assert_eq!(sent.len(), 2);
        assert!(sent[1].url.ends_with(LOGOUT_PATH));
        assert_eq!(sent[1].headers[header::AUTHORIZATION], "Bearer abc");
        assert_eq!(api.tokens().get_token().await, None);

        assert_eq!(events.recv().await.unwrap(), SessionEvent::SignedOut);
        assert!(events.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_logout_without_session_sends_no_authorization() {
        let (api, transport) = client(None, vec![]);
        api.logout_from_server().await;
        assert!(transport
            .requests()
            .iter()
            .all(|r| r.headers.get(header::AUTHORIZATION).is_none()));
    }

    #[tokio::test]
    async fn test_logout_survives_network_failures() {
        let (api, _) = client(Some("abc"), vec![Reply::Fail, Reply::Fail]);
        api.logout_from_server().await;
        assert_eq!(api.tokens().get_token().await, None);
    }

    #[tokio::test]
    async fn test_logout_survives_server_errors() {
        let (api, _) = client(Some("abc"), vec![Reply::Status(500, ""), Reply::Status(502, "")]);
        api.logout_from_server().await;
        assert_eq!(api.tokens().get_token().await, None);
    }
}
