use super::client::{ApiClient, RequestOptions};
use super::ApiError;
use crate::models::{ApiEnvelope, University};

impl ApiClient {
    /// List universities. Public endpoint, used before sign-in (registration).
    pub async fn fetch_universities(&self) -> Result<Vec<University>, ApiError> {
        let response = self
            .public_fetch("/api/universities", RequestOptions::get())
            .await?
            .error_for_status()?;
        let envelope: ApiEnvelope<Vec<University>> = response.json()?;
        Ok(envelope.data.unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use crate::api::client::testing::{client, Reply};

    #[tokio::test]
    async fn test_fetch_universities_is_public() {
        let (api, transport) = client(
            Some("abc"),
            vec![Reply::Status(200, r#"{"success":true,"message":"OK","data":[{"id":1,"name":"TOBB ETÜ"},{"id":2,"name":"ODTÜ"}]}"#)],
        );
        let universities = api.fetch_universities().await.unwrap();
        assert_eq!(universities.len(), 2);
        assert_eq!(universities[1].name, "ODTÜ");
        assert!(transport.last().headers.get("authorization").is_none());
    }

    #[tokio::test]
    async fn test_public_rejection_keeps_session() {
        let (api, _) = client(Some("abc"), vec![Reply::Status(403, "")]);
        assert!(api.fetch_universities().await.is_err());
        assert!(api.tokens().has_session().await);
    }
}
