use reqwest::header::HeaderMap;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;

use super::ApiError;
use crate::models::ApiEnvelope;

/// A buffered HTTP response.
///
/// Returned for every status, including 401/403, so callers can show the
/// backend's message before acting on it.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Vec<u8>,
}

impl ApiResponse {
    pub fn new(status: StatusCode, headers: HeaderMap, body: Vec<u8>) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// 2xx
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// 401 or 403
    pub fn is_auth_rejection(&self) -> bool {
        matches!(self.status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN)
    }

    pub fn bytes(&self) -> &[u8] {
        &self.body
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T, ApiError> {
        serde_json::from_slice(&self.body).map_err(|e| {
            ApiError::InvalidResponse(format!("Failed to parse JSON ({}): {}", self.status, e))
        })
    }

    /// Unwrap the backend's `{ success, message, data }` envelope
    pub fn data<T: DeserializeOwned>(&self) -> Result<T, ApiError> {
        let envelope: ApiEnvelope<T> = self.json()?;
        envelope
            .data
            .ok_or_else(|| ApiError::InvalidResponse("Response envelope has no data".to_string()))
    }

    /// The backend's human-readable `message`, if the body carries one
    pub fn error_message(&self) -> Option<String> {
        serde_json::from_slice::<ApiEnvelope<serde_json::Value>>(&self.body)
            .ok()
            .and_then(|envelope| envelope.message)
            .filter(|message| !message.trim().is_empty())
    }

    /// Convert a non-2xx response into the matching `ApiError`
    pub fn error_for_status(self) -> Result<Self, ApiError> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(ApiError::from_status(self.status, &self.text()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::University;

    fn response(status: u16, body: &str) -> ApiResponse {
        ApiResponse::new(
            StatusCode::from_u16(status).unwrap(),
            HeaderMap::new(),
            body.as_bytes().to_vec(),
        )
    }

    #[test]
    fn test_data_unwraps_envelope() {
        let res = response(
            200,
            r#"{"success":true,"message":"İşlem başarılı","data":[{"id":1,"name":"ETÜ"}]}"#,
        );
        let universities: Vec<University> = res.data().unwrap();
        assert_eq!(universities.len(), 1);
        assert_eq!(universities[0].name, "ETÜ");
    }

    #[test]
    fn test_data_without_payload_is_invalid() {
        let res = response(200, r#"{"success":true,"message":"ok","data":null}"#);
        assert!(matches!(
            res.data::<Vec<University>>(),
            Err(ApiError::InvalidResponse(_))
        ));
    }

    #[test]
    fn test_error_message() {
        assert_eq!(
            response(400, r#"{"success":false,"message":"Geçersiz rol"}"#)
                .error_message()
                .as_deref(),
            Some("Geçersiz rol")
        );
        assert_eq!(response(500, "<html>").error_message(), None);
    }

    #[test]
    fn test_error_for_status() {
        assert!(response(204, "").error_for_status().is_ok());
        assert!(matches!(
            response(401, "").error_for_status(),
            Err(ApiError::Unauthorized)
        ));
        assert!(response(403, "").is_auth_rejection());
        assert!(!response(404, "").is_auth_rejection());
    }
}
