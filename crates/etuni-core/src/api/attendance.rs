//! Ticket check-in and event sign-up.
//!
//! Organizers check attendees in by scanning the ticket QR code or typing
//! the ticket code; students join events to get a ticket.

use reqwest::Method;
use serde_json::Value;
use tracing::info;

use super::client::{ApiClient, RequestOptions};
use super::response::ApiResponse;
use super::ApiError;
use crate::models::attendance::WRONG_EVENT;
use crate::models::{ApiEnvelope, CheckIn, CodeRequest, ScanRequest, TicketCheck};

const SCAN_PATH: &str = "/api/attendance/scan";
const VALIDATE_CODE_PATH: &str = "/api/attendance/validate-code";

impl ApiClient {
    /// Check in the holder of a scanned QR ticket.
    ///
    /// With `current_event_id` the backend refuses tickets for other events
    /// (`CheckIn::WrongEvent`).
    pub async fn scan_ticket(
        &self,
        qr_payload: &str,
        current_event_id: Option<i64>,
    ) -> Result<CheckIn, ApiError> {
        let request = ScanRequest {
            qr_payload: qr_payload.trim().to_string(),
            current_event_id,
        };
        let response = self
            .auth_fetch(SCAN_PATH, RequestOptions::json(Method::POST, &request)?)
            .await?;
        let check_in = read_check_in(&response, "QR code could not be verified")?;
        info!(?current_event_id, admitted = check_in.is_admitted(), "Scanned ticket");
        Ok(check_in)
    }

    /// Check in by the code printed on the ticket
    pub async fn validate_ticket_code(&self, code: &str) -> Result<CheckIn, ApiError> {
        let code = code.trim();
        if code.is_empty() {
            return Ok(CheckIn::Refused {
                reason: "ticket code is required".to_string(),
            });
        }
        let request = CodeRequest {
            code: code.to_string(),
        };
        let response = self
            .auth_fetch(VALIDATE_CODE_PATH, RequestOptions::json(Method::POST, &request)?)
            .await?;
        read_check_in(&response, "Ticket code could not be verified")
    }

    /// Sign up for an event. Returns the backend's confirmation message.
    pub async fn join_event(&self, event_id: i64) -> Result<String, ApiError> {
        let path = format!("/api/attendance/join/{}", event_id);
        let response = self
            .auth_fetch(&path, RequestOptions::method(Method::POST))
            .await?
            .error_for_status()?;
        let envelope: ApiEnvelope<String> = response.json()?;
        Ok(envelope
            .data
            .or(envelope.message)
            .unwrap_or_else(|| "joined".to_string()))
    }
}

/// Interpret a scan or code-check response.
///
/// The ticket details come in `data`, or at the top level from older
/// backends. A session rejection or an unreadable error body is an error;
/// every other answer is a `CheckIn`.
fn read_check_in(response: &ApiResponse, fallback: &str) -> Result<CheckIn, ApiError> {
    if response.is_auth_rejection() {
        return Err(ApiError::from_status(response.status(), &response.text()));
    }
    let body: Value = match response.json() {
        Ok(body) => body,
        Err(_) if !response.is_success() => {
            return Err(ApiError::from_status(response.status(), &response.text()))
        }
        Err(e) => return Err(e),
    };

    let details = match body.get("data") {
        Some(data) if data.is_object() => data,
        _ => &body,
    };
    let valid = match details.get("valid") {
        Some(Value::Bool(valid)) => *valid,
        Some(Value::String(valid)) => valid == "true",
        _ => false,
    };
    let check: TicketCheck = serde_json::from_value(details.clone())
        .map_err(|e| ApiError::InvalidResponse(format!("Failed to parse ticket check: {}", e)))?;

    Ok(if check.message.as_deref() == Some(WRONG_EVENT) {
        CheckIn::WrongEvent(check)
    } else if response.is_success() && valid {
        CheckIn::Admitted(check)
    } else {
        CheckIn::Refused {
            reason: check.message.unwrap_or_else(|| fallback.to_string()),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::client::testing::{client, Reply};

    const CHECK_IN_OK: &str = r#"{"success":true,"message":"OK","data":{"valid":true,"message":"CHECK_IN_OK","eventId":7,"eventTitle":"Kariyer Günleri","checkInTime":"2025-03-02T10:15:00","userId":5,"userFullName":"Ali Veli","userEmail":"ali@etu.edu.tr"}}"#;

    #[tokio::test]
    async fn test_scan_sends_payload_and_event() {
        let (api, transport) = client(Some("abc"), vec![Reply::Status(200, CHECK_IN_OK)]);
        let check_in = api.scan_ticket(" ETUNI:42:abc ", Some(7)).await.unwrap();

        match check_in {
            CheckIn::Admitted(check) => {
                assert_eq!(check.message.as_deref(), Some("CHECK_IN_OK"));
                assert_eq!(check.user_full_name.as_deref(), Some("Ali Veli"));
                assert_eq!(check.event_id, Some(7));
            }
            other => panic!("unexpected check-in: {:?}", other),
        }

        let sent = transport.last();
        assert_eq!(sent.method, Method::POST);
        assert!(sent.url.ends_with(SCAN_PATH));
        assert_eq!(sent.headers["authorization"], "Bearer abc");
        let body: Value = serde_json::from_str(sent.body.as_deref().unwrap()).unwrap();
        assert_eq!(body, serde_json::json!({ "qrPayload": "ETUNI:42:abc", "currentEventId": 7 }));
    }

    #[tokio::test]
    async fn test_scan_for_another_event() {
        let (api, _) = client(
            Some("abc"),
            vec![Reply::Status(
                200,
                r#"{"success":true,"message":"OK","data":{"valid":false,"message":"WRONG_EVENT","eventId":3,"eventTitle":"Tiyatro Gecesi"}}"#,
            )],
        );
        match api.scan_ticket("ETUNI:42:abc", Some(7)).await.unwrap() {
            CheckIn::WrongEvent(check) => assert_eq!(check.event_title.as_deref(), Some("Tiyatro Gecesi")),
            other => panic!("unexpected check-in: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_scan_refusal_carries_reason() {
        let (api, _) = client(
            Some("abc"),
            vec![
                Reply::Status(200, r#"{"success":true,"data":{"valid":false,"message":"TICKET_CODE_MISMATCH"}}"#),
                Reply::Status(200, r#"{"success":true,"data":{"valid":false}}"#),
            ],
        );
        match api.scan_ticket("x", None).await.unwrap() {
            CheckIn::Refused { reason } => assert_eq!(reason, "TICKET_CODE_MISMATCH"),
            other => panic!("unexpected check-in: {:?}", other),
        }
        match api.scan_ticket("x", None).await.unwrap() {
            CheckIn::Refused { reason } => assert_eq!(reason, "QR code could not be verified"),
            other => panic!("unexpected check-in: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_flat_body_and_string_valid_are_accepted() {
        let (api, _) = client(
            Some("abc"),
            vec![Reply::Status(200, r#"{"valid":"true","message":"ALREADY_CHECKED_IN","eventId":7}"#)],
        );
        let check_in = api.validate_ticket_code("TCK-1").await.unwrap();
        assert!(check_in.is_admitted());
    }

    #[tokio::test]
    async fn test_error_envelope_is_a_refusal() {
        let (api, _) = client(
            Some("abc"),
            vec![Reply::Status(400, r#"{"success":false,"message":"INVALID_TICKET_CODE","data":null}"#)],
        );
        match api.validate_ticket_code("nope").await.unwrap() {
            CheckIn::Refused { reason } => assert_eq!(reason, "INVALID_TICKET_CODE"),
            other => panic!("unexpected check-in: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_validate_code_trims_and_skips_empty() {
        let (api, transport) = client(Some("abc"), vec![Reply::Status(200, CHECK_IN_OK)]);
        assert!(!api.validate_ticket_code("   ").await.unwrap().is_admitted());
        assert!(transport.requests().is_empty());

        assert!(api.validate_ticket_code(" TCK-9 ").await.unwrap().is_admitted());
        let body: Value = serde_json::from_str(transport.last().body.as_deref().unwrap()).unwrap();
        assert_eq!(body["code"], "TCK-9");
        assert!(transport.last().url.ends_with(VALIDATE_CODE_PATH));
    }

    #[tokio::test]
    async fn test_rejected_scan_is_an_error_and_ends_session() {
        let (api, _) = client(Some("abc"), vec![Reply::Status(403, r#"{"message":"Access Denied"}"#)]);
        assert!(matches!(api.scan_ticket("x", Some(1)).await, Err(ApiError::AccessDenied(_))));
        assert!(!api.tokens().has_session().await);
    }

    #[tokio::test]
    async fn test_server_error_without_json_is_an_error() {
        let (api, _) = client(Some("abc"), vec![Reply::Status(502, "<html>Bad Gateway</html>")]);
        assert!(matches!(api.scan_ticket("x", None).await, Err(ApiError::ServerError(_))));
    }

    #[tokio::test]
    async fn test_join_event() {
        let (api, transport) = client(
            Some("abc"),
            vec![
                Reply::Status(200, r#"{"success":true,"message":"JOINED","data":"Successfully joined event"}"#),
                Reply::Status(400, r#"{"success":false,"message":"ALREADY_JOINED"}"#),
            ],
        );
        assert_eq!(api.join_event(12).await.unwrap(), "Successfully joined event");
        assert_eq!(transport.last().method, Method::POST);
        assert!(transport.last().url.ends_with("/api/attendance/join/12"));

        match api.join_event(12).await {
            Err(ApiError::Rejected { message, .. }) => assert_eq!(message, "ALREADY_JOINED"),
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
