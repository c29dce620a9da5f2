use serde::{Deserialize, Serialize};

/// Backend code for a ticket that belongs to a different event
pub const WRONG_EVENT: &str = "WRONG_EVENT";

/// Body of `POST /api/attendance/scan`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanRequest {
    pub qr_payload: String,
    pub current_event_id: Option<i64>,
}

/// Body of `POST /api/attendance/validate-code`
#[derive(Debug, Clone, Serialize)]
pub struct CodeRequest {
    pub code: String,
}

/// Ticket details the backend returns with a scan or code check.
/// `valid` is read separately since older backends send it as a string.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketCheck {
    pub message: Option<String>,
    pub event_id: Option<i64>,
    pub event_title: Option<String>,
    pub check_in_time: Option<String>,
    pub user_id: Option<i64>,
    pub user_full_name: Option<String>,
    pub user_email: Option<String>,
}

/// What the organizer should be told after a scan
#[derive(Debug, Clone)]
pub enum CheckIn {
    /// Attendee let in (or already checked in earlier)
    Admitted(TicketCheck),
    /// Ticket is for another event; `check` names the event it belongs to
    WrongEvent(TicketCheck),
    /// Any other refusal, with the backend's reason
    Refused { reason: String },
}

impl CheckIn {
    pub fn is_admitted(&self) -> bool {
        matches!(self, CheckIn::Admitted(_))
    }
}
