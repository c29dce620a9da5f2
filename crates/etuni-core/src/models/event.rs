use serde::Deserialize;

/// An event as listed by the backend.
///
/// Dates and times stay as the backend formats them (`2025-05-14`, `18:30`).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: i64,
    pub university_id: Option<i64>,
    pub club_id: Option<i64>,
    pub title: String,
    pub description: Option<String>,
    pub event_type: Option<String>,
    pub category: Option<String>,
    pub event_date: Option<String>,
    pub start_time: Option<String>,
    pub status: Option<String>,
    pub location: Option<String>,
    pub price: Option<f64>,
}

impl Event {
    /// Get display line for listings
    pub fn display_line(&self) -> String {
        let when = match (&self.event_date, &self.start_time) {
            (Some(date), Some(time)) => format!("{} {}", date, time),
            (Some(date), None) => date.clone(),
            _ => "TBA".to_string(),
        };
        match self.location {
            Some(ref location) => format!("#{} {} - {} @ {}", self.id, self.title, when, location),
            None => format!("#{} {} - {}", self.id, self.title, when),
        }
    }

    pub fn is_free(&self) -> bool {
        self.price.map_or(true, |price| price <= 0.0)
    }
}
