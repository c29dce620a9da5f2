use super::client::{ApiClient, RequestOptions};
use super::ApiError;
use crate::models::{ApiEnvelope, Event};

impl ApiClient {
    /// Latest events at a university
    pub async fn fetch_events(&self, university_id: i64) -> Result<Vec<Event>, ApiError> {
        self.fetch_event_list(&format!("/api/events/university/{}", university_id))
            .await
    }

    /// Events created by the signed-in organizer
    pub async fn fetch_my_events(&self) -> Result<Vec<Event>, ApiError> {
        self.fetch_event_list("/api/events/my-events").await
    }

    pub async fn fetch_event(&self, event_id: i64) -> Result<Event, ApiError> {
        self.get_data(&format!("/api/events/{}", event_id)).await
    }

    async fn fetch_event_list(&self, path: &str) -> Result<Vec<Event>, ApiError> {
        let response = self
            .auth_fetch(path, RequestOptions::get())
            .await?
            .error_for_status()?;
        let envelope: ApiEnvelope<Vec<Event>> = response.json()?;
        Ok(envelope.data.unwrap_or_default())
    }
}
