//! Admin dashboard endpoints (require the ADMIN role).

use reqwest::Method;

use super::client::{ApiClient, RequestOptions};
use super::ApiError;
use crate::models::{AdminUser, ApiEnvelope, DashboardStats, UserUpdate};

impl ApiClient {
    pub async fn fetch_dashboard_stats(&self) -> Result<DashboardStats, ApiError> {
        self.get_data("/api/admin/dashboard-stats").await
    }

    /// Users whose name matches `query`; an empty query lists everyone
    pub async fn search_users(&self, query: &str) -> Result<Vec<AdminUser>, ApiError> {
        let query = query.trim();
        let path = if query.is_empty() {
            "/api/admin/search-users".to_string()
        } else {
            format!("/api/admin/search-users?q={}", urlencoding::encode(query))
        };

        let response = self
            .auth_fetch(&path, RequestOptions::get())
            .await?
            .error_for_status()?;
        let envelope: ApiEnvelope<Vec<AdminUser>> = response.json()?;
        Ok(envelope.data.unwrap_or_default())
    }

    /// Update a user's profile, role and university. Returns the backend's message.
    pub async fn update_user(&self, id: i64, update: &UserUpdate) -> Result<String, ApiError> {
        let path = format!("/api/admin/users/{}", id);
        let response = self
            .auth_fetch(&path, RequestOptions::json(Method::PUT, update)?)
            .await?
            .error_for_status()?;
        let envelope: ApiEnvelope<String> = response.json()?;
        Ok(envelope
            .data
            .or(envelope.message)
            .unwrap_or_else(|| "updated".to_string()))
    }
}
