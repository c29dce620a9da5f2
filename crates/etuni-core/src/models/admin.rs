use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_users: i64,
    pub total_events: i64,
    pub active_universities: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminUser {
    pub id: i64,
    pub full_name: String,
    pub email: String,
    pub role: String,
    pub university_id: Option<i64>,
    pub university_name: Option<String>,
}

impl AdminUser {
    /// Get display line for listings
    pub fn display_line(&self) -> String {
        match self.university_name {
            Some(ref university) => format!(
                "#{} {} <{}> [{}] {}",
                self.id, self.full_name, self.email, self.role, university
            ),
            None => format!("#{} {} <{}> [{}]", self.id, self.full_name, self.email, self.role),
        }
    }
}

/// Body of `PUT /api/admin/users/{id}`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserUpdate {
    pub full_name: String,
    pub email: String,
    pub role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub university_id: Option<i64>,
}
