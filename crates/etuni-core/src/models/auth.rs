use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// The signed-in user as returned by login.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    pub id: Option<i64>,
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub role: Option<String>,
    pub status: Option<String>,
    pub university_id: Option<i64>,
}

/// Login payload. Newer backends nest it under `data`; older ones return it flat.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginResponse {
    pub token: Option<String>,
    #[serde(rename = "type")]
    pub token_type: Option<String>,
    pub user: Option<UserView>,
}

/// Either shape of the login body.
#[derive(Debug, Deserialize)]
pub(crate) struct LoginBody {
    #[serde(default)]
    pub data: Option<LoginResponse>,
    #[serde(flatten)]
    pub flat: LoginResponse,
}

impl LoginBody {
    /// Nested payload first, falling back to top-level fields
    pub fn into_response(self) -> LoginResponse {
        let flat = self.flat;
        match self.data {
            Some(nested) => LoginResponse {
                token: nested.token.or(flat.token),
                token_type: nested.token_type.or(flat.token_type),
                user: nested.user.or(flat.user),
            },
            None => flat,
        }
    }
}
