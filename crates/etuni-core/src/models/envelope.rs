use serde::Deserialize;

/// Standard backend response wrapper.
///
/// Error responses use a different shape (`errorCode`, `fieldErrors`) but
/// share `message`, so every field is optional.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiEnvelope<T> {
    pub success: Option<bool>,
    pub message: Option<String>,
    pub data: Option<T>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Payload {
        id: i64,
    }

    #[test]
    fn test_missing_fields_are_none_for_any_payload() {
        // Payload has no Default impl
        let envelope: ApiEnvelope<Payload> = serde_json::from_str(r#"{"message":"Not found"}"#).unwrap();
        assert_eq!(envelope.success, None);
        assert_eq!(envelope.message.as_deref(), Some("Not found"));
        assert!(envelope.data.is_none());

        let envelope: ApiEnvelope<Payload> = serde_json::from_str(r#"{"success":true,"data":{"id":3}}"#).unwrap();
        assert_eq!(envelope.data, Some(Payload { id: 3 }));
    }
}
