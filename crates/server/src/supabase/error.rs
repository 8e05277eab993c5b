//! Auth backend errors.

use thiserror::Error;

/// Errors that can occur when talking to the Supabase auth API.
#[derive(Debug, Error)]
pub enum SupabaseError {
    /// HTTP request failed.
    #[error("Auth request failed: {0}")]
    Request(String),

    /// Failed to parse response.
    #[error("Auth response error: {0}")]
    Response(String),

    /// The API returned an error. Displays the provider's own message.
    #[error("{message}")]
    Api { status: u16, message: String },

    /// Email/password pair was refused.
    #[error("Invalid login credentials")]
    InvalidCredentials,

    /// The referenced user does not exist.
    #[error("User not found")]
    UserNotFound,
}

impl SupabaseError {
    /// Pick the most specific message out of a GoTrue error body.
    ///
    /// GoTrue has used `msg`, `message`, `error_description` and `error`
    /// across versions; the first non-empty one wins.
    #[must_use]
    pub fn message_from_body(status: u16, body: &str) -> String {
        serde_json::from_str::<serde_json::Value>(body)
            .ok()
            .and_then(|value| {
                ["msg", "message", "error_description", "error"]
                    .iter()
                    .find_map(|key| {
                        value
                            .get(key)
                            .and_then(serde_json::Value::as_str)
                            .filter(|s| !s.is_empty())
                            .map(String::from)
                    })
            })
            .or_else(|| Some(body.trim().to_string()).filter(|s| !s.is_empty()))
            .unwrap_or_else(|| format!("Auth API returned HTTP {status}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_field_precedence() {
        let body = r#"{"error":"invalid_grant","error_description":"Invalid login credentials"}"#;
        assert_eq!(
            SupabaseError::message_from_body(400, body),
            "Invalid login credentials"
        );

        let body = r#"{"code":422,"msg":"A user with this email address has already been registered","message":"other"}"#;
        assert_eq!(
            SupabaseError::message_from_body(422, body),
            "A user with this email address has already been registered"
        );
    }

    #[test]
    fn test_message_falls_back_to_body_then_status() {
        assert_eq!(
            SupabaseError::message_from_body(502, "Bad gateway"),
            "Bad gateway"
        );
        assert_eq!(
            SupabaseError::message_from_body(500, "  "),
            "Auth API returned HTTP 500"
        );
    }

    #[test]
    fn test_api_error_displays_raw_message() {
        let err = SupabaseError::Api {
            status: 422,
            message: "Password should be at least 6 characters".to_string(),
        };
        assert_eq!(err.to_string(), "Password should be at least 6 characters");
    }
}
