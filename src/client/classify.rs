//! Response-failure classification.

use reqwest::StatusCode;
use serde::Deserialize;

use crate::error::{GymError, FALLBACK_ERROR_MESSAGE};

const TOKEN_EXPIRED: &str = "token.expired";
const TOKEN_INVALID: &str = "token.invalid";

/// What the client should do with a failing response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Failure {
    /// 401 caused by an expired or invalid access token; eligible for refresh.
    ExpiredToken { message: String },
    /// Anything else, surfaced to the caller untouched.
    Api(GymError),
}

impl Failure {
    pub fn into_error(self) -> GymError {
        match self {
            Self::ExpiredToken { message } => GymError::ExpiredToken { message },
            Self::Api(error) => error,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

/// Pull the server's `message` out of an error body, if it has one.
pub fn server_message(body: &[u8]) -> Option<String> {
    serde_json::from_slice::<ErrorBody>(body)
        .ok()
        .and_then(|parsed| parsed.message)
        .filter(|message| !message.trim().is_empty())
}

/// Classify a non-success response.
pub fn classify(status: StatusCode, body: &[u8]) -> Failure {
    let message = server_message(body);
    if status == StatusCode::UNAUTHORIZED {
        if let Some(reason) = message.as_deref() {
            if reason == TOKEN_EXPIRED || reason == TOKEN_INVALID {
                return Failure::ExpiredToken {
                    message: reason.to_string(),
                };
            }
        }
    }
    Failure::Api(GymError::api(
        status.as_u16(),
        message.unwrap_or_else(|| FALLBACK_ERROR_MESSAGE.to_string()),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expired_and_invalid_tokens_enter_the_refresh_protocol() {
        for reason in [TOKEN_EXPIRED, TOKEN_INVALID] {
            let body = format!(r#"{{"status":"error","message":"{reason}"}}"#);
            assert_eq!(
                classify(StatusCode::UNAUTHORIZED, body.as_bytes()),
                Failure::ExpiredToken {
                    message: reason.to_string()
                }
            );
        }
    }

    #[test]
    fn other_unauthorized_reasons_are_generic() {
        let failure = classify(StatusCode::UNAUTHORIZED, br#"{"message":"forbidden"}"#);
        assert_eq!(failure, Failure::Api(GymError::api(401, "forbidden")));
    }

    #[test]
    fn expiry_reason_on_other_status_is_generic() {
        let failure = classify(StatusCode::FORBIDDEN, br#"{"message":"token.expired"}"#);
        assert_eq!(failure, Failure::Api(GymError::api(403, "token.expired")));
    }

    #[test]
    fn missing_message_uses_fallback() {
        let failure = classify(StatusCode::INTERNAL_SERVER_ERROR, b"<html>oops</html>");
        assert_eq!(
            failure,
            Failure::Api(GymError::api(500, FALLBACK_ERROR_MESSAGE))
        );
        let failure = classify(StatusCode::BAD_REQUEST, br#"{"message":"  "}"#);
        assert_eq!(
            failure,
            Failure::Api(GymError::api(400, FALLBACK_ERROR_MESSAGE))
        );
    }
}
