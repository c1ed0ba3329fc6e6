use http::StatusCode;
use passkey_session::{CoordinationError, PasskeyError, SessionError};

/// Helper trait converting coordination results into `(status, message)`
/// responses.
pub trait IntoResponseError<T> {
    fn into_response_error(self) -> Result<T, (StatusCode, String)>;
}

impl<T> IntoResponseError<T> for Result<T, CoordinationError> {
    fn into_response_error(self) -> Result<T, (StatusCode, String)> {
        self.map_err(|e| match &e {
            CoordinationError::InvalidRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            CoordinationError::Unauthorized => {
                (StatusCode::UNAUTHORIZED, "Unauthorized".to_string())
            }
            CoordinationError::Forbidden => (StatusCode::FORBIDDEN, "Forbidden".to_string()),
            CoordinationError::ResourceNotFound { .. } => {
                (StatusCode::NOT_FOUND, "Not found".to_string())
            }
            CoordinationError::Passkey(passkey_error) => passkey_status(passkey_error),
            CoordinationError::Session(session_error) => session_status(session_error),
            CoordinationError::Utils(_) => internal_error(),
        })
    }
}

/// Ceremony verification failures collapse into one generic message: the
/// response never reveals which verification step rejected the request.
/// The precise cause is logged server-side by the coordination layer.
fn passkey_status(e: &PasskeyError) -> (StatusCode, String) {
    match e {
        PasskeyError::NotFound(_) => (StatusCode::NOT_FOUND, "Not found".to_string()),
        PasskeyError::Expired(_) => (StatusCode::GONE, "Ceremony expired".to_string()),
        PasskeyError::Conflict(_) => (
            StatusCode::CONFLICT,
            "Credential already registered".to_string(),
        ),
        PasskeyError::Config(_)
        | PasskeyError::Storage(_)
        | PasskeyError::Crypto(_)
        | PasskeyError::Utils(_)
        | PasskeyError::SerdeJson(_) => internal_error(),
        _ => (StatusCode::BAD_REQUEST, "Verification failed".to_string()),
    }
}

fn session_status(e: &SessionError) -> (StatusCode, String) {
    match e {
        SessionError::InvalidSignature | SessionError::Expired | SessionError::TokenFormat(_) => {
            (StatusCode::UNAUTHORIZED, "Unauthorized".to_string())
        }
        _ => internal_error(),
    }
}

fn internal_error() -> (StatusCode, String) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "Internal error".to_string(),
    )
}
