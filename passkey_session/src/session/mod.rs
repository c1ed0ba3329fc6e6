mod config;
mod errors;
mod main;
mod types;

pub use config::{SESSION_COOKIE_NAME, SESSION_MAX_AGE};
pub use errors::SessionError;
pub use main::{
    mint_session_token, prepare_logout_response, session_token_from_headers,
    validate_session_token,
};
pub use types::SessionClaims;

pub(crate) use main::new_session_header;
