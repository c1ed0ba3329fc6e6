mod cookie;
mod token;

pub use cookie::{prepare_logout_response, session_token_from_headers};
pub use token::{mint_session_token, validate_session_token};

pub(crate) use cookie::new_session_header;
