//! passkey_session - Passkey (WebAuthn) authentication with stateless
//! signed session tokens.
//!
//! This crate implements the full passkey lifecycle: ceremony challenges
//! with a 5-minute TTL, attestation and assertion verification, a durable
//! credential store with anti-replay counter enforcement, and an HS256
//! session token bridge consumed by the rest of the application.

mod config;
mod coordination;
mod passkey;
mod session;
mod storage;
#[cfg(test)]
mod test_utils;
mod utils;

// The coordination entry points an HTTP layer builds on
pub use coordination::{
    CoordinationError, RegistrationStartRequest, RegistrationVerifyRequest, SessionCreateRequest,
    authenticate_request_core, create_session_core, delete_passkey_credential_core,
    handle_finish_authentication_core, handle_finish_registration_core,
    handle_start_authentication_core, handle_start_registration_core, list_credentials_core,
    logout_core,
};

pub use config::PASSKEY_ROUTE_PREFIX;

pub use passkey::{
    AuthenticationOptions, AuthenticatorResponse, PasskeyCredential, PasskeyError, PasskeyInfo,
    RegisterCredential, RegistrationOptions,
};

pub use session::{
    SESSION_COOKIE_NAME, SESSION_MAX_AGE, SessionClaims, SessionError, mint_session_token,
    prepare_logout_response, session_token_from_headers, validate_session_token,
};

/// Initialize the stores. Call once at process start, before serving.
pub async fn init() -> Result<(), Box<dyn std::error::Error>> {
    storage::init().await?;
    passkey::init().await?;
    Ok(())
}
