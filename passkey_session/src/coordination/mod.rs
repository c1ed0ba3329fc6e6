mod errors;
mod passkey;
mod session;

pub use errors::CoordinationError;
pub use passkey::{
    RegistrationStartRequest, RegistrationVerifyRequest, delete_passkey_credential_core,
    handle_finish_authentication_core, handle_finish_registration_core,
    handle_start_authentication_core, handle_start_registration_core, list_credentials_core,
};
pub use session::{
    SessionCreateRequest, authenticate_request_core, create_session_core, logout_core,
};
