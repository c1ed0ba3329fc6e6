mod config;
mod errors;
mod main;
mod storage;
mod types;

pub use errors::PasskeyError;
pub use main::{
    AuthenticationOptions, AuthenticatorResponse, PublicKeyCredentialUserEntity,
    RegisterCredential, RegistrationOptions,
};
pub use types::{CredentialSearchField, PasskeyCredential, PasskeyInfo};

pub(crate) use main::{
    finish_authentication, finish_registration, start_authentication, start_registration,
};
pub(crate) use storage::CredentialStore;

/// Initialize the credential store schema.
pub(crate) async fn init() -> Result<(), PasskeyError> {
    CredentialStore::init().await
}
