use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use http::header::{HeaderMap, SET_COOKIE};
use ring::rand::SecureRandom;
use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum UtilError {
    #[error("Crypto error: {0}")]
    Crypto(String),

    #[error("Cookie error: {0}")]
    Cookie(String),

    #[error("Invalid format: {0}")]
    Format(String),
}

pub(crate) fn base64url_decode(input: &str) -> Result<Vec<u8>, UtilError> {
    URL_SAFE_NO_PAD
        .decode(input)
        .map_err(|_| UtilError::Format("Failed to decode base64url".to_string()))
}

pub(crate) fn base64url_encode(input: impl AsRef<[u8]>) -> String {
    URL_SAFE_NO_PAD.encode(input)
}

/// Generate `len` random bytes and return them base64url-encoded.
pub fn gen_random_string(len: usize) -> Result<String, UtilError> {
    let rng = ring::rand::SystemRandom::new();
    let mut bytes = vec![0u8; len];
    rng.fill(&mut bytes)
        .map_err(|_| UtilError::Crypto("Failed to generate random bytes".to_string()))?;
    Ok(base64url_encode(bytes))
}

pub(crate) fn header_set_cookie<'a>(
    headers: &'a mut HeaderMap,
    name: &str,
    value: &str,
    max_age: i64,
    secure: bool,
) -> Result<&'a HeaderMap, UtilError> {
    let secure_attr = if secure { "; Secure" } else { "" };
    let cookie =
        format!("{name}={value}; SameSite=Lax{secure_attr}; HttpOnly; Path=/; Max-Age={max_age}");
    tracing::debug!("Set-Cookie: {}", cookie);
    headers.append(
        SET_COOKIE,
        cookie
            .parse()
            .map_err(|_| UtilError::Cookie("Failed to parse cookie".to_string()))?,
    );
    Ok(headers)
}
