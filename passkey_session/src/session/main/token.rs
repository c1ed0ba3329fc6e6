use chrono::Utc;
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};

use crate::session::config::{SESSION_MAX_AGE, SESSION_SECRET};
use crate::session::errors::SessionError;
use crate::session::types::SessionClaims;

/// Mint a signed session token for `user_id`.
///
/// The token is a stateless HS256 JWT; once issued it stays valid until
/// its expiry on every client that holds it, since there is no
/// server-side revocation store.
pub fn mint_session_token(user_id: &str, auth_method: &str) -> Result<String, SessionError> {
    let iat = Utc::now().timestamp();
    let claims = SessionClaims {
        sub: user_id.to_string(),
        auth_method: auth_method.to_string(),
        iat,
        exp: iat + *SESSION_MAX_AGE as i64,
    };

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(&SESSION_SECRET),
    )
    .map_err(|e| SessionError::Crypto(e.to_string()))
}

/// Verify a session token's signature and expiry.
pub fn validate_session_token(token: &str) -> Result<SessionClaims, SessionError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;

    decode::<SessionClaims>(
        token,
        &DecodingKey::from_secret(&SESSION_SECRET),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|e| match e.kind() {
        ErrorKind::ExpiredSignature => SessionError::Expired,
        ErrorKind::InvalidSignature => SessionError::InvalidSignature,
        _ => SessionError::TokenFormat(e.to_string()),
    })
}
