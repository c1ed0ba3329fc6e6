use serde::{Deserialize, Serialize};

/// Claims carried by a session token.
///
/// `sub` is the authenticated user id; `auth_method` records how the
/// session was established ("passkey" for WebAuthn logins, "password" for
/// the bridged login path). Timestamps are unix seconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: String,
    pub auth_method: String,
    pub iat: i64,
    pub exp: i64,
}
