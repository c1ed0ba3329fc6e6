//! Central configuration for the passkey_session crate

use std::sync::LazyLock;

/// Route prefix under which the passkey endpoints are mounted.
/// Default: "/passkey"
pub static PASSKEY_ROUTE_PREFIX: LazyLock<String> = LazyLock::new(|| {
    std::env::var("PASSKEY_ROUTE_PREFIX").unwrap_or_else(|_| "/passkey".to_string())
});
