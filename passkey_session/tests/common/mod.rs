#![allow(dead_code)]

pub mod webauthn;

use std::sync::Once;

/// One-time environment + store setup for an integration test binary.
///
/// Binaries that need special settings (their own database file, a short
/// challenge timeout) set those variables before the first call; defaults
/// only fill the gaps.
pub async fn init_test_environment(db_path: &str) {
    static ENV_INIT: Once = Once::new();

    let url = format!("sqlite:{db_path}");
    ENV_INIT.call_once(|| {
        set_default("ORIGIN", "http://127.0.0.1:3000");
        set_default("GENERIC_CACHE_STORE_TYPE", "memory");
        set_default("GENERIC_DATA_STORE_TYPE", "sqlite");
        set_default("GENERIC_DATA_STORE_URL", &url);
        set_default("SESSION_SECRET", "integration-test-secret");

        let _ = std::fs::remove_file(db_path);
    });

    passkey_session::init()
        .await
        .expect("Failed to initialize stores");
}

fn set_default(key: &str, value: &str) {
    if std::env::var(key).is_err() {
        unsafe {
            std::env::set_var(key, value);
        }
    }
}

/// The origin the test environment registers ceremonies under.
pub fn test_origin() -> String {
    std::env::var("ORIGIN").unwrap_or_else(|_| "http://127.0.0.1:3000".to_string())
}

/// RP id derived from the origin the same way the server derives it.
pub fn test_rp_id() -> String {
    test_origin()
        .trim_start_matches("https://")
        .trim_start_matches("http://")
        .split(':')
        .next()
        .unwrap()
        .to_string()
}
