//! Shared test initialization: one-time environment setup plus store
//! schema creation, used by the unit tests across the crate.

use std::sync::Once;

const TEST_DB_PATH: &str = "/tmp/passkey_session_unit_test.db";

/// Configure the test environment and initialize the stores.
///
/// Environment variables are set exactly once per process, before any
/// config `LazyLock` is touched; repeated calls only re-run the idempotent
/// schema initialization.
pub(crate) async fn init_test_environment() {
    static ENV_INIT: Once = Once::new();
    ENV_INIT.call_once(|| {
        // A .env_test can override the defaults below
        if dotenvy::from_filename(".env_test").is_err() {
            dotenvy::dotenv().ok();
        }

        set_default("ORIGIN", "http://127.0.0.1:3000");
        set_default("GENERIC_CACHE_STORE_TYPE", "memory");
        set_default("GENERIC_DATA_STORE_TYPE", "sqlite");
        set_default("GENERIC_DATA_STORE_URL", &format!("sqlite:{TEST_DB_PATH}"));
        set_default("SESSION_SECRET", "unit-test-session-secret");

        // Start from a clean database file
        let _ = std::fs::remove_file(TEST_DB_PATH);
    });

    if let Err(e) = crate::storage::init().await {
        eprintln!("Warning: failed to initialize storage: {e}");
    }
    if let Err(e) = crate::passkey::init().await {
        eprintln!("Warning: failed to initialize credential store: {e}");
    }
}

fn set_default(key: &str, value: &str) {
    if std::env::var(key).is_err() {
        unsafe {
            std::env::set_var(key, value);
        }
    }
}
