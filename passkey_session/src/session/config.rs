use std::env;
use std::sync::LazyLock;

pub static SESSION_COOKIE_NAME: LazyLock<String> =
    LazyLock::new(|| env::var("SESSION_COOKIE_NAME").unwrap_or_else(|_| "session".to_string()));

/// Session lifetime in seconds. Default 7 days.
pub static SESSION_MAX_AGE: LazyLock<u64> = LazyLock::new(|| {
    env::var("SESSION_MAX_AGE")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(604800)
});

/// Whether session cookies carry the Secure attribute. Defaults to true
/// unless the configured origin is plain http (local development).
pub(super) static SESSION_COOKIE_SECURE: LazyLock<bool> = LazyLock::new(|| {
    match env::var("SESSION_COOKIE_SECURE") {
        Ok(v) => v.parse::<bool>().unwrap_or(true),
        Err(_) => !env::var("ORIGIN")
            .map(|origin| origin.starts_with("http://"))
            .unwrap_or(false),
    }
});

fn is_production() -> bool {
    env::var("ENVIRONMENT")
        .map(|v| v.eq_ignore_ascii_case("production"))
        .unwrap_or(false)
}

/// Process-wide token signing secret, loaded exactly once.
///
/// A production configuration without a secret is a startup failure; a
/// development run falls back to a fixed key with a loud warning.
pub(super) static SESSION_SECRET: LazyLock<Vec<u8>> = LazyLock::new(|| {
    match env::var("SESSION_SECRET") {
        Ok(secret) if !secret.is_empty() => secret.into_bytes(),
        _ => {
            if is_production() {
                panic!("SESSION_SECRET must be set in a production environment");
            }
            tracing::warn!("SESSION_SECRET not set; using an insecure development fallback");
            b"insecure-development-session-secret".to_vec()
        }
    }
});

#[cfg(test)]
mod tests {
    use std::env;

    fn with_env_var<F, R>(key: &str, value: Option<&str>, test: F) -> R
    where
        F: FnOnce() -> R,
    {
        let original = env::var(key).ok();

        match value {
            Some(val) => unsafe { env::set_var(key, val) },
            None => unsafe { env::remove_var(key) },
        }

        let result = test();

        match original {
            Some(val) => unsafe { env::set_var(key, val) },
            None => unsafe { env::remove_var(key) },
        }

        result
    }

    #[test]
    #[serial_test::serial]
    fn test_session_cookie_name_default() {
        with_env_var("SESSION_COOKIE_NAME", None, || {
            let name = env::var("SESSION_COOKIE_NAME").unwrap_or_else(|_| "session".to_string());
            assert_eq!(name, "session");
        });

        with_env_var("SESSION_COOKIE_NAME", Some("custom_session"), || {
            let name = env::var("SESSION_COOKIE_NAME").unwrap_or_else(|_| "session".to_string());
            assert_eq!(name, "custom_session");
        });
    }

    #[test]
    #[serial_test::serial]
    fn test_session_max_age_default() {
        with_env_var("SESSION_MAX_AGE", None, || {
            let max_age: u64 = env::var("SESSION_MAX_AGE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(604800);
            assert_eq!(max_age, 604800); // 7 days
        });

        with_env_var("SESSION_MAX_AGE", Some("not-a-number"), || {
            let max_age: u64 = env::var("SESSION_MAX_AGE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(604800);
            assert_eq!(max_age, 604800);
        });
    }

    #[test]
    #[serial_test::serial]
    fn test_cookie_secure_derivation() {
        // Plain-http origin means no Secure attribute (development)
        with_env_var("SESSION_COOKIE_SECURE", None, || {
            with_env_var("ORIGIN", Some("http://127.0.0.1:3000"), || {
                let secure = !env::var("ORIGIN")
                    .map(|origin| origin.starts_with("http://"))
                    .unwrap_or(false);
                assert!(!secure);
            });

            with_env_var("ORIGIN", Some("https://example.com"), || {
                let secure = !env::var("ORIGIN")
                    .map(|origin| origin.starts_with("http://"))
                    .unwrap_or(false);
                assert!(secure);
            });
        });
    }
}
