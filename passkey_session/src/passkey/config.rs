use std::{env, sync::LazyLock};

pub(super) static ORIGIN: LazyLock<String> =
    LazyLock::new(|| std::env::var("ORIGIN").expect("ORIGIN must be set"));

pub(super) static PASSKEY_RP_ID: LazyLock<String> = LazyLock::new(|| {
    ORIGIN
        .trim_start_matches("https://")
        .trim_start_matches("http://")
        .split(':')
        .next()
        .map(|s| s.to_string())
        .expect("Could not extract RP ID from ORIGIN")
});

pub(super) static PASSKEY_RP_NAME: LazyLock<String> =
    LazyLock::new(|| env::var("PASSKEY_RP_NAME").ok().unwrap_or(ORIGIN.clone()));

/// Ceremony timeout presented to the browser, in seconds.
pub(super) static PASSKEY_TIMEOUT: LazyLock<u32> = LazyLock::new(|| {
    env::var("PASSKEY_TIMEOUT")
        .map(|v| v.parse::<u32>().unwrap_or(60))
        .unwrap_or(60)
});

/// Lifetime of a stored challenge, in seconds.
pub(super) static PASSKEY_CHALLENGE_TIMEOUT: LazyLock<u32> = LazyLock::new(|| {
    env::var("PASSKEY_CHALLENGE_TIMEOUT")
        .map(|v| v.parse::<u32>().unwrap_or(300))
        .unwrap_or(300)
});

pub(super) static PASSKEY_ATTESTATION: LazyLock<String> =
    LazyLock::new(|| match env::var("PASSKEY_ATTESTATION").ok() {
        None => "none".to_string(),
        Some(v) => match v.to_lowercase().as_str() {
            "none" => "none".to_string(),
            "direct" => "direct".to_string(),
            "indirect" => "indirect".to_string(),
            invalid => {
                tracing::warn!("Invalid attestation: {}. Using default 'none'", invalid);
                "none".to_string()
            }
        },
    });

pub(super) static PASSKEY_AUTHENTICATOR_ATTACHMENT: LazyLock<String> = LazyLock::new(|| {
    match env::var("PASSKEY_AUTHENTICATOR_ATTACHMENT").ok() {
        None => "platform".to_string(),
        Some(v) => match v.to_lowercase().as_str() {
            "platform" => "platform".to_string(),
            "cross-platform" => "cross-platform".to_string(),
            invalid => {
                tracing::warn!(
                    "Invalid authenticator attachment: {}. Using default 'platform'",
                    invalid
                );
                "platform".to_string()
            }
        },
    }
});

pub(super) static PASSKEY_RESIDENT_KEY: LazyLock<String> = LazyLock::new(|| {
    env::var("PASSKEY_RESIDENT_KEY").map_or("required".to_string(), |v| {
        match v.to_lowercase().as_str() {
            "required" => "required".to_string(),
            "preferred" => "preferred".to_string(),
            "discouraged" => "discouraged".to_string(),
            _ => {
                tracing::warn!("Invalid resident key: {}. Using default 'required'", v);
                "required".to_string()
            }
        }
    })
});

pub(super) static PASSKEY_REQUIRE_RESIDENT_KEY: LazyLock<bool> = LazyLock::new(|| {
    env::var("PASSKEY_REQUIRE_RESIDENT_KEY").map_or(true, |v| match v.to_lowercase().as_str() {
        "true" => true,
        "false" => false,
        invalid => {
            tracing::warn!(
                "Invalid require_resident_key: {}. Using default 'true'",
                invalid
            );
            true
        }
    })
});

pub(super) static PASSKEY_USER_VERIFICATION: LazyLock<String> = LazyLock::new(|| {
    env::var("PASSKEY_USER_VERIFICATION").map_or("preferred".to_string(), |v| {
        match v.to_lowercase().as_str() {
            "required" => "required".to_string(),
            "preferred" => "preferred".to_string(),
            "discouraged" => "discouraged".to_string(),
            _ => {
                tracing::warn!("Invalid user verification: {}. Using default 'preferred'", v);
                "preferred".to_string()
            }
        }
    })
});

/// Whether a signature counter stuck at zero is accepted. Some
/// authenticators never increment and always report 0.
pub(super) static PASSKEY_ALLOW_ZERO_COUNTER: LazyLock<bool> = LazyLock::new(|| {
    env::var("PASSKEY_ALLOW_ZERO_COUNTER")
        .map(|v| v.parse::<bool>().unwrap_or(true))
        .unwrap_or(true)
});

/// Whether registering an already-known credential id replaces the stored
/// record. Off by default: a collision is a conflict, never a silent
/// overwrite.
pub(super) static PASSKEY_ALLOW_CREDENTIAL_OVERWRITE: LazyLock<bool> = LazyLock::new(|| {
    env::var("PASSKEY_ALLOW_CREDENTIAL_OVERWRITE")
        .map(|v| v.parse::<bool>().unwrap_or(false))
        .unwrap_or(false)
});

#[cfg(test)]
mod tests {
    use std::env;

    /// Run `test` with `key` temporarily set (or removed), restoring the
    /// original value afterward.
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
    fn test_challenge_timeout_default() {
        with_env_var("PASSKEY_CHALLENGE_TIMEOUT", None, || {
            let value = env::var("PASSKEY_CHALLENGE_TIMEOUT")
                .map(|v| v.parse::<u32>().unwrap_or(300))
                .unwrap_or(300);
            assert_eq!(value, 300); // 5 minutes
        });

        with_env_var("PASSKEY_CHALLENGE_TIMEOUT", Some("invalid"), || {
            let value = env::var("PASSKEY_CHALLENGE_TIMEOUT")
                .map(|v| v.parse::<u32>().unwrap_or(300))
                .unwrap_or(300);
            assert_eq!(value, 300); // falls back on unparseable input
        });
    }

    #[test]
    #[serial_test::serial]
    fn test_zero_counter_policy_parsing() {
        with_env_var("PASSKEY_ALLOW_ZERO_COUNTER", None, || {
            let value = env::var("PASSKEY_ALLOW_ZERO_COUNTER")
                .map(|v| v.parse::<bool>().unwrap_or(true))
                .unwrap_or(true);
            assert!(value);
        });

        with_env_var("PASSKEY_ALLOW_ZERO_COUNTER", Some("false"), || {
            let value = env::var("PASSKEY_ALLOW_ZERO_COUNTER")
                .map(|v| v.parse::<bool>().unwrap_or(true))
                .unwrap_or(true);
            assert!(!value);
        });
    }

    #[test]
    #[serial_test::serial]
    fn test_rp_id_extraction_logic() {
        // Mirror the derivation used by PASSKEY_RP_ID
        let derive = |origin: &str| {
            origin
                .trim_start_matches("https://")
                .trim_start_matches("http://")
                .split(':')
                .next()
                .map(|s| s.to_string())
                .unwrap()
        };

        assert_eq!(derive("https://example.com"), "example.com");
        assert_eq!(derive("http://127.0.0.1:3000"), "127.0.0.1");
        assert_eq!(derive("https://auth.example.com:8443"), "auth.example.com");
    }
}
