//! End-to-end ceremony tests driven through the coordination API with a
//! synthetic authenticator holding a real P-256 keypair.

mod common;

use common::webauthn::SyntheticAuthenticator;
use http::header::{COOKIE, SET_COOKIE};
use passkey_session::{
    CoordinationError, PasskeyCredential, PasskeyError, RegistrationStartRequest,
    RegistrationVerifyRequest, SESSION_COOKIE_NAME, authenticate_request_core,
    delete_passkey_credential_core, handle_finish_authentication_core,
    handle_finish_registration_core, handle_start_authentication_core,
    handle_start_registration_core, list_credentials_core, validate_session_token,
};

const DB_PATH: &str = "/tmp/passkey_session_flows_test.db";

async fn setup() {
    common::init_test_environment(DB_PATH).await;
}

/// Start a registration ceremony and pull the ceremony id + challenge out
/// of the returned options, as a client would.
async fn start_registration(user_id: &str) -> (String, String) {
    let options = handle_start_registration_core(RegistrationStartRequest {
        user_id: user_id.to_string(),
        email: format!("{user_id}@example.com"),
        display_name: format!("User {user_id}"),
    })
    .await
    .expect("Failed to start registration");

    let options = serde_json::to_value(&options).unwrap();
    (
        options["ceremonyId"].as_str().unwrap().to_string(),
        options["challenge"].as_str().unwrap().to_string(),
    )
}

async fn start_authentication() -> (String, String) {
    let options = handle_start_authentication_core(None)
        .await
        .expect("Failed to start authentication");

    let options = serde_json::to_value(&options).unwrap();
    (
        options["ceremonyId"].as_str().unwrap().to_string(),
        options["challenge"].as_str().unwrap().to_string(),
    )
}

async fn verify_registration(
    user_id: &str,
    response: serde_json::Value,
) -> Result<PasskeyCredential, CoordinationError> {
    let request: RegistrationVerifyRequest = serde_json::from_value(serde_json::json!({
        "userId": user_id,
        "response": response,
    }))
    .unwrap();
    handle_finish_registration_core(request).await
}

async fn register(user_id: &str, authenticator: &SyntheticAuthenticator) -> PasskeyCredential {
    let (ceremony_id, challenge) = start_registration(user_id).await;
    let response = authenticator.registration_response(&ceremony_id, &challenge);
    verify_registration(user_id, response)
        .await
        .expect("Registration should succeed")
}

async fn authenticate(
    authenticator: &SyntheticAuthenticator,
    counter: u32,
) -> Result<(String, u32, http::HeaderMap), CoordinationError> {
    let (ceremony_id, challenge) = start_authentication().await;
    let response = authenticator.assertion_response(&ceremony_id, &challenge, counter);
    handle_finish_authentication_core(serde_json::from_value(response).unwrap()).await
}

fn session_cookie(headers: &http::HeaderMap) -> String {
    let set_cookie = headers.get(SET_COOKIE).unwrap().to_str().unwrap();
    let pair = set_cookie.split(';').next().unwrap();
    pair.strip_prefix(&format!("{}=", SESSION_COOKIE_NAME.as_str()))
        .expect("session cookie missing")
        .to_string()
}

#[tokio::test]
async fn test_register_then_authenticate_full_flow() {
    setup().await;

    let authenticator = SyntheticAuthenticator::new();
    let credential = register("flow-user", &authenticator).await;

    assert_eq!(credential.user_id, "flow-user");
    assert_eq!(credential.counter, 0);
    assert_eq!(credential.credential_id, authenticator.credential_id_b64());

    let (user_id, new_counter, headers) = authenticate(&authenticator, 1)
        .await
        .expect("Authentication should succeed");

    assert_eq!(user_id, "flow-user");
    assert_eq!(new_counter, 1);

    // The minted cookie carries a valid passkey session
    let token = session_cookie(&headers);
    let claims = validate_session_token(&token).unwrap();
    assert_eq!(claims.sub, "flow-user");
    assert_eq!(claims.auth_method, "passkey");
}

#[tokio::test]
async fn test_registration_challenge_is_single_use() {
    setup().await;

    let authenticator = SyntheticAuthenticator::new();
    let user_id = "single-use-user";
    let (ceremony_id, challenge) = start_registration(user_id).await;
    let response = authenticator.registration_response(&ceremony_id, &challenge);

    verify_registration(user_id, response.clone())
        .await
        .expect("First verification should succeed");

    // The same ceremony id cannot verify twice
    match verify_registration(user_id, response).await {
        Err(CoordinationError::Passkey(PasskeyError::NotFound(_))) => {}
        other => panic!("Expected challenge NotFound, got {other:?}"),
    }
}

#[tokio::test]
async fn test_registration_with_tampered_challenge_creates_nothing() {
    setup().await;

    let authenticator = SyntheticAuthenticator::new();
    let user_id = "tamper-user";
    let (ceremony_id, _challenge) = start_registration(user_id).await;

    // The client responds to a challenge the server never issued
    let response = authenticator.registration_response(&ceremony_id, "attacker-chosen-challenge");

    match verify_registration(user_id, response).await {
        Err(CoordinationError::Passkey(PasskeyError::Challenge(_))) => {}
        other => panic!("Expected Challenge error, got {other:?}"),
    }

    // No credential record may exist
    let listed = list_credentials_core(user_id).await.unwrap();
    assert!(listed.is_empty());

    // The failed registration consumed the challenge; a corrected replay
    // must restart the ceremony
    let response = authenticator.registration_response(&ceremony_id, "anything");
    match verify_registration(user_id, response).await {
        Err(CoordinationError::Passkey(PasskeyError::NotFound(_))) => {}
        other => panic!("Expected NotFound after consumed challenge, got {other:?}"),
    }
}

#[tokio::test]
async fn test_counter_replay_is_detected() {
    setup().await;

    let authenticator = SyntheticAuthenticator::new();
    register("replay-user", &authenticator).await;

    // Counter 0 -> 1 succeeds
    let (_, new_counter, _) = authenticate(&authenticator, 1).await.unwrap();
    assert_eq!(new_counter, 1);

    // A cloned authenticator replays counter 1 in a fresh ceremony
    match authenticate(&authenticator, 1).await {
        Err(CoordinationError::Passkey(PasskeyError::CounterRegression { stored, received })) => {
            assert_eq!((stored, received), (1, 1));
        }
        other => panic!("Expected CounterRegression, got {other:?}"),
    }

    // A decreasing counter is also a regression
    match authenticate(&authenticator, 0).await {
        Err(CoordinationError::Passkey(PasskeyError::CounterRegression { .. })) => {}
        other => panic!("Expected CounterRegression, got {other:?}"),
    }

    // The stored counter was not corrupted by the replays
    let (_, new_counter, _) = authenticate(&authenticator, 2).await.unwrap();
    assert_eq!(new_counter, 2);
}

#[tokio::test]
async fn test_zero_counter_authenticator_stays_accepted() {
    setup().await;

    let authenticator = SyntheticAuthenticator::new();
    register("zero-counter-user", &authenticator).await;

    // Authenticators without counter support report zero forever
    let (_, counter, _) = authenticate(&authenticator, 0).await.unwrap();
    assert_eq!(counter, 0);

    let (_, counter, _) = authenticate(&authenticator, 0).await.unwrap();
    assert_eq!(counter, 0);
}

#[tokio::test]
async fn test_failed_signature_leaves_challenge_for_retry() {
    setup().await;

    let authenticator = SyntheticAuthenticator::new();
    register("retry-user", &authenticator).await;

    let (ceremony_id, challenge) = start_authentication().await;

    // An impostor key signs under the victim's credential id
    let impostor = SyntheticAuthenticator::new();
    let mut forged = impostor.assertion_response(&ceremony_id, &challenge, 1);
    forged["id"] = serde_json::json!(authenticator.credential_id_b64());
    forged["rawId"] = serde_json::json!(authenticator.credential_id_b64());

    match handle_finish_authentication_core(serde_json::from_value(forged).unwrap()).await {
        Err(CoordinationError::Passkey(PasskeyError::Verification(_))) => {}
        other => panic!("Expected Verification error, got {other:?}"),
    }

    // The challenge survives a failed attempt: the real authenticator can
    // still complete the same ceremony within the TTL window
    let response = authenticator.assertion_response(&ceremony_id, &challenge, 1);
    let (user_id, _, _) = handle_finish_authentication_core(serde_json::from_value(response).unwrap())
        .await
        .expect("Retry within the window should succeed");
    assert_eq!(user_id, "retry-user");
}

#[tokio::test]
async fn test_list_returns_newest_first_without_key_material() {
    setup().await;

    let first = SyntheticAuthenticator::new();
    let second = SyntheticAuthenticator::new();

    let first_credential = register("list-user", &first).await;
    // Ensure distinct creation timestamps
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    let second_credential = register("list-user", &second).await;

    let listed = list_credentials_core("list-user").await.unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].id, second_credential.id);
    assert_eq!(listed[1].id, first_credential.id);

    for info in &listed {
        let json = serde_json::to_value(info).unwrap();
        assert!(json.get("publicKey").is_none());
        assert!(json.get("public_key").is_none());
        assert!(json.get("credentialId").is_none());
        assert!(json["deviceName"].is_string());
    }
}

#[tokio::test]
async fn test_cross_user_delete_is_forbidden() {
    setup().await;

    let authenticator = SyntheticAuthenticator::new();
    let credential = register("delete-owner", &authenticator).await;

    match delete_passkey_credential_core("delete-intruder", &credential.id).await {
        Err(CoordinationError::Forbidden) => {}
        other => panic!("Expected Forbidden, got {other:?}"),
    }

    // Record untouched
    let listed = list_credentials_core("delete-owner").await.unwrap();
    assert_eq!(listed.len(), 1);

    delete_passkey_credential_core("delete-owner", &credential.id)
        .await
        .unwrap();
    assert!(list_credentials_core("delete-owner").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_authentication_with_unknown_credential() {
    setup().await;

    let stranger = SyntheticAuthenticator::new();
    match authenticate(&stranger, 1).await {
        Err(CoordinationError::Passkey(PasskeyError::NotFound(msg))) => {
            assert!(msg.contains("Credential"));
        }
        other => panic!("Expected CredentialNotFound, got {other:?}"),
    }
}

#[tokio::test]
async fn test_duplicate_credential_id_registration_conflicts() {
    setup().await;

    let authenticator = SyntheticAuthenticator::new();
    register("conflict-user", &authenticator).await;

    // The same authenticator answers a second ceremony with the same
    // credential id
    let (ceremony_id, challenge) = start_registration("conflict-user").await;
    let response = authenticator.registration_response(&ceremony_id, &challenge);

    match verify_registration("conflict-user", response).await {
        Err(CoordinationError::Passkey(PasskeyError::Conflict(_))) => {}
        other => panic!("Expected Conflict, got {other:?}"),
    }

    // Still exactly one stored credential
    let listed = list_credentials_core("conflict-user").await.unwrap();
    assert_eq!(listed.len(), 1);
}

#[tokio::test]
async fn test_session_cookie_authenticates_requests() {
    setup().await;

    let authenticator = SyntheticAuthenticator::new();
    register("cookie-user", &authenticator).await;

    let (_, _, headers) = authenticate(&authenticator, 1).await.unwrap();
    let token = session_cookie(&headers);

    let mut request_headers = http::HeaderMap::new();
    request_headers.insert(
        COOKIE,
        format!("{}={}", SESSION_COOKIE_NAME.as_str(), token)
            .parse()
            .unwrap(),
    );

    let claims = authenticate_request_core(&request_headers).unwrap();
    assert_eq!(claims.sub, "cookie-user");
    assert_eq!(claims.auth_method, "passkey");
}
