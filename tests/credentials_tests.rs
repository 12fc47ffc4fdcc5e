use axum::response::IntoResponse;
use blog_gate::{
    AppError, InMemoryRepository, Passwords,
    credentials::{register_user, verify_credentials},
    repository::CredentialStore,
};
use std::sync::Arc;

// --- Helpers ---

fn passwords() -> Arc<Passwords> {
    Arc::new(Passwords::new(1024, 1).unwrap())
}

async fn store_with_alice(passwords: &Arc<Passwords>) -> InMemoryRepository {
    let store = InMemoryRepository::new();
    register_user(
        &store,
        passwords,
        "alice".to_string(),
        "pw1".to_string(),
        Some("alice@example.com".to_string()),
        true,
    )
    .await
    .unwrap();
    store
}

async fn error_body(err: AppError) -> (u16, String) {
    let response = err.into_response();
    let status = response.status().as_u16();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

// --- Password Hashing ---

#[test]
fn test_hash_and_verify() {
    let passwords = passwords();
    let hash = passwords.hash("correct horse").unwrap();

    assert!(hash.starts_with("$argon2id$"));
    assert!(passwords.verify("correct horse", &hash));
    assert!(!passwords.verify("Correct horse", &hash));
}

#[test]
fn test_hashes_are_salted() {
    let passwords = passwords();
    let first = passwords.hash("same").unwrap();
    let second = passwords.hash("same").unwrap();

    assert_ne!(first, second);
    assert!(passwords.verify("same", &first));
    assert!(passwords.verify("same", &second));
}

#[test]
fn test_garbage_hash_never_matches() {
    assert!(!passwords().verify("anything", "not-a-phc-string"));
    assert!(!passwords().verify("", ""));
}

#[test]
fn test_invalid_cost_parameters_are_rejected() {
    assert!(matches!(Passwords::new(0, 0), Err(AppError::Internal(_))));
}

// --- Credential Verification ---

#[tokio::test]
async fn test_verify_by_username_and_by_email() {
    let passwords = passwords();
    let store = store_with_alice(&passwords).await;

    let by_name = verify_credentials(&store, &passwords, "alice", "pw1").await.unwrap();
    let by_email = verify_credentials(&store, &passwords, "alice@example.com", "pw1")
        .await
        .unwrap();

    assert_eq!(by_name, by_email);
    assert_eq!(by_name.username, "alice");
    assert!(by_name.admin);
}

#[tokio::test]
async fn test_wrong_password_and_unknown_user_are_indistinguishable() {
    let passwords = passwords();
    let store = store_with_alice(&passwords).await;

    let wrong_password = verify_credentials(&store, &passwords, "alice", "nope")
        .await
        .unwrap_err();
    let unknown_user = verify_credentials(&store, &passwords, "mallory", "pw1")
        .await
        .unwrap_err();

    assert!(matches!(wrong_password, AppError::InvalidCredentials));
    assert!(matches!(unknown_user, AppError::InvalidCredentials));

    let (status_a, body_a) = error_body(wrong_password).await;
    let (status_b, body_b) = error_body(unknown_user).await;
    assert_eq!(status_a, 400);
    assert_eq!((status_a, &body_a), (status_b, &body_b));
    assert!(body_a.contains("Invalid credentials"));
}

#[tokio::test]
async fn test_password_is_stored_hashed() {
    let passwords = passwords();
    let store = store_with_alice(&passwords).await;

    let record = store.find_by_identifier("alice").await.unwrap().unwrap();

    assert_ne!(record.password_hash, "pw1");
    assert!(passwords.verify("pw1", &record.password_hash));
}

#[tokio::test]
async fn test_duplicate_registration_fails_generically() {
    let passwords = passwords();
    let store = store_with_alice(&passwords).await;

    let err = register_user(
        &store,
        &passwords,
        "alice".to_string(),
        "other".to_string(),
        None,
        false,
    )
    .await
    .unwrap_err();

    match err {
        AppError::ValidationFailure(msg) => assert_eq!(msg, "Registration failed"),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_store_outage_is_not_reported_as_bad_credentials() {
    let passwords = passwords();
    let store = InMemoryRepository::new_failing();

    let err = verify_credentials(&store, &passwords, "alice", "pw1")
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::StoreUnavailable(_)));
}
