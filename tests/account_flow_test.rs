mod common;

use common::{create_account_service, setup_test_db, TEST_SECRET};
use std::sync::Arc;
use waxstash_backend::errors::{TokenError, UserError};
use waxstash_backend::services::{AccountService, TokenService};
use waxstash_backend::stores::UserStore;
use waxstash_backend::types::internal::TokenPurpose;

#[tokio::test]
async fn test_register_and_confirm_flow() {
    let db = setup_test_db().await;
    let (users, accounts) = create_account_service(&db);

    let registration = accounts
        .register("alice@example.com", "alice", "yolo")
        .await
        .unwrap();
    assert!(!registration.user.confirmed);

    let confirmed_id = accounts
        .confirm_account(&registration.confirmation_token)
        .await
        .unwrap();
    assert_eq!(confirmed_id, registration.user.id);

    let alice = users.get(registration.user.id).await.unwrap();
    assert!(alice.confirmed);
}

#[tokio::test]
async fn test_confirmation_token_verifies_repeatedly_until_expiry() {
    // Tokens are stateless; there is no revocation list, so verifying
    // twice works
    let db = setup_test_db().await;
    let (_users, accounts) = create_account_service(&db);

    let registration = accounts
        .register("alice@example.com", "alice", "yolo")
        .await
        .unwrap();

    accounts
        .confirm_account(&registration.confirmation_token)
        .await
        .unwrap();
    accounts
        .confirm_account(&registration.confirmation_token)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_resend_confirmation_issues_a_working_token() {
    let db = setup_test_db().await;
    let (users, accounts) = create_account_service(&db);

    let registration = accounts
        .register("alice@example.com", "alice", "yolo")
        .await
        .unwrap();

    let token = accounts
        .resend_confirmation(registration.user.id)
        .await
        .unwrap();
    accounts.confirm_account(&token).await.unwrap();

    assert!(users.get(registration.user.id).await.unwrap().confirmed);
}

#[tokio::test]
async fn test_password_reset_flow() {
    let db = setup_test_db().await;
    let (users, accounts) = create_account_service(&db);

    accounts
        .register("alice@example.com", "alice", "yolo")
        .await
        .unwrap();

    let token = accounts
        .request_password_reset("alice@example.com")
        .await
        .unwrap();
    accounts
        .complete_password_reset(&token, "newpass")
        .await
        .unwrap();

    assert!(users
        .verify_password("alice@example.com", "newpass")
        .await
        .is_ok());
    assert!(matches!(
        users.verify_password("alice@example.com", "yolo").await,
        Err(UserError::InvalidCredentials)
    ));
}

#[tokio::test]
async fn test_password_reset_for_unknown_email_fails() {
    let db = setup_test_db().await;
    let (_users, accounts) = create_account_service(&db);

    let result = accounts.request_password_reset("nobody@example.com").await;

    assert!(matches!(result, Err(UserError::EmailNotFound)));
}

#[tokio::test]
async fn test_bad_reset_token_leaves_password_unchanged() {
    let db = setup_test_db().await;
    let (users, accounts) = create_account_service(&db);

    accounts
        .register("alice@example.com", "alice", "yolo")
        .await
        .unwrap();

    let result = accounts.complete_password_reset("bad_token", "newpass").await;

    assert!(matches!(
        result,
        Err(UserError::Token(TokenError::Malformed))
    ));
    assert!(users
        .verify_password("alice@example.com", "yolo")
        .await
        .is_ok());
}

#[tokio::test]
async fn test_expired_reset_token_leaves_password_unchanged() {
    let db = setup_test_db().await;
    let user_store = Arc::new(UserStore::new(db.clone()));
    let token_service = Arc::new(TokenService::new(TEST_SECRET.to_string()));
    let accounts = AccountService::new(Arc::clone(&user_store), Arc::clone(&token_service));

    let registration = accounts
        .register("alice@example.com", "alice", "yolo")
        .await
        .unwrap();

    // A negative ttl dates the expiry into the past
    let expired = token_service
        .issue(TokenPurpose::Reset, registration.user.id, None, -7200)
        .unwrap();

    let result = accounts.complete_password_reset(&expired, "newpass").await;

    assert!(matches!(result, Err(UserError::Token(TokenError::Expired))));
    assert!(user_store
        .verify_password("alice@example.com", "yolo")
        .await
        .is_ok());
}

#[tokio::test]
async fn test_confirm_token_cannot_reset_a_password() {
    let db = setup_test_db().await;
    let (users, accounts) = create_account_service(&db);

    let registration = accounts
        .register("alice@example.com", "alice", "yolo")
        .await
        .unwrap();

    let result = accounts
        .complete_password_reset(&registration.confirmation_token, "newpass")
        .await;

    assert!(matches!(
        result,
        Err(UserError::Token(TokenError::PurposeMismatch))
    ));
    assert!(users
        .verify_password("alice@example.com", "yolo")
        .await
        .is_ok());
}

#[tokio::test]
async fn test_email_change_flow() {
    let db = setup_test_db().await;
    let (users, accounts) = create_account_service(&db);

    let registration = accounts
        .register("alice@example.com", "alice", "yolo")
        .await
        .unwrap();

    let token = accounts
        .request_email_change(registration.user.id, "yolo", "alice@new.example.com")
        .await
        .unwrap();
    accounts.complete_email_change(&token).await.unwrap();

    let alice = users.get(registration.user.id).await.unwrap();
    assert_eq!(alice.email, "alice@new.example.com");
}

#[tokio::test]
async fn test_email_change_request_rechecks_the_password() {
    let db = setup_test_db().await;
    let (_users, accounts) = create_account_service(&db);

    let registration = accounts
        .register("alice@example.com", "alice", "yolo")
        .await
        .unwrap();

    let result = accounts
        .request_email_change(registration.user.id, "wrong", "alice@new.example.com")
        .await;

    assert!(matches!(result, Err(UserError::InvalidCredentials)));
}

#[tokio::test]
async fn test_email_change_to_taken_address_fails_at_completion() {
    let db = setup_test_db().await;
    let (users, accounts) = create_account_service(&db);

    let alice = accounts
        .register("alice@example.com", "alice", "yolo")
        .await
        .unwrap();
    accounts
        .register("bob@example.com", "bob", "yolo")
        .await
        .unwrap();

    let token = accounts
        .request_email_change(alice.user.id, "yolo", "bob@example.com")
        .await
        .unwrap();
    let result = accounts.complete_email_change(&token).await;

    assert!(matches!(result, Err(UserError::DuplicateEmail { .. })));

    let unchanged = users.get(alice.user.id).await.unwrap();
    assert_eq!(unchanged.email, "alice@example.com");
}
