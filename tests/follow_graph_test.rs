mod common;

use common::{follow_store, record_store, register_user, setup_test_db, test_record, user_store};
use sea_orm::EntityTrait;
use waxstash_backend::errors::FollowError;
use waxstash_backend::types::db::follow;

#[tokio::test]
async fn test_user_follows_themselves_from_creation() {
    let db = setup_test_db().await;
    let users = user_store(&db);
    let follows = follow_store(&db);

    let alice = register_user(&users, "alice@example.com", "alice").await;

    assert!(follows.is_following(alice.id, alice.id).await.unwrap());
}

#[tokio::test]
async fn test_self_unfollow_is_rejected_and_edge_survives() {
    let db = setup_test_db().await;
    let users = user_store(&db);
    let follows = follow_store(&db);

    let alice = register_user(&users, "alice@example.com", "alice").await;

    let result = follows.unfollow(alice.id, alice.id).await;
    assert!(matches!(result, Err(FollowError::SelfUnfollow { .. })));

    assert!(follows.is_following(alice.id, alice.id).await.unwrap());
}

#[tokio::test]
async fn test_follow_is_idempotent() {
    let db = setup_test_db().await;
    let users = user_store(&db);
    let follows = follow_store(&db);

    let alice = register_user(&users, "alice@example.com", "alice").await;
    let bob = register_user(&users, "bob@example.com", "bob").await;

    follows.follow(alice.id, bob.id).await.unwrap();
    follows.follow(alice.id, bob.id).await.unwrap();

    assert!(follows.is_following(alice.id, bob.id).await.unwrap());

    let followers = follows.followers(bob.id).await.unwrap();
    let alice_edges = followers.iter().filter(|id| **id == alice.id).count();
    assert_eq!(alice_edges, 1);
}

#[tokio::test]
async fn test_unfollow_is_idempotent() {
    let db = setup_test_db().await;
    let users = user_store(&db);
    let follows = follow_store(&db);

    let alice = register_user(&users, "alice@example.com", "alice").await;
    let bob = register_user(&users, "bob@example.com", "bob").await;

    follows.follow(alice.id, bob.id).await.unwrap();
    follows.unfollow(alice.id, bob.id).await.unwrap();
    follows.unfollow(alice.id, bob.id).await.unwrap();

    assert!(!follows.is_following(alice.id, bob.id).await.unwrap());
}

#[tokio::test]
async fn test_follow_unknown_user_fails() {
    let db = setup_test_db().await;
    let users = user_store(&db);
    let follows = follow_store(&db);

    let alice = register_user(&users, "alice@example.com", "alice").await;

    let result = follows.follow(alice.id, 9999).await;

    assert!(matches!(result, Err(FollowError::UserNotFound { .. })));
}

#[tokio::test]
async fn test_followed_contains_the_user_themselves() {
    let db = setup_test_db().await;
    let users = user_store(&db);
    let follows = follow_store(&db);

    let alice = register_user(&users, "alice@example.com", "alice").await;
    let bob = register_user(&users, "bob@example.com", "bob").await;
    follows.follow(alice.id, bob.id).await.unwrap();

    let followed = follows.followed(alice.id).await.unwrap();

    assert!(followed.contains(&alice.id));
    assert!(followed.contains(&bob.id));
    assert_eq!(followed.len(), 2);
}

#[tokio::test]
async fn test_self_follow_backfill_repairs_missing_edges() {
    let db = setup_test_db().await;
    let users = user_store(&db);
    let follows = follow_store(&db);

    let alice = register_user(&users, "alice@example.com", "alice").await;

    // Simulate a user predating the invariant by deleting their edge
    follow::Entity::delete_by_id((alice.id, alice.id))
        .exec(&db)
        .await
        .unwrap();
    assert!(!follows.is_following(alice.id, alice.id).await.unwrap());

    let repaired = follows.ensure_all_self_follows().await.unwrap();

    assert_eq!(repaired, 1);
    assert!(follows.is_following(alice.id, alice.id).await.unwrap());

    // Re-running repairs nothing further
    let repaired = follows.ensure_all_self_follows().await.unwrap();
    assert_eq!(repaired, 0);
}

#[tokio::test]
async fn test_follower_records_covers_own_and_followed_only() {
    let db = setup_test_db().await;
    let users = user_store(&db);
    let follows = follow_store(&db);
    let records = record_store(&db);

    let alice = register_user(&users, "alice@example.com", "alice").await;
    let bob = register_user(&users, "bob@example.com", "bob").await;
    let carol = register_user(&users, "carol@example.com", "carol").await;

    follows.follow(alice.id, bob.id).await.unwrap();

    let own = records
        .add_owned(alice.id, test_record("Black Sabbath", "Master of Reality"))
        .await
        .unwrap();
    let followed = records
        .add_owned(bob.id, test_record("Thin Lizzy", "Jailbreak"))
        .await
        .unwrap();
    records
        .add_owned(carol.id, test_record("Budgie", "Never Turn Your Back"))
        .await
        .unwrap();

    let feed = follows.follower_records(alice.id, None).await.unwrap();

    let ids: Vec<i32> = feed.iter().map(|r| r.id).collect();
    assert!(ids.contains(&own.id));
    assert!(ids.contains(&followed.id));
    assert_eq!(ids.len(), 2);

    // Newest first
    assert_eq!(feed[0].id, followed.id);
    assert_eq!(feed[0].owner_username, "bob");
    assert_eq!(feed[0].owner_email, "bob@example.com");
    assert_eq!(feed[0].artist_name, "Thin Lizzy");
}

#[tokio::test]
async fn test_follower_records_is_restartable() {
    let db = setup_test_db().await;
    let users = user_store(&db);
    let follows = follow_store(&db);
    let records = record_store(&db);

    let alice = register_user(&users, "alice@example.com", "alice").await;
    records
        .add_owned(alice.id, test_record("Black Sabbath", "Paranoid"))
        .await
        .unwrap();

    let first = follows.follower_records(alice.id, None).await.unwrap();
    let second = follows.follower_records(alice.id, None).await.unwrap();

    let first_ids: Vec<i32> = first.iter().map(|r| r.id).collect();
    let second_ids: Vec<i32> = second.iter().map(|r| r.id).collect();
    assert_eq!(first_ids, second_ids);
}

#[tokio::test]
async fn test_unfollow_removes_records_from_feed() {
    let db = setup_test_db().await;
    let users = user_store(&db);
    let follows = follow_store(&db);
    let records = record_store(&db);

    let alice = register_user(&users, "alice@example.com", "alice").await;
    let bob = register_user(&users, "bob@example.com", "bob").await;

    follows.follow(alice.id, bob.id).await.unwrap();
    records
        .add_owned(bob.id, test_record("Thin Lizzy", "Jailbreak"))
        .await
        .unwrap();

    assert_eq!(
        follows.follower_records(alice.id, None).await.unwrap().len(),
        1
    );

    follows.unfollow(alice.id, bob.id).await.unwrap();

    assert!(follows
        .follower_records(alice.id, None)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_feed_limit_is_applied() {
    let db = setup_test_db().await;
    let users = user_store(&db);
    let follows = follow_store(&db);
    let records = record_store(&db);

    let alice = register_user(&users, "alice@example.com", "alice").await;

    for i in 0..5 {
        records
            .add_owned(alice.id, test_record("Black Sabbath", &format!("Vol {}", i)))
            .await
            .unwrap();
    }

    let feed = follows.follower_records(alice.id, Some(3)).await.unwrap();

    assert_eq!(feed.len(), 3);
}
