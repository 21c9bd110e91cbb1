mod common;

use std::sync::Arc;

use chrono::{Duration, Utc};

use keystone::models::NewUser;
use keystone::store::{CredentialStore, PgStore, StoreError};

fn alice(password_hash: &str) -> NewUser<'_> {
    NewUser {
        email: "alice@example.com",
        password_hash,
        first_name: "Alice",
        last_name: "Liddell",
    }
}

#[tokio::test]
async fn duplicate_email_hits_unique_constraint() {
    let Some(db) = common::create_test_db().await else {
        eprintln!("DATABASE_URL not set, skipping");
        return;
    };
    let store = PgStore::new(db.pool.clone());

    let user = store.create_user(alice("hash-1")).await.unwrap();
    assert_eq!(user.email, "alice@example.com");
    assert_eq!(user.created_at, user.updated_at);

    let err = store.create_user(alice("hash-2")).await.unwrap_err();
    match err {
        StoreError::UniqueViolation(constraint) => assert_eq!(constraint, "users_email_key"),
        other => panic!("expected unique violation, got {other:?}"),
    }

    common::cleanup(db).await;
}

#[tokio::test]
async fn reset_token_round_trip_and_single_consumption() {
    let Some(db) = common::create_test_db().await else {
        eprintln!("DATABASE_URL not set, skipping");
        return;
    };
    let store = PgStore::new(db.pool.clone());
    let user = store.create_user(alice("hash-1")).await.unwrap();

    let token = store
        .create_reset_token(user.id, "digest", Utc::now() + Duration::hours(24))
        .await
        .unwrap();
    assert!(!token.used);

    let found = store.find_reset_token("digest").await.unwrap().unwrap();
    assert_eq!(found.id, token.id);
    assert!(store.find_reset_token("other").await.unwrap().is_none());

    assert!(store.consume_reset_token(token.id, user.id, "hash-2").await.unwrap());
    assert!(!store.consume_reset_token(token.id, user.id, "hash-3").await.unwrap());

    let user = store.find_user_by_id(user.id).await.unwrap().unwrap();
    assert_eq!(user.password_hash, "hash-2");
    assert!(store.find_reset_token("digest").await.unwrap().unwrap().used);

    common::cleanup(db).await;
}

#[tokio::test]
async fn failed_password_write_rolls_back_consumption() {
    let Some(db) = common::create_test_db().await else {
        eprintln!("DATABASE_URL not set, skipping");
        return;
    };
    let store = PgStore::new(db.pool.clone());
    let user = store.create_user(alice("hash-1")).await.unwrap();
    let token = store
        .create_reset_token(user.id, "digest", Utc::now() + Duration::hours(24))
        .await
        .unwrap();

    // Wrong owner id: the password update matches no row, so the whole
    // transaction must roll back.
    let err = store
        .consume_reset_token(token.id, uuid::Uuid::now_v7(), "hash-2")
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Database(_)));
    assert!(!store.find_reset_token("digest").await.unwrap().unwrap().used);

    common::cleanup(db).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_consumers_race_for_one_token() {
    let Some(db) = common::create_test_db().await else {
        eprintln!("DATABASE_URL not set, skipping");
        return;
    };
    let store = Arc::new(PgStore::new(db.pool.clone()));
    let user = store.create_user(alice("hash-1")).await.unwrap();
    let token = store
        .create_reset_token(user.id, "digest", Utc::now() + Duration::hours(24))
        .await
        .unwrap();

    let (token_id, user_id) = (token.id, user.id);
    let mut handles = Vec::new();
    for i in 0..4 {
        let store = store.clone();
        handles.push(tokio::spawn(async move {
            store
                .consume_reset_token(token_id, user_id, &format!("hash-{i}"))
                .await
                .unwrap()
        }));
    }

    let mut successes = 0;
    for handle in handles {
        if handle.await.unwrap() {
            successes += 1;
        }
    }
    assert_eq!(successes, 1);

    common::cleanup(db).await;
}
