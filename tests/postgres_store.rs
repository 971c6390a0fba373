//! Store tests against a live PostgreSQL instance.
//!
//! Run with `APP_DATABASE__URL=postgres://... cargo test -- --ignored`.

use chrono::{Duration, Utc};
use idioms_api::error::DatabaseError;
use idioms_api::models::{Idiom, NewUser, RefreshTokenRecord, Tier};
use idioms_api::store::{IdiomStore, RefreshTokenRepository, Stores, UserStore};
use sqlx::PgPool;
use uuid::Uuid;

async fn stores() -> Stores {
    let url = std::env::var("APP_DATABASE__URL").expect("APP_DATABASE__URL must be set");
    let pool = PgPool::connect(&url).await.expect("Failed to connect to Postgres.");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to migrate the database.");
    Stores::postgres(pool)
}

fn unique_email() -> String {
    format!("{}@example.com", Uuid::new_v4())
}

#[tokio::test]
#[ignore]
async fn users_round_trip_and_reject_duplicates() {
    let stores = stores().await;
    let email = unique_email();
    let new_user = || NewUser {
        email: email.clone(),
        password_hash: "hash".to_string(),
        tier: Tier::Premium,
    };

    let user = stores.users.insert(new_user()).await.unwrap();
    assert!(user.is_active);
    let by_id = stores.users.find_by_id(user.id).await.unwrap().unwrap();
    assert_eq!(email, by_id.email);
    assert_eq!(Tier::Premium, by_id.tier);

    match stores.users.insert(new_user()).await {
        Err(DatabaseError::UniqueConstraintViolation(_)) => {}
        other => panic!("expected unique violation, got {:?}", other.map(|u| u.id)),
    }

    stores.users.set_active(user.id, false).await.unwrap();
    let found = stores.users.find_by_email(&email).await.unwrap().unwrap();
    assert!(!found.is_active);
}

#[tokio::test]
#[ignore]
async fn refresh_token_take_is_single_use() {
    let stores = stores().await;
    let user = stores
        .users
        .insert(NewUser {
            email: unique_email(),
            password_hash: "hash".to_string(),
            tier: Tier::Free,
        })
        .await
        .unwrap();
    let record = RefreshTokenRecord {
        user_id: user.id,
        token_hash: Uuid::new_v4().to_string(),
        expires_at: Utc::now() + Duration::days(30),
    };

    stores.refresh_tokens.insert(&record).await.unwrap();

    let taken = stores.refresh_tokens.take(&record.token_hash).await.unwrap();
    assert_eq!(Some(user.id), taken.map(|r| r.user_id));
    assert!(stores.refresh_tokens.take(&record.token_hash).await.unwrap().is_none());
    assert!(!stores.refresh_tokens.delete(&record.token_hash).await.unwrap());
}

#[tokio::test]
#[ignore]
async fn idioms_upsert_and_lookup() {
    let stores = stores().await;
    let marker = Uuid::new_v4().simple().to_string();
    let phrase = format!("q{} under the weather", marker);
    let synonym = format!("sick{}", marker);

    stores
        .idioms
        .upsert(&Idiom::new(&phrase, "Feeling ill.", &[synonym.as_str()]))
        .await
        .unwrap();
    stores
        .idioms
        .upsert(&Idiom::new(&phrase, "Slightly unwell.", &[synonym.as_str()]))
        .await
        .unwrap();

    let found = stores.idioms.search(&marker.to_uppercase(), 10).await.unwrap();
    assert_eq!(1, found.len());
    assert_eq!("Slightly unwell.", found[0].definition);

    let by_synonym = stores.idioms.by_synonym(&format!("SICK{}", marker), 10).await.unwrap();
    assert_eq!(1, by_synonym.len());

    assert!(stores.idioms.random(0.5).await.unwrap().is_some());
    assert!(stores.idioms.sample_exists().await.unwrap());
}
