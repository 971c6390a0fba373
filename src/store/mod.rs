/// Persistence layer
///
/// The auth core only needs a handful of primitives from its backing store:
/// point lookups, inserts, deletes and an atomic find-and-delete for refresh
/// tokens. Those primitives are expressed as traits so the same core runs on
/// PostgreSQL in production and on an in-memory backend in tests.

mod memory;
mod postgres;

use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::DatabaseError;
use crate::models::{Idiom, NewUser, RefreshTokenRecord, User};

pub use memory::InMemoryStore;
pub use postgres::PostgresStore;

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, DatabaseError>;

    /// Persists a new user and assigns its id.
    ///
    /// Fails with `UniqueConstraintViolation` when the email is taken.
    async fn insert(&self, user: NewUser) -> Result<User, DatabaseError>;

    /// Out-of-band activation switch; no auth endpoint calls this.
    async fn set_active(&self, id: Uuid, is_active: bool) -> Result<(), DatabaseError>;
}

#[async_trait]
pub trait RefreshTokenRepository: Send + Sync {
    async fn insert(&self, record: &RefreshTokenRecord) -> Result<(), DatabaseError>;

    /// Finds the record with this hash and deletes it in one atomic step.
    ///
    /// Of any number of concurrent callers presenting the same hash, at most
    /// one receives `Some`.
    async fn take(&self, token_hash: &str) -> Result<Option<RefreshTokenRecord>, DatabaseError>;

    /// Returns whether a record was removed
    async fn delete(&self, token_hash: &str) -> Result<bool, DatabaseError>;
}

#[async_trait]
pub trait IdiomStore: Send + Sync {
    /// Case-insensitive substring match on the phrase
    async fn search(&self, phrase: &str, limit: i64) -> Result<Vec<Idiom>, DatabaseError>;

    /// Phrases starting with `letter` (any case), alphabetical
    async fn starting_with(&self, letter: char, limit: i64) -> Result<Vec<Idiom>, DatabaseError>;

    /// Case-insensitive substring match on any synonym
    async fn by_synonym(&self, synonym: &str, limit: i64) -> Result<Vec<Idiom>, DatabaseError>;

    /// First entry whose randomizer value is >= `pivot`, wrapping to the lowest
    async fn random(&self, pivot: f64) -> Result<Option<Idiom>, DatabaseError>;

    /// Inserts or replaces the entry with the same phrase
    async fn upsert(&self, idiom: &Idiom) -> Result<(), DatabaseError>;

    async fn sample_exists(&self) -> Result<bool, DatabaseError>;
}

/// Store handles shared by the whole application
#[derive(Clone)]
pub struct Stores {
    pub users: Arc<dyn UserStore>,
    pub refresh_tokens: Arc<dyn RefreshTokenRepository>,
    pub idioms: Arc<dyn IdiomStore>,
}

impl Stores {
    /// Uses one backend for every collection
    pub fn from_backend<B>(backend: Arc<B>) -> Self
    where
        B: UserStore + RefreshTokenRepository + IdiomStore + 'static,
    {
        Self {
            users: backend.clone(),
            refresh_tokens: backend.clone(),
            idioms: backend,
        }
    }

    pub fn postgres(pool: sqlx::PgPool) -> Self {
        Self::from_backend(Arc::new(PostgresStore::new(pool)))
    }

    pub fn in_memory() -> Self {
        Self::from_backend(Arc::new(InMemoryStore::default()))
    }
}
