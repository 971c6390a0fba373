use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

use super::{IdiomStore, RefreshTokenRepository, UserStore};
use crate::error::DatabaseError;
use crate::models::{Idiom, NewUser, RefreshTokenRecord, User};

/// Process-local backend with the same contract as the PostgreSQL store.
///
/// Each collection sits behind its own mutex and no lock is held across an
/// await point, so every operation is atomic with respect to the others.
#[derive(Default)]
pub struct InMemoryStore {
    users: Mutex<HashMap<Uuid, User>>,
    refresh_tokens: Mutex<HashMap<String, RefreshTokenRecord>>,
    idioms: Mutex<Vec<Idiom>>,
}

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, DatabaseError> {
    mutex
        .lock()
        .map_err(|_| DatabaseError::UnexpectedError("in-memory store lock poisoned".to_string()))
}

fn take_limit(matches: impl Iterator<Item = Idiom>, limit: i64) -> Vec<Idiom> {
    matches.take(usize::try_from(limit).unwrap_or(0)).collect()
}

#[async_trait]
impl UserStore for InMemoryStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError> {
        let users = lock(&self.users)?;
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, DatabaseError> {
        Ok(lock(&self.users)?.get(&id).cloned())
    }

    async fn insert(&self, user: NewUser) -> Result<User, DatabaseError> {
        let mut users = lock(&self.users)?;
        if users.values().any(|u| u.email == user.email) {
            return Err(DatabaseError::UniqueConstraintViolation(
                "users.email".to_string(),
            ));
        }

        let user = User {
            id: Uuid::new_v4(),
            email: user.email,
            password_hash: user.password_hash,
            tier: user.tier,
            is_active: true,
            created_at: Utc::now(),
        };
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn set_active(&self, id: Uuid, is_active: bool) -> Result<(), DatabaseError> {
        let mut users = lock(&self.users)?;
        let user = users
            .get_mut(&id)
            .ok_or_else(|| DatabaseError::NotFound("User not found".to_string()))?;
        user.is_active = is_active;
        Ok(())
    }
}

#[async_trait]
impl RefreshTokenRepository for InMemoryStore {
    async fn insert(&self, record: &RefreshTokenRecord) -> Result<(), DatabaseError> {
        let mut tokens = lock(&self.refresh_tokens)?;
        if tokens.contains_key(&record.token_hash) {
            return Err(DatabaseError::UniqueConstraintViolation(
                "refresh_tokens.token_hash".to_string(),
            ));
        }
        tokens.insert(record.token_hash.clone(), record.clone());
        Ok(())
    }

    async fn take(&self, token_hash: &str) -> Result<Option<RefreshTokenRecord>, DatabaseError> {
        Ok(lock(&self.refresh_tokens)?.remove(token_hash))
    }

    async fn delete(&self, token_hash: &str) -> Result<bool, DatabaseError> {
        Ok(lock(&self.refresh_tokens)?.remove(token_hash).is_some())
    }
}

#[async_trait]
impl IdiomStore for InMemoryStore {
    async fn search(&self, phrase: &str, limit: i64) -> Result<Vec<Idiom>, DatabaseError> {
        let needle = phrase.to_lowercase();
        let idioms = lock(&self.idioms)?;
        Ok(take_limit(
            idioms
                .iter()
                .filter(|i| i.idiom.to_lowercase().contains(&needle))
                .cloned(),
            limit,
        ))
    }

    async fn starting_with(&self, letter: char, limit: i64) -> Result<Vec<Idiom>, DatabaseError> {
        let letter = letter.to_ascii_lowercase();
        let mut matches: Vec<Idiom> = lock(&self.idioms)?
            .iter()
            .filter(|i| {
                i.idiom
                    .chars()
                    .next()
                    .map_or(false, |c| c.to_ascii_lowercase() == letter)
            })
            .cloned()
            .collect();
        matches.sort_by(|a, b| a.idiom.cmp(&b.idiom));
        Ok(take_limit(matches.into_iter(), limit))
    }

    async fn by_synonym(&self, synonym: &str, limit: i64) -> Result<Vec<Idiom>, DatabaseError> {
        let needle = synonym.to_lowercase();
        let idioms = lock(&self.idioms)?;
        Ok(take_limit(
            idioms
                .iter()
                .filter(|i| i.synonyms.iter().any(|s| s.to_lowercase().contains(&needle)))
                .cloned(),
            limit,
        ))
    }

    async fn random(&self, pivot: f64) -> Result<Option<Idiom>, DatabaseError> {
        let idioms = lock(&self.idioms)?;
        let by_randomizer = |a: &&Idiom, b: &&Idiom| a.randomizer_id.total_cmp(&b.randomizer_id);

        let picked = idioms
            .iter()
            .filter(|i| i.randomizer_id >= pivot)
            .min_by(by_randomizer)
            .or_else(|| idioms.iter().min_by(by_randomizer));
        Ok(picked.cloned())
    }

    async fn upsert(&self, idiom: &Idiom) -> Result<(), DatabaseError> {
        let mut idioms = lock(&self.idioms)?;
        match idioms.iter_mut().find(|i| i.idiom == idiom.idiom) {
            Some(existing) => *existing = idiom.clone(),
            None => idioms.push(idiom.clone()),
        }
        Ok(())
    }

    async fn sample_exists(&self) -> Result<bool, DatabaseError> {
        Ok(!lock(&self.idioms)?.is_empty())
    }
}
