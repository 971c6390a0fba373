use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::{IdiomStore, RefreshTokenRepository, UserStore};
use crate::error::DatabaseError;
use crate::models::{Idiom, NewUser, RefreshTokenRecord, Tier, User};

type UserRow = (Uuid, String, String, String, bool, DateTime<Utc>);
type IdiomRow = (String, String, Vec<String>, Option<String>, f64);

/// PostgreSQL backend; schema lives in `migrations/`
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn user_from_row(row: UserRow) -> Result<User, DatabaseError> {
    let (id, email, password_hash, tier, is_active, created_at) = row;
    let tier = tier
        .parse::<Tier>()
        .map_err(DatabaseError::UnexpectedError)?;
    Ok(User {
        id,
        email,
        password_hash,
        tier,
        is_active,
        created_at,
    })
}

fn idiom_from_row(row: IdiomRow) -> Idiom {
    let (idiom, definition, synonyms, example, randomizer_id) = row;
    Idiom {
        idiom,
        definition,
        synonyms,
        example,
        randomizer_id,
    }
}

/// Escapes LIKE metacharacters so user input only ever matches literally
fn contains_pattern(fragment: &str) -> String {
    let mut escaped = String::with_capacity(fragment.len() + 2);
    escaped.push('%');
    for c in fragment.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

#[async_trait]
impl UserStore for PostgresStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError> {
        sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, email, password_hash, tier, is_active, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?
        .map(user_from_row)
        .transpose()
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, DatabaseError> {
        sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, email, password_hash, tier, is_active, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .map(user_from_row)
        .transpose()
    }

    async fn insert(&self, user: NewUser) -> Result<User, DatabaseError> {
        let user = User {
            id: Uuid::new_v4(),
            email: user.email,
            password_hash: user.password_hash,
            tier: user.tier,
            is_active: true,
            created_at: Utc::now(),
        };

        sqlx::query(
            r#"
            INSERT INTO users (id, email, password_hash, tier, is_active, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.tier.as_str())
        .bind(user.is_active)
        .bind(user.created_at)
        .execute(&self.pool)
        .await?;

        Ok(user)
    }

    async fn set_active(&self, id: Uuid, is_active: bool) -> Result<(), DatabaseError> {
        let result = sqlx::query("UPDATE users SET is_active = $1 WHERE id = $2")
            .bind(is_active)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound("User not found".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl RefreshTokenRepository for PostgresStore {
    async fn insert(&self, record: &RefreshTokenRecord) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            INSERT INTO refresh_tokens (token_hash, user_id, expires_at, created_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(&record.token_hash)
        .bind(record.user_id)
        .bind(record.expires_at)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn take(&self, token_hash: &str) -> Result<Option<RefreshTokenRecord>, DatabaseError> {
        // Single statement: concurrent callers cannot both see the row
        let row = sqlx::query_as::<_, (Uuid, String, DateTime<Utc>)>(
            r#"
            DELETE FROM refresh_tokens
            WHERE token_hash = $1
            RETURNING user_id, token_hash, expires_at
            "#,
        )
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(user_id, token_hash, expires_at)| RefreshTokenRecord {
            user_id,
            token_hash,
            expires_at,
        }))
    }

    async fn delete(&self, token_hash: &str) -> Result<bool, DatabaseError> {
        let result = sqlx::query("DELETE FROM refresh_tokens WHERE token_hash = $1")
            .bind(token_hash)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl IdiomStore for PostgresStore {
    async fn search(&self, phrase: &str, limit: i64) -> Result<Vec<Idiom>, DatabaseError> {
        let rows = sqlx::query_as::<_, IdiomRow>(
            r#"
            SELECT idiom, definition, synonyms, example, randomizer_id
            FROM idioms
            WHERE idiom ILIKE $1 ESCAPE '\'
            ORDER BY idiom
            LIMIT $2
            "#,
        )
        .bind(contains_pattern(phrase))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(idiom_from_row).collect())
    }

    async fn starting_with(&self, letter: char, limit: i64) -> Result<Vec<Idiom>, DatabaseError> {
        let rows = sqlx::query_as::<_, IdiomRow>(
            r#"
            SELECT idiom, definition, synonyms, example, randomizer_id
            FROM idioms
            WHERE lower(left(idiom, 1)) = $1
            ORDER BY idiom
            LIMIT $2
            "#,
        )
        .bind(letter.to_ascii_lowercase().to_string())
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(idiom_from_row).collect())
    }

    async fn by_synonym(&self, synonym: &str, limit: i64) -> Result<Vec<Idiom>, DatabaseError> {
        let rows = sqlx::query_as::<_, IdiomRow>(
            r#"
            SELECT idiom, definition, synonyms, example, randomizer_id
            FROM idioms
            WHERE EXISTS (
                SELECT 1 FROM unnest(synonyms) AS s WHERE s ILIKE $1 ESCAPE '\'
            )
            ORDER BY idiom
            LIMIT $2
            "#,
        )
        .bind(contains_pattern(synonym))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(idiom_from_row).collect())
    }

    async fn random(&self, pivot: f64) -> Result<Option<Idiom>, DatabaseError> {
        let above = sqlx::query_as::<_, IdiomRow>(
            r#"
            SELECT idiom, definition, synonyms, example, randomizer_id
            FROM idioms
            WHERE randomizer_id >= $1
            ORDER BY randomizer_id
            LIMIT 1
            "#,
        )
        .bind(pivot)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(row) = above {
            return Ok(Some(idiom_from_row(row)));
        }

        let lowest = sqlx::query_as::<_, IdiomRow>(
            r#"
            SELECT idiom, definition, synonyms, example, randomizer_id
            FROM idioms
            ORDER BY randomizer_id
            LIMIT 1
            "#,
        )
        .fetch_optional(&self.pool)
        .await?;

        Ok(lowest.map(idiom_from_row))
    }

    async fn upsert(&self, idiom: &Idiom) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            INSERT INTO idioms (id, idiom, definition, synonyms, example, randomizer_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (idiom) DO UPDATE
            SET definition = EXCLUDED.definition,
                synonyms = EXCLUDED.synonyms,
                example = EXCLUDED.example,
                randomizer_id = EXCLUDED.randomizer_id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&idiom.idiom)
        .bind(&idiom.definition)
        .bind(&idiom.synonyms)
        .bind(&idiom.example)
        .bind(idiom.randomizer_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn sample_exists(&self) -> Result<bool, DatabaseError> {
        let exists = sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM idioms)")
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }
}
