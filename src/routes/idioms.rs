/// Idiom lookup routes
///
/// All of these sit behind `IdentityMiddleware`. An empty result is reported
/// as 404 rather than an empty list.

use actix_web::{web, HttpResponse};
use serde::Deserialize;

use crate::error::{AppError, DatabaseError, ValidationError};
use crate::models::Idiom;
use crate::store::IdiomStore;
use crate::validators::{validate_limit, validate_starting_letter};

#[derive(Deserialize)]
pub struct LimitQuery {
    pub limit: Option<i64>,
}

fn not_found() -> AppError {
    AppError::Database(DatabaseError::NotFound("Idiom not found".to_string()))
}

fn found(idioms: Vec<Idiom>) -> Result<HttpResponse, AppError> {
    if idioms.is_empty() {
        return Err(not_found());
    }
    Ok(HttpResponse::Ok().json(idioms))
}

fn search_term(field: &str, raw: &str) -> Result<String, AppError> {
    let term = raw.trim();
    if term.is_empty() {
        return Err(ValidationError::EmptyField(field.to_string()).into());
    }
    Ok(term.to_string())
}

/// GET /idioms/search/{phrase}?limit=N
pub async fn search_idioms(
    phrase: web::Path<String>,
    query: web::Query<LimitQuery>,
    idioms: web::Data<dyn IdiomStore>,
) -> Result<HttpResponse, AppError> {
    let limit = validate_limit(query.limit)?;
    let phrase = search_term("phrase", &phrase)?;

    tracing::debug!(phrase = %phrase, limit, "Searching idioms by phrase");
    found(idioms.search(&phrase, limit).await?)
}

/// GET /idioms/by-letter/{letter}?limit=N
pub async fn idioms_by_letter(
    letter: web::Path<String>,
    query: web::Query<LimitQuery>,
    idioms: web::Data<dyn IdiomStore>,
) -> Result<HttpResponse, AppError> {
    let limit = validate_limit(query.limit)?;
    let letter = validate_starting_letter(&letter)?;

    found(idioms.starting_with(letter, limit).await?)
}

/// GET /idioms/by-synonym/{synonym}?limit=N
pub async fn idioms_by_synonym(
    synonym: web::Path<String>,
    query: web::Query<LimitQuery>,
    idioms: web::Data<dyn IdiomStore>,
) -> Result<HttpResponse, AppError> {
    let limit = validate_limit(query.limit)?;
    let synonym = search_term("synonym", &synonym)?;

    found(idioms.by_synonym(&synonym, limit).await?)
}

/// GET /idioms/random
pub async fn random_idiom(idioms: web::Data<dyn IdiomStore>) -> Result<HttpResponse, AppError> {
    let pivot: f64 = rand::random();
    let idiom = idioms.random(pivot).await?.ok_or_else(not_found)?;

    Ok(HttpResponse::Ok().json(idiom))
}
