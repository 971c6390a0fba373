/// Input validators - guards the request surface before anything reaches a store
/// Features:
/// 1. DoS Protection: Input length limits
/// 2. Email format validation
/// 3. Lookup parameter validation (page limits, starting letters)

use lazy_static::lazy_static;
use regex::Regex;

use crate::error::ValidationError;

const MAX_EMAIL_LENGTH: usize = 254; // RFC 5321
const MIN_EMAIL_LENGTH: usize = 5;
const MAX_PASSWORD_LENGTH: usize = 4096;

pub const DEFAULT_LIMIT: i64 = 10;
pub const MAX_LIMIT: i64 = 100;

lazy_static! {
    // RFC 5322 simplified email regex (practical validation)
    static ref EMAIL_REGEX: Regex = Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$"
    ).expect("email regex is valid");

    // Regex to detect potentially malicious SQL patterns
    static ref SQL_INJECTION_PATTERNS: [Regex; 3] = [
        // Union-based SQL injection
        Regex::new(r"(?i)\s+UNION\s+").expect("union regex is valid"),
        // Comment-based injection
        Regex::new(r"(--|;|/\*|\*/)").expect("comment regex is valid"),
        // Stacked queries
        Regex::new(r"(?i);\s*(INSERT|UPDATE|DELETE|DROP|CREATE|ALTER)").expect("stacked regex is valid"),
    ];
}

/// Validates an email address and returns it trimmed.
///
/// Case is preserved: emails are matched exactly as stored.
pub fn is_valid_email(email: &str) -> Result<String, ValidationError> {
    let trimmed = email.trim();

    if trimmed.is_empty() {
        return Err(ValidationError::EmptyField("email".to_string()));
    }

    if trimmed.len() < MIN_EMAIL_LENGTH {
        return Err(ValidationError::TooShort("email".to_string(), MIN_EMAIL_LENGTH));
    }

    if trimmed.len() > MAX_EMAIL_LENGTH {
        return Err(ValidationError::TooLong("email".to_string(), MAX_EMAIL_LENGTH));
    }

    if !EMAIL_REGEX.is_match(trimmed) {
        return Err(ValidationError::InvalidFormat("email".to_string()));
    }

    if has_suspicious_email_patterns(trimmed) {
        return Err(ValidationError::SuspiciousContent("email".to_string()));
    }

    if contains_sql_injection_patterns(trimmed) {
        return Err(ValidationError::PossibleSQLInjection);
    }

    Ok(trimmed.to_string())
}

/// Validates a plaintext password.
///
/// Passwords are pre-hashed before the password hash runs, so there is no
/// algorithm-imposed length limit; the upper bound only caps request cost.
pub fn is_valid_password(password: &str) -> Result<(), ValidationError> {
    if password.is_empty() {
        return Err(ValidationError::EmptyField("password".to_string()));
    }

    if password.len() > MAX_PASSWORD_LENGTH {
        return Err(ValidationError::TooLong("password".to_string(), MAX_PASSWORD_LENGTH));
    }

    Ok(())
}

/// Resolves an optional `limit` query parameter to a value in `1..=MAX_LIMIT`
pub fn validate_limit(limit: Option<i64>) -> Result<i64, ValidationError> {
    let limit = limit.unwrap_or(DEFAULT_LIMIT);
    if !(1..=MAX_LIMIT).contains(&limit) {
        return Err(ValidationError::OutOfRange("limit".to_string(), 1, MAX_LIMIT));
    }
    Ok(limit)
}

/// Accepts exactly one ASCII Latin letter
pub fn validate_starting_letter(input: &str) -> Result<char, ValidationError> {
    let mut chars = input.chars();
    match (chars.next(), chars.next()) {
        (Some(letter), None) if letter.is_ascii_alphabetic() => Ok(letter),
        _ => Err(ValidationError::InvalidFormat(
            "query must be a single letter".to_string(),
        )),
    }
}

/// Detects suspicious patterns in email addresses
fn has_suspicious_email_patterns(email: &str) -> bool {
    // Overlong local part
    if let Some((local_part, _)) = email.split_once('@') {
        if local_part.len() > 64 {
            return true;
        }
    }

    if email.matches('@').count() != 1 {
        return true;
    }

    email.contains('\0')
}

fn contains_sql_injection_patterns(input: &str) -> bool {
    SQL_INJECTION_PATTERNS.iter().any(|pattern| pattern.is_match(input))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_email() {
        assert!(is_valid_email("user@example.com").is_ok());
        assert!(is_valid_email("test.email@domain.co.uk").is_ok());
        assert!(is_valid_email("user+tag@example.com").is_ok());
        assert!(is_valid_email("a@x.com").is_ok());
    }

    #[test]
    fn test_email_case_is_preserved() {
        assert_eq!(is_valid_email(" Alice@Example.com ").unwrap(), "Alice@Example.com");
    }

    #[test]
    fn test_invalid_email_format() {
        assert!(is_valid_email("invalid").is_err());
        assert!(is_valid_email("user@").is_err());
        assert!(is_valid_email("@example.com").is_err());
        assert!(is_valid_email("user@@example.com").is_err());
    }

    #[test]
    fn test_email_length_limits() {
        let too_long = format!("{}@example.com", "a".repeat(250));
        assert!(is_valid_email(&too_long).is_err());

        assert!(is_valid_email("a@a").is_err());
    }

    #[test]
    fn test_sql_injection_in_email() {
        assert!(is_valid_email("user--@example.com").is_err());
    }

    #[test]
    fn test_password_rules() {
        assert!(is_valid_password("secret123").is_ok());
        assert_eq!(
            is_valid_password(""),
            Err(ValidationError::EmptyField("password".to_string()))
        );
        assert!(is_valid_password(&"p".repeat(MAX_PASSWORD_LENGTH + 1)).is_err());
    }

    #[test]
    fn test_limit_defaults_and_bounds() {
        assert_eq!(validate_limit(None).unwrap(), DEFAULT_LIMIT);
        assert_eq!(validate_limit(Some(1)).unwrap(), 1);
        assert_eq!(validate_limit(Some(100)).unwrap(), 100);
        assert!(validate_limit(Some(0)).is_err());
        assert!(validate_limit(Some(101)).is_err());
    }

    #[test]
    fn test_starting_letter() {
        assert_eq!(validate_starting_letter("b").unwrap(), 'b');
        assert_eq!(validate_starting_letter("Q").unwrap(), 'Q');
        assert!(validate_starting_letter("ab").is_err());
        assert!(validate_starting_letter("1").is_err());
        assert!(validate_starting_letter("").is_err());
        assert!(validate_starting_letter("é").is_err());
    }
}
