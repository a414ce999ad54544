//! Check-in token lifecycle.
//!
//! Each session owns at most one token row. Issuing again rotates the value
//! in place, which is what revokes the previous one: verification is a plain
//! lookup by value, so a replaced value simply stops matching.

use chrono::{DateTime, Duration, Utc};
use db::models::check_in_token::Model as CheckInToken;
use db::models::session::Model as Session;
use rand::Rng;
use sea_orm::{DatabaseConnection, DbErr, SqlErr};
use serde::Serialize;
use tracing::{debug, info, warn};
use util::config;

use crate::error::AppError;

/// Attempts at drawing a value that no other session currently holds.
const MAX_GENERATION_ATTEMPTS: u32 = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IssuedToken {
    pub session_id: i64,
    pub value: String,
    pub expires_at: DateTime<Utc>,
}

impl From<CheckInToken> for IssuedToken {
    fn from(t: CheckInToken) -> Self {
        Self {
            session_id: t.session_id,
            value: t.value,
            expires_at: t.expires_at,
        }
    }
}

#[derive(Clone)]
pub struct TokenIssuer {
    db: DatabaseConnection,
    ttl: Duration,
    length: usize,
    alphabet: Vec<char>,
    fold_case: bool,
}

impl TokenIssuer {
    /// Issuer shaped by `TOKEN_TTL_SECONDS`, `TOKEN_LENGTH` and `TOKEN_ALPHABET`.
    pub fn new(db: DatabaseConnection) -> Self {
        Self::with_shape(
            db,
            Duration::seconds(config::token_ttl_seconds()),
            config::token_length(),
            &config::token_alphabet(),
        )
    }

    pub fn with_shape(db: DatabaseConnection, ttl: Duration, length: usize, alphabet: &str) -> Self {
        let mut alphabet: Vec<char> = alphabet.chars().collect();
        alphabet.sort_unstable();
        alphabet.dedup();
        if alphabet.len() < 2 {
            alphabet = config::DEFAULT_TOKEN_ALPHABET.chars().collect();
        }
        let fold_case = !alphabet.iter().any(|c| c.is_lowercase());

        Self {
            db,
            ttl: ttl.max(Duration::seconds(1)),
            length: length.clamp(4, 64),
            alphabet,
            fold_case,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub async fn issue_or_rotate(&self, session_id: i64) -> Result<IssuedToken, AppError> {
        self.issue_or_rotate_at(session_id, Utc::now()).await
    }

    /// Creates the session's token, or replaces its value and pushes the
    /// expiry to `now + ttl`. The old value is dead once this returns.
    pub async fn issue_or_rotate_at(
        &self,
        session_id: i64,
        now: DateTime<Utc>,
    ) -> Result<IssuedToken, AppError> {
        let session = Session::find(&self.db, session_id)
            .await?
            .ok_or(AppError::SessionNotFound(session_id))?;
        if !session.accepts_check_in() {
            return Err(AppError::CheckInDisabled(session_id));
        }

        let expires_at = now + self.ttl;
        let previous = CheckInToken::find_by_session(&self.db, session_id)
            .await?
            .map(|t| t.value);

        for attempt in 1..=MAX_GENERATION_ATTEMPTS {
            let value = self.generate_other_than(previous.as_deref());
            match CheckInToken::upsert(&self.db, session_id, &value, expires_at, now).await {
                Ok(()) => {
                    info!(session_id, %expires_at, "check-in token issued");
                    return Ok(IssuedToken {
                        session_id,
                        value,
                        expires_at,
                    });
                }
                Err(e) if is_unique_violation(&e) => {
                    warn!(session_id, attempt, "token value collided with another session, retrying");
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(AppError::Database(DbErr::Custom(format!(
            "no unique token value after {MAX_GENERATION_ATTEMPTS} attempts"
        ))))
    }

    pub async fn verify(&self, value: &str) -> Result<i64, AppError> {
        self.verify_at(value, Utc::now()).await
    }

    /// Resolves a presented value to its session. No side effects.
    pub async fn verify_at(&self, value: &str, now: DateTime<Utc>) -> Result<i64, AppError> {
        let needle = self.normalize(value);
        if needle.is_empty() {
            return Err(AppError::validation("token must not be empty"));
        }

        let token = match CheckInToken::find_by_value(&self.db, &needle).await? {
            Some(t) => t,
            None => {
                debug!("token lookup missed");
                return Err(AppError::TokenInvalid);
            }
        };

        if token.is_expired_at(now) {
            debug!(session_id = token.session_id, expires_at = %token.expires_at, "token expired");
            return Err(AppError::TokenExpired);
        }

        Ok(token.session_id)
    }

    /// Currently stored token, without rotating. May already be expired.
    pub async fn current(&self, session_id: i64) -> Result<Option<IssuedToken>, AppError> {
        if Session::find(&self.db, session_id).await?.is_none() {
            return Err(AppError::SessionNotFound(session_id));
        }
        Ok(CheckInToken::find_by_session(&self.db, session_id)
            .await?
            .map(IssuedToken::from))
    }

    fn generate(&self) -> String {
        let mut rng = rand::rng();
        (0..self.length)
            .map(|_| self.alphabet[rng.random_range(0..self.alphabet.len())])
            .collect()
    }

    /// Random value guaranteed to differ from `previous`. On a repeat draw
    /// one position is swapped for another symbol, so rotation always
    /// changes the value even over a tiny alphabet.
    fn generate_other_than(&self, previous: Option<&str>) -> String {
        let value = self.generate();
        if previous != Some(value.as_str()) {
            return value;
        }

        let mut rng = rand::rng();
        let mut chars: Vec<char> = value.chars().collect();
        let pos = rng.random_range(0..chars.len());
        let others: Vec<char> = self
            .alphabet
            .iter()
            .copied()
            .filter(|c| *c != chars[pos])
            .collect();
        chars[pos] = others[rng.random_range(0..others.len())];
        chars.into_iter().collect()
    }

    fn normalize(&self, raw: &str) -> String {
        let trimmed = raw.trim();
        if self.fold_case {
            trimmed.to_uppercase()
        } else {
            trimmed.to_owned()
        }
    }
}

fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}
