// src/auth/verification.rs
use rusqlite::Connection;

use crate::auth::token::{generate_verification_code, hash_token};
use crate::db::users as db_users;
use crate::errors::ServerError;

#[derive(Debug, Clone)]
pub struct VerificationConfig {
    /// TTL for verification codes in seconds.
    pub ttl_secs: i64,
}

impl Default for VerificationConfig {
    fn default() -> Self {
        Self { ttl_secs: 15 * 60 }
    }
}

#[derive(Debug, Clone)]
pub struct IssuedCode {
    pub email: String,
    pub user_id: i64,
    /// Raw code (never store this in DB).
    pub code: String,
    pub expires_at: i64,
}

pub struct VerificationService {
    cfg: VerificationConfig,
}

impl VerificationService {
    pub fn new(cfg: VerificationConfig) -> Self {
        Self { cfg }
    }

    /// Trim + lowercase, minimal sanity check.
    pub fn normalize_email(email: &str) -> Result<String, ServerError> {
        let e = email.trim().to_lowercase();
        if e.is_empty() || !e.contains('@') || e.starts_with('@') || e.ends_with('@') {
            return Err(ServerError::BadRequest("invalid email".into()));
        }
        Ok(e)
    }

    /// Issue a fresh verification code for an account:
    /// - look the user up by (normalized) email
    /// - reject accounts that are already verified
    /// - insert the code (store hash only)
    ///
    /// Mailing is the caller's job.
    pub fn issue(
        &self,
        conn: &Connection,
        email: &str,
        now: i64,
    ) -> Result<IssuedCode, ServerError> {
        let email = Self::normalize_email(email)?;
        let user = db_users::find_by_email(conn, &email)?
            .ok_or(ServerError::NotFound)?;
        if user.is_verified {
            return Err(ServerError::BadRequest("account is already verified".into()));
        }

        let code = generate_verification_code();
        let code_hash = hash_token(&code);
        let expires_at = now + self.cfg.ttl_secs;

        db_users::insert_verification_code(conn, user.id, &code_hash, now, expires_at)?;

        Ok(IssuedCode {
            email,
            user_id: user.id,
            code,
            expires_at,
        })
    }

    /// Redeem a verification code:
    /// - hash the code
    /// - consume it (transactional single-use)
    /// - flip the account to verified
    pub fn redeem(
        &self,
        conn: &mut Connection,
        email: &str,
        code: &str,
        now: i64,
    ) -> Result<i64, ServerError> {
        let email = Self::normalize_email(email)?;
        let code = code.trim();
        if code.is_empty() {
            return Err(ServerError::BadRequest("missing verification code".into()));
        }

        let user = db_users::find_by_email(conn, &email)?
            .ok_or(ServerError::NotFound)?;

        let code_hash = hash_token(code);
        if !db_users::consume_verification_code(conn, user.id, &code_hash, now)? {
            return Err(ServerError::Unauthorized("invalid or expired code".into()));
        }

        db_users::mark_verified(conn, user.id)?;
        Ok(user.id)
    }
}
