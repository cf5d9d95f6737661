// src/db/users.rs
use rusqlite::{params, Connection, OptionalExtension};

use crate::errors::ServerError;

#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub surname: String,
    pub neighborhood: String,
    pub email: String,
    pub password_hash: String,
    pub role: String,
}

#[derive(Debug, Clone)]
pub struct UserRow {
    pub id: i64,
    pub name: String,
    pub surname: String,
    pub neighborhood: String,
    pub email: String,
    pub password_hash: String,
    pub role: String,
    pub is_verified: bool,
}

/// Insert a new account. Email should already be normalized by the caller.
/// A duplicate email surfaces as BadRequest, not DbError.
pub fn create_user(conn: &Connection, user: &NewUser, now: i64) -> Result<i64, ServerError> {
    let result = conn.execute(
        r#"
        insert into users (name, surname, neighborhood, email, password_hash, role, is_verified, created_at)
        values (?, ?, ?, ?, ?, ?, 0, ?)
        "#,
        params![
            user.name,
            user.surname,
            user.neighborhood,
            user.email,
            user.password_hash,
            user.role,
            now
        ],
    );

    match result {
        Ok(_) => Ok(conn.last_insert_rowid()),
        Err(rusqlite::Error::SqliteFailure(e, _))
            if e.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            Err(ServerError::BadRequest("email is already registered".into()))
        }
        Err(e) => Err(ServerError::DbError(format!("insert user failed: {e}"))),
    }
}

pub fn find_by_email(conn: &Connection, email: &str) -> Result<Option<UserRow>, ServerError> {
    conn.query_row(
        r#"
        select id, name, surname, neighborhood, email, password_hash, role, is_verified
        from users
        where email = ?
        "#,
        params![email],
        |row| {
            Ok(UserRow {
                id: row.get(0)?,
                name: row.get(1)?,
                surname: row.get(2)?,
                neighborhood: row.get(3)?,
                email: row.get(4)?,
                password_hash: row.get(5)?,
                role: row.get(6)?,
                is_verified: row.get(7)?,
            })
        },
    )
    .optional()
    .map_err(|e| ServerError::DbError(format!("select user failed: {e}")))
}

pub fn mark_verified(conn: &Connection, user_id: i64) -> Result<(), ServerError> {
    conn.execute(
        "update users set is_verified = 1 where id = ?",
        params![user_id],
    )
    .map_err(|e| ServerError::DbError(format!("mark verified failed: {e}")))?;
    Ok(())
}

pub fn record_login(conn: &Connection, user_id: i64, now: i64) -> Result<(), ServerError> {
    conn.execute(
        "update users set last_login_at = ? where id = ?",
        params![now, user_id],
    )
    .map_err(|e| ServerError::DbError(format!("update last_login_at failed: {e}")))?;
    Ok(())
}

/// Insert a verification code row (code_hash should be SHA-256 bytes).
pub fn insert_verification_code(
    conn: &Connection,
    user_id: i64,
    code_hash: &[u8],
    created_at: i64,
    expires_at: i64,
) -> Result<(), ServerError> {
    conn.execute(
        "insert into verification_codes (user_id, code_hash, created_at, expires_at) values (?, ?, ?, ?)",
        params![user_id, code_hash, created_at, expires_at],
    )
    .map_err(|e| ServerError::DbError(format!("insert verification code failed: {e}")))?;
    Ok(())
}

/// Consume a verification code for a user:
/// - must exist for that user
/// - must be unexpired (expires_at > now)
/// - must be unused (used_at is null)
/// If valid, sets used_at=now and returns true. Otherwise returns Ok(false).
///
/// Uses a transaction to prevent double-use races.
pub fn consume_verification_code(
    conn: &mut Connection,
    user_id: i64,
    code_hash: &[u8],
    now: i64,
) -> Result<bool, ServerError> {
    let tx = conn
        .transaction()
        .map_err(|e| ServerError::DbError(format!("begin tx failed: {e}")))?;

    let row: Option<(i64, i64, Option<i64>)> = tx
        .query_row(
            r#"
            select id, expires_at, used_at
            from verification_codes
            where user_id = ? and code_hash = ?
            order by id desc limit 1
            "#,
            params![user_id, code_hash],
            |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)),
        )
        .optional()
        .map_err(|e| ServerError::DbError(format!("select verification code failed: {e}")))?;

    let Some((code_id, expires_at, used_at)) = row else {
        tx.rollback().ok();
        return Ok(false);
    };

    if used_at.is_some() || expires_at <= now {
        tx.rollback().ok();
        return Ok(false);
    }

    // Mark used (guard used_at IS NULL so only one consumer wins)
    let updated = tx
        .execute(
            "update verification_codes set used_at = ? where id = ? and used_at is null",
            params![now, code_id],
        )
        .map_err(|e| ServerError::DbError(format!("update verification code failed: {e}")))?;

    if updated != 1 {
        tx.rollback().ok();
        return Ok(false);
    }

    tx.commit()
        .map_err(|e| ServerError::DbError(format!("commit tx failed: {e}")))?;

    Ok(true)
}

/// Addresses to notify for a neighborhood-wide incident notice.
pub fn verified_emails_in_neighborhood(
    conn: &Connection,
    neighborhood: &str,
) -> Result<Vec<String>, ServerError> {
    let mut stmt = conn
        .prepare("select email from users where neighborhood = ? and is_verified = 1")
        .map_err(|e| ServerError::DbError(format!("prepare emails failed: {e}")))?;

    let rows = stmt
        .query_map(params![neighborhood], |r| r.get::<_, String>(0))
        .map_err(|e| ServerError::DbError(format!("query emails failed: {e}")))?;

    let mut out = Vec::new();
    for r in rows {
        out.push(r.map_err(|e| ServerError::DbError(format!("read email failed: {e}")))?);
    }
    Ok(out)
}
