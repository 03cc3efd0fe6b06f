use chrono::{Duration, Utc};
use rusqlite::{params, OptionalExtension};

use crate::auth::tokens::generate_secure_token;
use crate::db::models::{Session, User};
use crate::error::{AppError, AppResult};
use crate::state::DbPool;

/// Create a new session for a user. A non-positive `ttl_days` creates a
/// session that never expires.
pub fn create_session(pool: &DbPool, user: &User, ttl_days: i64) -> AppResult<Session> {
    let conn = pool.get()?;

    let token = generate_secure_token();
    let created_at = Utc::now();
    let expires_at = (ttl_days > 0).then(|| created_at + Duration::days(ttl_days));

    conn.execute(
        "INSERT INTO sessions (token, user_id, created_at, expires_at) VALUES (?1, ?2, ?3, ?4)",
        params![token, user.id, created_at, expires_at],
    )?;

    Ok(Session {
        token,
        user: user.clone(),
        created_at,
        expires_at,
    })
}

/// Resolve a token to its session. Read-only: verifying never extends the
/// expiry.
pub fn verify_session(pool: &DbPool, token: &str) -> AppResult<Session> {
    if token.is_empty() {
        return Err(AppError::Unauthorized);
    }

    let conn = pool.get()?;
    let session = conn
        .query_row(
            "SELECT s.token, s.created_at, s.expires_at, u.id, u.username, u.password_hash \
             FROM sessions s \
             JOIN users u ON u.id = s.user_id \
             WHERE s.token = ?1",
            params![token],
            |row| {
                Ok(Session {
                    token: row.get(0)?,
                    created_at: row.get(1)?,
                    expires_at: row.get(2)?,
                    user: User {
                        id: row.get(3)?,
                        username: row.get(4)?,
                        password_hash: row.get(5)?,
                    },
                })
            },
        )
        .optional()?
        .ok_or(AppError::Unauthorized)?;

    if session.is_expired(Utc::now()) {
        return Err(AppError::Unauthorized);
    }

    Ok(session)
}

/// Delete a session by token.
pub fn delete_session(pool: &DbPool, token: &str) -> AppResult<()> {
    let conn = pool.get()?;
    conn.execute("DELETE FROM sessions WHERE token = ?1", params![token])?;
    Ok(())
}

/// Remove sessions whose expiry has passed. Returns the number removed.
pub fn purge_expired(pool: &DbPool) -> AppResult<usize> {
    let conn = pool.get()?;
    let removed = conn.execute(
        "DELETE FROM sessions WHERE expires_at IS NOT NULL AND expires_at <= ?1",
        params![Utc::now()],
    )?;
    Ok(removed)
}
