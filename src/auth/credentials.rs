use rusqlite::{params, Connection, OptionalExtension};
use std::sync::OnceLock;

use crate::auth::tokens::generate_secure_token;
use crate::db::models::User;
use crate::error::{AppError, AppResult};
use crate::state::DbPool;

/// Create a user with a freshly salted bcrypt hash of `password`.
pub fn register(pool: &DbPool, username: &str, password: &str, cost: u32) -> AppResult<User> {
    let password_hash = bcrypt::hash(password, cost)?;

    let conn = pool.get()?;
    conn.execute(
        "INSERT INTO users (username, password_hash) VALUES (?1, ?2)",
        params![username, password_hash],
    )
    .map_err(|e| AppError::from_write(e, "Username is already taken"))?;

    tracing::info!("Registered user {}", username);
    Ok(User {
        id: conn.last_insert_rowid(),
        username: username.to_string(),
        password_hash,
    })
}

/// Check a username/password pair.
///
/// Unknown usernames are verified against a dummy hash of the same cost, so
/// response time does not reveal which usernames exist.
pub fn login(pool: &DbPool, username: &str, password: &str, cost: u32) -> AppResult<User> {
    let user = {
        let conn = pool.get()?;
        find_by_username(&conn, username)?
    };

    let hash = match &user {
        Some(user) => user.password_hash.as_str(),
        None => dummy_hash(cost)?,
    };
    // bcrypt::verify compares digests in constant time
    let verified = bcrypt::verify(password, hash).unwrap_or(false);

    match user {
        Some(user) if verified => Ok(user),
        Some(_) => {
            tracing::warn!("Invalid password for user {}", username);
            Err(AppError::Unauthorized)
        }
        None => {
            tracing::warn!("Login attempt for unknown user {}", username);
            Err(AppError::Unauthorized)
        }
    }
}

/// Hash of a random secret, computed once per process.
fn dummy_hash(cost: u32) -> AppResult<&'static str> {
    static DUMMY: OnceLock<String> = OnceLock::new();

    if let Some(hash) = DUMMY.get() {
        return Ok(hash);
    }
    let hash = bcrypt::hash(generate_secure_token(), cost)?;
    Ok(DUMMY.get_or_init(|| hash))
}

pub fn find_by_username(conn: &Connection, username: &str) -> AppResult<Option<User>> {
    let user = conn
        .query_row(
            "SELECT id, username, password_hash FROM users WHERE username = ?1",
            params![username],
            |row| {
                Ok(User {
                    id: row.get(0)?,
                    username: row.get(1)?,
                    password_hash: row.get(2)?,
                })
            },
        )
        .optional()?;
    Ok(user)
}
