use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::db::{
    self,
    models::{List, User},
};
use crate::error::{AppError, AppResult};
use crate::state::DbPool;

const LIST_SELECT: &str = "SELECT l.id, l.name, l.creator_id, u.username \
                           FROM lists l JOIN users u ON u.id = l.creator_id";

/// Lists and who belongs to them.
#[derive(Clone)]
pub struct MembershipStore {
    pool: DbPool,
}

impl MembershipStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Create a list whose creator is also its first member. Both rows are
    /// written together or not at all.
    pub fn create_list(&self, creator_id: i64, name: &str) -> AppResult<List> {
        let conn = self.pool.get()?;

        let list = db::immediate(&conn, |conn| {
            conn.execute(
                "INSERT INTO lists (name, creator_id) VALUES (?1, ?2)",
                params![name, creator_id],
            )
            .map_err(|e| AppError::from_write(e, "List could not be created"))?;
            let list_id = conn.last_insert_rowid();

            insert_member(conn, list_id, creator_id)?;

            fetch(conn, list_id)?
                .ok_or_else(|| AppError::Internal("Inserted list vanished before commit".into()))
        })?;

        tracing::info!("User {} created list {} ({:?})", creator_id, list.id, list.name);
        Ok(list)
    }

    pub fn get_list(&self, list_id: i64) -> AppResult<List> {
        let conn = self.pool.get()?;
        fetch(&conn, list_id)?.ok_or(AppError::NotFound)
    }

    /// Delete a list. Only its creator may do so; entries, memberships and
    /// pending invitations go with it.
    pub fn delete_list(&self, list_id: i64, requester_id: i64) -> AppResult<()> {
        let conn = self.pool.get()?;

        db::immediate(&conn, |conn| {
            let creator_id: i64 = conn
                .query_row(
                    "SELECT creator_id FROM lists WHERE id = ?1",
                    params![list_id],
                    |row| row.get(0),
                )
                .optional()?
                .ok_or(AppError::NotFound)?;

            if creator_id != requester_id {
                return Err(AppError::Forbidden);
            }

            conn.execute("DELETE FROM lists WHERE id = ?1", params![list_id])?;
            Ok(())
        })?;

        tracing::info!("User {} deleted list {}", requester_id, list_id);
        Ok(())
    }

    /// Add a member. Not idempotent: joining twice is a `Conflict`.
    pub fn join(&self, list_id: i64, user_id: i64) -> AppResult<()> {
        let conn = self.pool.get()?;
        insert_member(&conn, list_id, user_id)
    }

    /// Remove a membership if it exists. The creator cannot leave their own
    /// list; deleting it is the only way out.
    pub fn leave(&self, list_id: i64, user_id: i64) -> AppResult<()> {
        let conn = self.pool.get()?;

        let creator_id: Option<i64> = conn
            .query_row(
                "SELECT creator_id FROM lists WHERE id = ?1",
                params![list_id],
                |row| row.get(0),
            )
            .optional()?;
        if creator_id == Some(user_id) {
            return Err(AppError::Forbidden);
        }

        conn.execute(
            "DELETE FROM list_members WHERE list_id = ?1 AND user_id = ?2",
            params![list_id, user_id],
        )?;
        Ok(())
    }

    pub fn members(&self, list_id: i64) -> AppResult<Vec<User>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(
            "SELECT u.id, u.username, u.password_hash FROM list_members m \
             JOIN users u ON u.id = m.user_id \
             WHERE m.list_id = ?1 ORDER BY m.joined_at, u.id",
        )?;
        let members = stmt
            .query_map(params![list_id], |row| {
                Ok(User {
                    id: row.get(0)?,
                    username: row.get(1)?,
                    password_hash: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(members)
    }

    /// Every list the user currently belongs to.
    pub fn lists_for(&self, user_id: i64) -> AppResult<Vec<List>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(&format!(
            "{LIST_SELECT} JOIN list_members m ON m.list_id = l.id \
             WHERE m.user_id = ?1 ORDER BY l.id"
        ))?;
        let lists = stmt
            .query_map(params![user_id], list_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(lists)
    }

    pub fn is_member(&self, list_id: i64, user_id: i64) -> AppResult<bool> {
        let conn = self.pool.get()?;
        is_member(&conn, list_id, user_id)
    }

    /// `Forbidden` unless the user belongs to the list. Lists that do not
    /// exist have no members, so they are indistinguishable from foreign ones.
    pub fn require_member(&self, list_id: i64, user_id: i64) -> AppResult<()> {
        if self.is_member(list_id, user_id)? {
            Ok(())
        } else {
            Err(AppError::Forbidden)
        }
    }
}

pub(crate) fn insert_member(conn: &Connection, list_id: i64, user_id: i64) -> AppResult<()> {
    conn.execute(
        "INSERT INTO list_members (list_id, user_id) VALUES (?1, ?2)",
        params![list_id, user_id],
    )
    .map_err(|e| AppError::from_write(e, "User is already a member of this list"))?;
    Ok(())
}

pub(crate) fn is_member(conn: &Connection, list_id: i64, user_id: i64) -> AppResult<bool> {
    let member: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM list_members WHERE list_id = ?1 AND user_id = ?2)",
        params![list_id, user_id],
        |row| row.get(0),
    )?;
    Ok(member)
}

fn fetch(conn: &Connection, list_id: i64) -> AppResult<Option<List>> {
    let list = conn
        .query_row(
            &format!("{LIST_SELECT} WHERE l.id = ?1"),
            params![list_id],
            list_from_row,
        )
        .optional()?;
    Ok(list)
}

fn list_from_row(row: &Row<'_>) -> rusqlite::Result<List> {
    Ok(List {
        id: row.get(0)?,
        name: row.get(1)?,
        creator_id: row.get(2)?,
        creator_username: row.get(3)?,
    })
}
