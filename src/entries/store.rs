use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::db::{self, models::Entry};
use crate::entries::ordering::MovePlan;
use crate::error::{AppError, AppResult};
use crate::state::DbPool;

const ENTRY_COLUMNS: &str = "id, list_id, text, category, order_index, completed, created_at";

/// Entries of every list, kept densely ordered per (list, category).
///
/// Each mutation that touches more than one row runs in a single immediate
/// transaction, so concurrent writers to the same partition are serialized by
/// the database and a failed step leaves no trace.
#[derive(Clone)]
pub struct EntryStore {
    pool: DbPool,
}

impl EntryStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Append an entry to the end of its category.
    pub fn add(&self, list_id: i64, text: &str, category: &str) -> AppResult<Entry> {
        let conn = self.pool.get()?;

        db::immediate(&conn, |conn| {
            // Aggregate without GROUP BY yields exactly one row, so the insert
            // happens even for an empty partition.
            conn.execute(
                "INSERT INTO entries (list_id, text, category, order_index, completed, created_at)
                 SELECT ?1, ?2, ?3, COALESCE(MAX(order_index) + 1, 0), 0, ?4
                 FROM entries WHERE list_id = ?1 AND category = ?3",
                params![list_id, text, category, Utc::now()],
            )
            .map_err(|e| AppError::from_write(e, "Entry could not be added"))?;

            fetch(conn, conn.last_insert_rowid())?.ok_or_else(|| {
                AppError::Internal("Inserted entry vanished before commit".into())
            })
        })
    }

    pub fn get(&self, id: i64) -> AppResult<Entry> {
        let conn = self.pool.get()?;
        fetch(&conn, id)?.ok_or(AppError::NotFound)
    }

    /// All entries of a list, ordered by category then position.
    pub fn all(&self, list_id: i64) -> AppResult<Vec<Entry>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {ENTRY_COLUMNS} FROM entries WHERE list_id = ?1 \
             ORDER BY category, order_index, id"
        ))?;
        let entries = stmt
            .query_map(params![list_id], entry_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    /// Change text and category. Moving to another category closes the gap in
    /// the old one and appends the entry to the new one.
    pub fn update(&self, id: i64, text: &str, category: &str) -> AppResult<bool> {
        let conn = self.pool.get()?;

        db::immediate(&conn, |conn| {
            let Some(current) = fetch(conn, id)? else {
                return Ok(false);
            };

            if current.category == category {
                conn.execute(
                    "UPDATE entries SET text = ?1 WHERE id = ?2",
                    params![text, id],
                )?;
                return Ok(true);
            }

            conn.execute(
                "UPDATE entries SET text = ?1, category = ?2, order_index = (
                     SELECT COALESCE(MAX(order_index) + 1, 0) FROM entries
                     WHERE list_id = ?3 AND category = ?2
                 ) WHERE id = ?4",
                params![text, category, current.list_id, id],
            )?;
            close_gap(
                conn,
                current.list_id,
                &current.category,
                current.order_index,
            )?;
            Ok(true)
        })
    }

    pub fn complete(&self, id: i64, completed: bool) -> AppResult<bool> {
        let conn = self.pool.get()?;
        let rows = conn.execute(
            "UPDATE entries SET completed = ?1 WHERE id = ?2",
            params![completed, id],
        )?;
        Ok(rows > 0)
    }

    /// Remove an entry and shift everything after it in its category up one
    /// slot.
    pub fn delete(&self, id: i64) -> AppResult<bool> {
        let conn = self.pool.get()?;

        db::immediate(&conn, |conn| {
            let Some(current) = fetch(conn, id)? else {
                return Ok(false);
            };

            conn.execute("DELETE FROM entries WHERE id = ?1", params![id])?;
            close_gap(
                conn,
                current.list_id,
                &current.category,
                current.order_index,
            )?;
            Ok(true)
        })
    }

    /// Move the entry at `old_index` to `new_index` within one category.
    ///
    /// Returns `false` when no entry sits at `old_index`, when `new_index` is
    /// outside the category, or when the partition changed underneath the
    /// move. In every `false` case nothing is written.
    pub fn move_entry(
        &self,
        list_id: i64,
        category: &str,
        old_index: i64,
        new_index: i64,
    ) -> AppResult<bool> {
        if old_index == new_index {
            return Ok(true);
        }

        let conn = self.pool.get()?;
        let result = db::immediate(&conn, |conn| {
            let moved: Option<i64> = conn
                .query_row(
                    "SELECT id FROM entries
                     WHERE list_id = ?1 AND category = ?2 AND order_index = ?3",
                    params![list_id, category, old_index],
                    |row| row.get(0),
                )
                .optional()?;
            let Some(moved) = moved else {
                return Ok(false);
            };

            let len: i64 = conn.query_row(
                "SELECT COUNT(*) FROM entries WHERE list_id = ?1 AND category = ?2",
                params![list_id, category],
                |row| row.get(0),
            )?;
            let Some(plan) = MovePlan::new(old_index, new_index, len) else {
                return Ok(false);
            };

            apply_move(conn, list_id, category, moved, plan)?;
            Ok(true)
        });

        match result {
            Err(AppError::Conflict(reason)) => {
                tracing::warn!(
                    "Move {} -> {} in list {} / {:?} rolled back: {}",
                    old_index,
                    new_index,
                    list_id,
                    category,
                    reason
                );
                Ok(false)
            }
            other => other,
        }
    }
}

/// Shift the neighbours, then relocate the moved entry with a conditional
/// update. Any row-count mismatch means the partition was not in the state the
/// plan was computed from, and surfaces as `Conflict` so the caller's
/// transaction rolls back.
fn apply_move(
    conn: &Connection,
    list_id: i64,
    category: &str,
    moved: i64,
    plan: MovePlan,
) -> AppResult<()> {
    let (old_index, new_index, shifted) = match plan {
        MovePlan::Stay => return Ok(()),
        MovePlan::Forward { from, to } => (
            from,
            to,
            conn.execute(
                "UPDATE entries SET order_index = order_index - 1
                 WHERE list_id = ?1 AND category = ?2
                   AND order_index > ?3 AND order_index <= ?4",
                params![list_id, category, from, to],
            )?,
        ),
        MovePlan::Backward { from, to } => (
            from,
            to,
            conn.execute(
                "UPDATE entries SET order_index = order_index + 1
                 WHERE list_id = ?1 AND category = ?2
                   AND order_index >= ?3 AND order_index < ?4",
                params![list_id, category, to, from],
            )?,
        ),
    };

    if shifted != plan.shifted() {
        return Err(AppError::Conflict(format!(
            "expected to shift {} entries, shifted {}",
            plan.shifted(),
            shifted
        )));
    }

    let relocated = conn.execute(
        "UPDATE entries SET order_index = ?1 WHERE id = ?2 AND order_index = ?3",
        params![new_index, moved, old_index],
    )?;
    if relocated != 1 {
        return Err(AppError::Conflict(format!(
            "entry {moved} no longer at index {old_index}"
        )));
    }

    Ok(())
}

fn close_gap(conn: &Connection, list_id: i64, category: &str, removed_index: i64) -> AppResult<()> {
    conn.execute(
        "UPDATE entries SET order_index = order_index - 1
         WHERE list_id = ?1 AND category = ?2 AND order_index > ?3",
        params![list_id, category, removed_index],
    )?;
    Ok(())
}

fn fetch(conn: &Connection, id: i64) -> AppResult<Option<Entry>> {
    let entry = conn
        .query_row(
            &format!("SELECT {ENTRY_COLUMNS} FROM entries WHERE id = ?1"),
            params![id],
            entry_from_row,
        )
        .optional()?;
    Ok(entry)
}

fn entry_from_row(row: &Row<'_>) -> rusqlite::Result<Entry> {
    Ok(Entry {
        id: row.get(0)?,
        list_id: row.get(1)?,
        text: row.get(2)?,
        category: row.get(3)?,
        order_index: row.get(4)?,
        completed: row.get(5)?,
        created_at: row.get(6)?,
    })
}
