use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::auth::{credentials, tokens::generate_secure_token};
use crate::db::{self, models::Invitation};
use crate::error::{AppError, AppResult};
use crate::invitations::resolution::Resolution;
use crate::lists::store::{insert_member, is_member};
use crate::state::DbPool;

const INVITATION_SELECT: &str = "SELECT i.token, i.inviter_id, inviter.username, \
                                 i.invitee_id, invitee.username, i.list_id, l.name \
                                 FROM invitations i \
                                 JOIN users inviter ON inviter.id = i.inviter_id \
                                 JOIN users invitee ON invitee.id = i.invitee_id \
                                 JOIN lists l ON l.id = i.list_id";

/// Pending invitations to join a list.
#[derive(Clone)]
pub struct InvitationStore {
    pool: DbPool,
}

impl InvitationStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Invite `invitee_username` to a list the inviter belongs to.
    pub fn invite(
        &self,
        inviter_id: i64,
        list_id: i64,
        invitee_username: &str,
    ) -> AppResult<Invitation> {
        let conn = self.pool.get()?;

        let invitation = db::immediate(&conn, |conn| {
            if !is_member(conn, list_id, inviter_id)? {
                return Err(AppError::Forbidden);
            }

            let already_member: bool = conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM list_members m JOIN users u ON u.id = m.user_id \
                 WHERE m.list_id = ?1 AND u.username = ?2)",
                params![list_id, invitee_username],
                |row| row.get(0),
            )?;
            if already_member {
                return Err(AppError::Conflict(
                    "User is already a member of this list".into(),
                ));
            }

            let invitee =
                credentials::find_by_username(conn, invitee_username)?.ok_or(AppError::NotFound)?;

            let token = generate_secure_token();
            conn.execute(
                "INSERT INTO invitations (token, inviter_id, invitee_id, list_id) \
                 VALUES (?1, ?2, ?3, ?4)",
                params![token, inviter_id, invitee.id, list_id],
            )
            .map_err(|e| AppError::from_write(e, "Invitation could not be created"))?;

            fetch(conn, &token)?
                .ok_or_else(|| AppError::Internal("Inserted invitation vanished before commit".into()))
        })?;

        tracing::info!(
            "User {} invited {} to list {}",
            inviter_id,
            invitation.invitee_username,
            list_id
        );
        Ok(invitation)
    }

    pub fn get(&self, token: &str) -> AppResult<Invitation> {
        let conn = self.pool.get()?;
        fetch(&conn, token)?.ok_or(AppError::NotFound)
    }

    /// Join the list and consume the invitation, atomically. If joining fails
    /// the invitation stays pending.
    pub fn accept(&self, token: &str, accepter_id: i64) -> AppResult<Invitation> {
        self.resolve(token, accepter_id, Resolution::Accept)
    }

    pub fn decline(&self, token: &str, decliner_id: i64) -> AppResult<()> {
        self.resolve(token, decliner_id, Resolution::Decline)
            .map(|_| ())
    }

    pub fn revoke(&self, token: &str, revoker_id: i64) -> AppResult<()> {
        self.resolve(token, revoker_id, Resolution::Revoke)
            .map(|_| ())
    }

    /// Invitations the user sent or received.
    pub fn list_for(&self, user_id: i64) -> AppResult<Vec<Invitation>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(&format!(
            "{INVITATION_SELECT} WHERE i.inviter_id = ?1 OR i.invitee_id = ?1 \
             ORDER BY i.created_at, i.rowid"
        ))?;
        let invitations = stmt
            .query_map(params![user_id], invitation_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(invitations)
    }

    fn resolve(&self, token: &str, user_id: i64, resolution: Resolution) -> AppResult<Invitation> {
        let conn = self.pool.get()?;

        let invitation = db::immediate(&conn, |conn| {
            let invitation = fetch(conn, token)?.ok_or(AppError::NotFound)?;
            resolution.authorize(&invitation, user_id)?;

            if resolution.grants_membership() {
                insert_member(conn, invitation.list_id, invitation.invitee_id)?;
            }

            let removed = conn.execute("DELETE FROM invitations WHERE token = ?1", params![token])?;
            if removed != 1 {
                return Err(AppError::NotFound);
            }
            Ok(invitation)
        })?;

        tracing::info!(
            "Invitation of {} to list {} {} by user {}",
            invitation.invitee_username,
            invitation.list_id,
            resolution,
            user_id
        );
        Ok(invitation)
    }
}

fn fetch(conn: &Connection, token: &str) -> AppResult<Option<Invitation>> {
    let invitation = conn
        .query_row(
            &format!("{INVITATION_SELECT} WHERE i.token = ?1"),
            params![token],
            invitation_from_row,
        )
        .optional()?;
    Ok(invitation)
}

fn invitation_from_row(row: &Row<'_>) -> rusqlite::Result<Invitation> {
    Ok(Invitation {
        token: row.get(0)?,
        inviter_id: row.get(1)?,
        inviter_username: row.get(2)?,
        invitee_id: row.get(3)?,
        invitee_username: row.get(4)?,
        list_id: row.get(5)?,
        list_name: row.get(6)?,
    })
}
