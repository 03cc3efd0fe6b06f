// Terminal transitions of a pending invitation - pure, no side effects
use std::fmt;

use crate::db::models::Invitation;
use crate::error::{AppError, AppResult};

/// The three ways a pending invitation ends. None of them is stored: the
/// invitation row disappears and only acceptance leaves a membership behind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Accept,
    Decline,
    Revoke,
}

impl Resolution {
    /// The only user allowed to perform this resolution.
    pub fn actor(self, invitation: &Invitation) -> i64 {
        match self {
            Resolution::Accept | Resolution::Decline => invitation.invitee_id,
            Resolution::Revoke => invitation.inviter_id,
        }
    }

    pub fn authorize(self, invitation: &Invitation, user_id: i64) -> AppResult<()> {
        if self.actor(invitation) == user_id {
            Ok(())
        } else {
            Err(AppError::Forbidden)
        }
    }

    pub fn grants_membership(self) -> bool {
        matches!(self, Resolution::Accept)
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Resolution::Accept => "accepted",
            Resolution::Decline => "declined",
            Resolution::Revoke => "revoked",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn invitation() -> Invitation {
        Invitation {
            token: "tok".into(),
            inviter_id: 1,
            inviter_username: "alice".into(),
            invitee_id: 2,
            invitee_username: "bob".into(),
            list_id: 10,
            list_name: "Groceries".into(),
        }
    }

    #[test]
    fn invitee_accepts_and_declines() {
        let inv = invitation();
        assert!(Resolution::Accept.authorize(&inv, 2).is_ok());
        assert!(Resolution::Decline.authorize(&inv, 2).is_ok());
        assert!(matches!(
            Resolution::Accept.authorize(&inv, 1),
            Err(AppError::Forbidden)
        ));
        assert!(matches!(
            Resolution::Decline.authorize(&inv, 1),
            Err(AppError::Forbidden)
        ));
    }

    #[test]
    fn only_inviter_revokes() {
        let inv = invitation();
        assert!(Resolution::Revoke.authorize(&inv, 1).is_ok());
        assert!(matches!(
            Resolution::Revoke.authorize(&inv, 2),
            Err(AppError::Forbidden)
        ));
        assert!(matches!(
            Resolution::Revoke.authorize(&inv, 3),
            Err(AppError::Forbidden)
        ));
    }

    #[test]
    fn only_acceptance_grants_membership() {
        assert!(Resolution::Accept.grants_membership());
        assert!(!Resolution::Decline.grants_membership());
        assert!(!Resolution::Revoke.grants_membership());
    }
}
