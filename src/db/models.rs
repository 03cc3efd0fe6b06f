use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    #[serde(skip)]
    pub password_hash: String,
}

/// A login session. `expires_at == None` means the session never expires.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub user: User,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl Session {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expires_at| expires_at <= now)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct List {
    pub id: i64,
    pub name: String,
    pub creator_id: i64,
    pub creator_username: String,
}

/// A list together with its entries, as returned to members.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListDetail {
    #[serde(flatten)]
    pub list: List,
    pub entries: Vec<Entry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub id: i64,
    pub list_id: i64,
    pub text: String,
    pub category: String,
    pub order_index: i64,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
}

/// A pending invitation, joined with the names of everything it refers to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invitation {
    pub token: String,
    pub inviter_id: i64,
    pub inviter_username: String,
    pub invitee_id: i64,
    pub invitee_username: String,
    pub list_id: i64,
    pub list_name: String,
}
