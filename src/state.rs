use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;

use crate::config::Config;
use crate::entries::EntryStore;
use crate::invitations::InvitationStore;
use crate::lists::MembershipStore;

pub type DbPool = Pool<SqliteConnectionManager>;

#[derive(Clone)]
pub struct AppState {
    pub db: DbPool,
    pub config: Config,
    pub lists: MembershipStore,
    pub entries: EntryStore,
    pub invitations: InvitationStore,
}

impl AppState {
    pub fn new(db: DbPool, config: Config) -> Self {
        Self {
            lists: MembershipStore::new(db.clone()),
            entries: EntryStore::new(db.clone()),
            invitations: InvitationStore::new(db.clone()),
            db,
            config,
        }
    }
}
