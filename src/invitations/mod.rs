pub mod resolution;
pub mod store;

pub use resolution::Resolution;
pub use store::InvitationStore;
