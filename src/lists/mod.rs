pub mod store;

pub use store::MembershipStore;
