pub mod ordering;
pub mod store;

pub use store::EntryStore;
