pub mod credentials;
pub mod session;
pub mod tokens;
