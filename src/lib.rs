// Library exports for shoplist
// This allows integration tests and external code to use shoplist modules

pub mod auth;
pub mod config;
pub mod db;
pub mod entries;
pub mod error;
pub mod extractors;
pub mod invitations;
pub mod lists;
pub mod response;
pub mod routes;
pub mod state;
