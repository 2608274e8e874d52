pub mod auth;
pub mod authz;
pub mod health;
pub mod host;
pub mod refresh;
