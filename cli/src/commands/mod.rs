pub mod check;
pub mod config;
pub mod credentials;
pub mod hash_password;
pub mod policy;
pub mod serve;
