//! Authentication providers for warden.
//!
//! Each provider implements [`authz::AuthenticationProvider`] against one
//! kind of credential store:
//!
//! - [`StaticProvider`]: hashes listed in configuration
//! - [`HtpasswdProvider`]: a `username:hash` file, reloaded on refresh
//! - [`SqliteCredentialProvider`]: a SQLite table, read per request
//! - [`RemoteProvider`]: an HTTP endpoint answering Basic auth
//!
//! Stored hashes are argon2 PHC strings; see [`password`].

pub mod error;
pub mod htpasswd;
pub mod password;
pub mod remote;
pub mod sqlite;
pub mod static_users;

pub use error::{AuthnError, Result};
pub use htpasswd::HtpasswdProvider;
pub use password::{hash_password, verify_password};
pub use remote::RemoteProvider;
pub use sqlite::SqliteCredentialProvider;
pub use static_users::StaticProvider;
