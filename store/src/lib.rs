//! Policy storage for warden.
//!
//! Both stores load users, groups, grants, host rules and the resource
//! catalog into an [`authz::MemoryPolicy`] and implement
//! [`authz::Refreshable`] to reload it:
//!
//! - [`FilePolicyStore`]: a YAML [`PolicyDocument`]
//! - [`SqlitePolicyStore`]: SQLite tables with write operations

pub mod document;
pub mod error;
pub mod file;
pub mod sqlite;

pub use document::{GrantEntry, PolicyDocument};
pub use error::{Result, StoreError};
pub use file::FilePolicyStore;
pub use sqlite::SqlitePolicyStore;
