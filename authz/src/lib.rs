//! Access-decision core for warden.
//!
//! This crate answers three questions for a transport layer:
//!
//! - **Authenticate**: does this username/credential pair verify against any
//!   configured provider? ([`AuthChain`])
//! - **Authorize**: may this user perform this action on this resource path,
//!   and which resources matching a pattern may they act on?
//!   ([`AuthorizationResolver`])
//! - **Host trust**: is this host identifier trusted? ([`HostTrustResolver`])
//!
//! [`DecisionService`] bundles the three behind one facade and triggers
//! [`RefreshRegistry::refresh_all`] so cached providers pick up changes made
//! to their stores.
//!
//! # Architecture Overview
//!
//! 1. **Request arrives** at the transport
//! 2. **DecisionService** dispatches to the chain or a resolver
//! 3. **Resolvers** consult the storage traits ([`PrincipalDirectory`],
//!    [`GrantTable`], [`ResourceCatalog`], [`HostTrustTable`])
//! 4. **Decision** comes back as a boolean; errors are reserved for malformed
//!    requests and unreachable backends
//!
//! Storage is behind traits so the backend (flat file, SQLite, a remote
//! service) never leaks into decisions. [`MemoryPolicy`] serves an immutable
//! [`PolicySnapshot`] for any provider that can load its data up front.

pub mod chain;
pub mod directory;
pub mod error;
pub mod events;
pub mod grants;
pub mod hosts;
pub mod memory;
pub mod refresh;
pub mod resolver;
pub mod service;
pub mod types;

pub use chain::{AuthChain, AuthenticationProvider};
pub use directory::PrincipalDirectory;
pub use error::{AuthzError, Result};
pub use events::{EventBus, PrincipalsChanged};
pub use grants::{GrantTable, ResourceCatalog};
pub use hosts::{HostTrustResolver, HostTrustTable};
pub use memory::{MemoryPolicy, PolicySnapshot};
pub use refresh::{RefreshFailure, RefreshRegistry, RefreshReport, Refreshable};
pub use resolver::{AuthorizationResolver, ResourceMatches};
pub use service::DecisionService;
pub use types::{Action, ResourcePath};
