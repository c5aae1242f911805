//! # Gantry Protocols
//!
//! Protocol definitions for the Gantry component manager.
//! Contains types, events, errors, and collaborator traits - no
//! implementations.
//!
//! ## Collaborator Traits
//!
//! - [`HostManagement`] - per-host install/uninstall and metadata access
//! - [`CatalogService`] - paged catalog search and compatibility lookup
//! - [`EnablementStore`] - durable per-scope enablement flags
//! - [`PolicyStore`] - global auto-update policy
//! - [`ConfirmationSurface`] - user confirmation for cascading changes

pub mod component;
pub mod error;
pub mod events;
pub mod host;
pub mod services;

pub use component::{
    CatalogEntry, CatalogPage, CatalogQuery, ComponentId, ComponentKind, CopyMetadata,
    EnablementState, InstalledCopy, OperationalState, Scope,
};
pub use error::{CollaboratorError, ComponentError};
pub use events::{ComponentChange, EnablementChange, LifecycleEvent};
pub use host::{Host, HostId};
pub use services::{
    AutoUpdatePolicy, AutoUpdateTarget, CatalogService, ConfirmationSurface, EnablementStore,
    HostManagement, PolicyStore,
};
