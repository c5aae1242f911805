//! # Gantry Core
//!
//! Component management implementation for the Gantry host application.
//!
//! ## Components
//!
//! - [`ComponentManager`] - The facade owning the record set and collaborators
//! - [`ComponentSet`] - The unified registry of [`ComponentRecord`]s
//! - [`canonical`] - Canonical host selection across the topology
//! - [`lifecycle`] - The operational state machine driven by host events
//! - [`enablement`] - Pack cascade and dependency closure resolution
//! - [`autoupdate`] - The auto-update pin set and policy gating
//!
//! ## Collaborators
//!
//! Hosts, the catalog, the enablement store, the policy store, and the
//! confirmation surface are consumed through the `gantry-protocols` traits.
//! [`MemoryEnablementStore`] and [`MemoryPolicyStore`] provide in-process
//! reference implementations.

pub mod autoupdate;
pub mod canonical;
pub mod config;
pub mod enablement;
pub mod lifecycle;
pub mod manager;
pub mod record;
pub mod registry;
pub mod store;

pub use config::{ConfigError, HostConfig, ManagerConfig};
pub use enablement::Resolution;
pub use manager::ComponentManager;
pub use record::{ComponentRecord, ComponentSnapshot};
pub use registry::{ComponentSet, OperationKind, PendingOperation};
pub use store::{MemoryEnablementStore, MemoryPolicyStore};
