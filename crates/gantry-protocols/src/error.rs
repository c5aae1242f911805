//! Error types for the Gantry protocol layer.

use thiserror::Error;

use crate::{ComponentId, HostId};

/// Failure reported by an external collaborator, propagated unmodified.
#[derive(Debug, Clone, Error)]
pub enum CollaboratorError {
    /// A host-management call failed.
    #[error("Host '{host}' failed: {message}")]
    Host { host: HostId, message: String },

    /// A catalog query or compatibility lookup failed.
    #[error("Catalog failure: {0}")]
    Catalog(String),

    /// The enablement store rejected or failed a read/write.
    #[error("Enablement store failure: {0}")]
    Store(String),

    /// A metadata update was rejected by the owning host.
    #[error("Metadata update failed: {0}")]
    Metadata(String),
}

/// Operation-level error taxonomy of the component manager.
#[derive(Debug, Clone, Error)]
pub enum ComponentError {
    /// The change was declined by the user or is structurally forbidden.
    /// Nothing was mutated.
    #[error("Operation not allowed: {0}")]
    NotAllowed(String),

    /// No host matched any declared kind and no fallback applied.
    #[error("No canonical host for component: {0}")]
    NoCanonicalHost(ComponentId),

    /// An operation named an identifier with no known record.
    #[error("Unknown component: {0}")]
    UnknownComponent(ComponentId),

    /// A collaborator failed; the record set is unchanged when the failure
    /// preceded the commit step.
    #[error("Collaborator failure: {0}")]
    Collaborator(#[from] CollaboratorError),
}
