//! Execution host descriptors.

use serde::{Deserialize, Serialize};

use crate::ComponentKind;

/// Identifier of an execution host.
pub type HostId = String;

/// An execution location capable of running components.
///
/// Topology order (the order hosts are registered) doubles as selection
/// precedence when more than one host matches a declared kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Host {
    pub id: HostId,
    pub label: String,
    /// A remote execution host, as opposed to the user's machine.
    #[serde(default)]
    pub remote: bool,
    /// Kinds this host can natively run, in preference order.
    #[serde(default)]
    pub affinity: Vec<ComponentKind>,
}

impl Host {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            remote: false,
            affinity: Vec::new(),
        }
    }

    /// A local host with the conventional `[ui, web]` affinity.
    pub fn local(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self::new(id, label).with_affinity(vec![ComponentKind::Ui, ComponentKind::Web])
    }

    /// A remote host with the conventional `[workspace, web]` affinity.
    pub fn remote(id: impl Into<String>, label: impl Into<String>) -> Self {
        let mut host =
            Self::new(id, label).with_affinity(vec![ComponentKind::Workspace, ComponentKind::Web]);
        host.remote = true;
        host
    }

    pub fn with_affinity(mut self, affinity: Vec<ComponentKind>) -> Self {
        self.affinity = affinity;
        self
    }

    pub fn with_remote(mut self, remote: bool) -> Self {
        self.remote = remote;
        self
    }

    /// Whether this host can natively run the given kind.
    pub fn supports(&self, kind: ComponentKind) -> bool {
        self.affinity.contains(&kind)
    }
}

#[cfg(test)]
#[path = "host_tests.rs"]
mod tests;
