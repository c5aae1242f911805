//! Component identity, installed copies, and catalog entries.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use uuid::Uuid;

use chrono::{DateTime, Utc};

/// Case-normalized component identifier: `"<publisher>.<name>"`.
///
/// Equality, ordering, and hashing use the normalized key only; the catalog
/// UUID is advisory and never participates in comparisons.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentId {
    key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uuid: Option<Uuid>,
}

impl ComponentId {
    /// Build an identifier from publisher and name.
    pub fn new(publisher: impl AsRef<str>, name: impl AsRef<str>) -> Self {
        Self {
            key: format!("{}.{}", publisher.as_ref(), name.as_ref()).to_lowercase(),
            uuid: None,
        }
    }

    /// Build an identifier from a raw `"publisher.name"` key.
    pub fn from_key(key: impl AsRef<str>) -> Self {
        Self {
            key: key.as_ref().to_lowercase(),
            uuid: None,
        }
    }

    pub fn with_uuid(mut self, uuid: Uuid) -> Self {
        self.uuid = Some(uuid);
        self
    }

    /// The normalized `"publisher.name"` key.
    pub fn as_str(&self) -> &str {
        &self.key
    }

    /// The publisher portion of the key.
    pub fn publisher(&self) -> &str {
        self.key.split_once('.').map(|(p, _)| p).unwrap_or(&self.key)
    }

    /// The name portion of the key.
    pub fn name(&self) -> &str {
        self.key.split_once('.').map(|(_, n)| n).unwrap_or("")
    }
}

impl PartialEq for ComponentId {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for ComponentId {}

impl Hash for ComponentId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

impl PartialOrd for ComponentId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ComponentId {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key.cmp(&other.key)
    }
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key)
    }
}

/// Where a component declares it is able to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentKind {
    Ui,
    Workspace,
    Web,
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ui => write!(f, "ui"),
            Self::Workspace => write!(f, "workspace"),
            Self::Web => write!(f, "web"),
        }
    }
}

/// Install/uninstall progression of a component record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationalState {
    Uninstalled,
    Installing,
    Installed,
    Uninstalling,
}

impl Default for OperationalState {
    fn default() -> Self {
        Self::Uninstalled
    }
}

impl fmt::Display for OperationalState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Uninstalled => write!(f, "uninstalled"),
            Self::Installing => write!(f, "installing"),
            Self::Installed => write!(f, "installed"),
            Self::Uninstalling => write!(f, "uninstalling"),
        }
    }
}

/// Scope label owned by the enablement store (e.g. a workspace identity).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Scope(pub String);

impl Scope {
    pub fn new(label: impl Into<String>) -> Self {
        Self(label.into())
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Enablement of a component record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnablementState {
    EnabledGlobally,
    DisabledGlobally,
    DisabledInScope(Scope),
}

impl EnablementState {
    /// True only for the globally-enabled state.
    pub fn is_enabled(&self) -> bool {
        matches!(self, Self::EnabledGlobally)
    }

    pub fn is_disabled(&self) -> bool {
        !self.is_enabled()
    }
}

impl Default for EnablementState {
    fn default() -> Self {
        Self::EnabledGlobally
    }
}

/// User-writable metadata section of an installed copy.
///
/// Replaced wholesale through [`HostManagement::update_metadata`]; callers
/// derive the new value from the current copy.
///
/// [`HostManagement::update_metadata`]: crate::HostManagement::update_metadata
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CopyMetadata {
    /// Exception flag against the global auto-update policy.
    #[serde(default)]
    pub pinned: bool,
    /// Explicit per-component auto-update choice; `None` follows the policy.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_update: Option<bool>,
}

/// One host's installed artifact for a component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstalledCopy {
    pub publisher: String,
    pub name: String,
    pub version: String,
    #[serde(default)]
    pub kinds: Vec<ComponentKind>,
    #[serde(default)]
    pub depends_on: Vec<ComponentId>,
    #[serde(default)]
    pub pack_members: Vec<ComponentId>,
    /// Bundled with the host application itself.
    #[serde(default)]
    pub system: bool,
    #[serde(default)]
    pub metadata: CopyMetadata,
}

impl InstalledCopy {
    /// Create a new installed copy with empty declarations.
    pub fn new(
        publisher: impl Into<String>,
        name: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            publisher: publisher.into(),
            name: name.into(),
            version: version.into(),
            kinds: Vec::new(),
            depends_on: Vec::new(),
            pack_members: Vec::new(),
            system: false,
            metadata: CopyMetadata::default(),
        }
    }

    /// The normalized identifier derived from publisher and name.
    pub fn identifier(&self) -> ComponentId {
        ComponentId::new(&self.publisher, &self.name)
    }

    pub fn with_kinds(mut self, kinds: Vec<ComponentKind>) -> Self {
        self.kinds = kinds;
        self
    }

    pub fn with_dependencies(mut self, depends_on: Vec<ComponentId>) -> Self {
        self.depends_on = depends_on;
        self
    }

    pub fn with_pack_members(mut self, pack_members: Vec<ComponentId>) -> Self {
        self.pack_members = pack_members;
        self
    }

    pub fn with_system(mut self, system: bool) -> Self {
        self.system = system;
        self
    }

    pub fn with_metadata(mut self, metadata: CopyMetadata) -> Self {
        self.metadata = metadata;
        self
    }
}

/// Catalog metadata for a component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub identifier: ComponentId,
    pub publisher: String,
    pub name: String,
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub depends_on: Vec<ComponentId>,
    #[serde(default)]
    pub pack_members: Vec<ComponentId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published_at: Option<DateTime<Utc>>,
}

impl CatalogEntry {
    /// Create a new catalog entry.
    pub fn new(
        publisher: impl Into<String>,
        name: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        let publisher = publisher.into();
        let name = name.into();
        Self {
            identifier: ComponentId::new(&publisher, &name),
            publisher,
            name,
            version: version.into(),
            display_name: None,
            description: None,
            depends_on: Vec::new(),
            pack_members: Vec::new(),
            published_at: None,
        }
    }

    pub fn with_uuid(mut self, uuid: Uuid) -> Self {
        self.identifier.uuid = Some(uuid);
        self
    }

    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = Some(display_name.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_dependencies(mut self, depends_on: Vec<ComponentId>) -> Self {
        self.depends_on = depends_on;
        self
    }

    pub fn with_pack_members(mut self, pack_members: Vec<ComponentId>) -> Self {
        self.pack_members = pack_members;
        self
    }
}

/// Catalog search request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Restrict the query to specific identifiers.
    #[serde(default)]
    pub identifiers: Vec<ComponentId>,
    #[serde(default)]
    pub page: usize,
    #[serde(default)]
    pub page_size: usize,
}

impl CatalogQuery {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::default()
        }
    }

    pub fn identifiers(identifiers: Vec<ComponentId>) -> Self {
        Self {
            identifiers,
            ..Self::default()
        }
    }
}

impl Default for CatalogQuery {
    fn default() -> Self {
        Self {
            text: None,
            identifiers: Vec::new(),
            page: 0,
            page_size: 50,
        }
    }
}

/// One page of catalog results.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogPage {
    pub entries: Vec<CatalogEntry>,
    /// Total matches across all pages.
    pub total: usize,
}

#[cfg(test)]
#[path = "component_tests.rs"]
mod tests;
