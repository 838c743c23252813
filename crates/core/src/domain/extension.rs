// Extension & ExtensionVersion Domain Models

use super::error::DomainError;
use chrono::{DateTime, Utc};
use semver::Version;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Extension ID (assigned by the entity store)
pub type ExtensionId = i64;

/// Extension version ID (assigned by the entity store)
pub type VersionId = i64;

/// A packaged add-on distributed through the marketplace
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Extension {
    pub id: Option<ExtensionId>,
    pub namespace: String,
    pub name: String,

    // Derived from the extension's versions, see `ExtensionState`
    pub active: bool,
    pub latest_version_id: Option<VersionId>,
    pub latest_prerelease_id: Option<VersionId>,
    pub last_updated: Option<DateTime<Utc>>,
}

impl Extension {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: None,
            namespace: namespace.into(),
            name: name.into(),
            active: false,
            latest_version_id: None,
            latest_prerelease_id: None,
            last_updated: None,
        }
    }

    /// `namespace.name`, the public identifier
    pub fn full_name(&self) -> String {
        format!("{}.{}", self.namespace, self.name)
    }

    pub fn require_id(&self) -> Result<ExtensionId, DomainError> {
        self.id.ok_or(DomainError::Unsaved("extension"))
    }

    pub fn apply(&mut self, state: ExtensionState) {
        self.active = state.active;
        self.latest_version_id = state.latest_version_id;
        self.latest_prerelease_id = state.latest_prerelease_id;
        self.last_updated = state.last_updated;
    }
}

/// One published version of an extension
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtensionVersion {
    pub id: Option<VersionId>,
    pub extension_id: ExtensionId,
    pub version: String,
    pub timestamp: DateTime<Utc>,
    pub active: bool,
}

impl ExtensionVersion {
    /// Create a new, inactive version
    pub fn new(
        extension_id: ExtensionId,
        version: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id: None,
            extension_id,
            version: version.into(),
            timestamp,
            active: false,
        }
    }

    pub fn require_id(&self) -> Result<VersionId, DomainError> {
        self.id.ok_or(DomainError::Unsaved("extension version"))
    }

    fn semver(&self) -> Option<Version> {
        match Version::parse(&self.version) {
            Ok(v) => Some(v),
            Err(e) => {
                warn!(
                    version_id = ?self.id,
                    version = %self.version,
                    error = %e,
                    "Ignoring version with invalid semver"
                );
                None
            }
        }
    }
}

/// Aggregate state of an extension, recomputed from its versions
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtensionState {
    pub active: bool,
    pub latest_version_id: Option<VersionId>,
    pub latest_prerelease_id: Option<VersionId>,
    pub last_updated: Option<DateTime<Utc>>,
}

impl ExtensionState {
    /// Derive extension state from all of its versions.
    ///
    /// Only active versions count. The latest version prefers releases over
    /// pre-releases; versions with an unparseable version string never become
    /// "latest" but still make the extension active.
    pub fn compute(versions: &[ExtensionVersion]) -> Self {
        let active: Vec<&ExtensionVersion> = versions.iter().filter(|v| v.active).collect();
        if active.is_empty() {
            return Self::default();
        }

        let ranked: Vec<(Version, &ExtensionVersion)> = active
            .iter()
            .filter_map(|v| v.semver().map(|sv| (sv, *v)))
            .collect();

        let latest_release = newest(ranked.iter().filter(|(sv, _)| sv.pre.is_empty()));
        let latest_prerelease = newest(ranked.iter().filter(|(sv, _)| !sv.pre.is_empty()));

        Self {
            active: true,
            latest_version_id: latest_release.or(latest_prerelease),
            latest_prerelease_id: latest_prerelease,
            last_updated: active.iter().map(|v| v.timestamp).max(),
        }
    }
}

/// Highest semver wins; equal versions fall back to the publish timestamp
fn newest<'r, 'v: 'r>(
    candidates: impl Iterator<Item = &'r (Version, &'v ExtensionVersion)>,
) -> Option<VersionId> {
    candidates
        .max_by(|(a, va), (b, vb)| a.cmp(b).then(va.timestamp.cmp(&vb.timestamp)))
        .and_then(|(_, v)| v.id)
}
