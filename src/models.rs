use std::fmt;

use chrono::{DateTime, Utc};
use serde::Deserialize;

/// Package ecosystems accepted by the GitHub Packages REST API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum PackageType {
    Npm,
    Maven,
    Rubygems,
    Docker,
    Nuget,
    Container,
}

impl PackageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PackageType::Npm => "npm",
            PackageType::Maven => "maven",
            PackageType::Rubygems => "rubygems",
            PackageType::Docker => "docker",
            PackageType::Nuget => "nuget",
            PackageType::Container => "container",
        }
    }

    pub fn is_container(&self) -> bool {
        matches!(self, PackageType::Container)
    }
}

impl fmt::Display for PackageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether the owner is a user account or an organization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OwnerKind {
    #[default]
    User,
    Org,
}

impl OwnerKind {
    pub fn path_segment(&self) -> &'static str {
        match self {
            OwnerKind::User => "users",
            OwnerKind::Org => "orgs",
        }
    }
}

/// Registry-assigned version identifier.
///
/// The REST API hands out integers; ids passed in explicitly may be opaque
/// strings (e.g. GraphQL node ids). Numeric ids order numerically and
/// before any opaque id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(untagged)]
pub enum VersionId {
    Numeric(u64),
    Opaque(String),
}

impl From<&str> for VersionId {
    fn from(raw: &str) -> Self {
        match raw.parse::<u64>() {
            Ok(n) => VersionId::Numeric(n),
            Err(_) => VersionId::Opaque(raw.to_string()),
        }
    }
}

impl fmt::Display for VersionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VersionId::Numeric(n) => write!(f, "{}", n),
            VersionId::Opaque(s) => f.write_str(s),
        }
    }
}

/// GET /{users|orgs}/<owner>/packages/<type>/<name>/versions item
#[derive(Debug, Deserialize)]
pub struct PackageVersion {
    pub id: VersionId,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub metadata: Option<VersionMetadata>,
}

#[derive(Debug, Deserialize)]
pub struct VersionMetadata {
    pub container: Option<ContainerMetadata>,
}

#[derive(Debug, Deserialize)]
pub struct ContainerMetadata {
    #[serde(default)]
    pub tags: Vec<String>,
}

/// GET /{users|orgs}/<owner>/packages item
#[derive(Debug, Deserialize)]
pub struct PackageSummary {
    pub name: String,
}

/// Error body returned by the GitHub REST API
#[derive(Debug, Deserialize)]
pub struct ApiErrorBody {
    pub message: Option<String>,
    #[serde(default)]
    pub errors: Vec<ApiErrorEntry>,
}

#[derive(Debug, Deserialize)]
pub struct ApiErrorEntry {
    pub message: Option<String>,
}

impl ApiErrorBody {
    /// Most specific message in the body, if any.
    pub fn detail(&self) -> Option<&str> {
        self.errors
            .first()
            .and_then(|e| e.message.as_deref())
            .or(self.message.as_deref())
    }
}

/// GET /v2/<name>/manifests/<digest> on the container registry. Only image
/// indexes (multi-platform) carry `manifests`.
#[derive(Debug, Deserialize)]
pub struct ImageIndex {
    #[serde(default)]
    pub manifests: Vec<ManifestDescriptor>,
}

#[derive(Debug, Deserialize)]
pub struct ManifestDescriptor {
    pub digest: String,
}

/// One version of a package, normalized from the API response
#[derive(Debug, Clone)]
pub struct VersionRecord {
    pub id: VersionId,
    pub label: String,
    pub created_at: DateTime<Utc>,
    pub tagged: bool,
    pub tags: Vec<String>,
}

impl VersionRecord {
    pub fn from_api(version: PackageVersion, package_type: PackageType) -> Self {
        let tags = if package_type.is_container() {
            version
                .metadata
                .and_then(|m| m.container)
                .map(|c| c.tags)
                .unwrap_or_default()
        } else {
            Vec::new()
        };

        Self {
            id: version.id,
            label: version.name,
            created_at: version.created_at,
            tagged: !tags.is_empty(),
            tags,
        }
    }
}

/// The package a run operates on
#[derive(Debug, Clone)]
pub struct PackageTarget {
    pub owner: String,
    pub owner_kind: OwnerKind,
    pub package_type: PackageType,
    pub package_name: String,
}

/// Per-id result of a delete call
#[derive(Debug, Clone)]
pub struct DeletionOutcome {
    pub id: VersionId,
    pub succeeded: bool,
    pub error: Option<String>,
}
