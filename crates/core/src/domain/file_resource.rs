// File Resource Domain Model

use super::error::DomainError;
use super::extension::VersionId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// File resource ID (assigned by the entity store)
pub type ResourceId = i64;

/// Kind of file attached to an extension version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FileType {
    /// The packaged extension itself
    Download,
    DownloadSha256,
    DownloadSig,
    Manifest,
    #[serde(rename = "vsixmanifest")]
    VsixManifest,
    Readme,
    Changelog,
    License,
    Icon,
}

impl FileType {
    pub const ALL: [FileType; 9] = [
        FileType::Download,
        FileType::DownloadSha256,
        FileType::DownloadSig,
        FileType::Manifest,
        FileType::VsixManifest,
        FileType::Readme,
        FileType::Changelog,
        FileType::License,
        FileType::Icon,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FileType::Download => "download",
            FileType::DownloadSha256 => "download-sha256",
            FileType::DownloadSig => "download-sig",
            FileType::Manifest => "manifest",
            FileType::VsixManifest => "vsixmanifest",
            FileType::Readme => "readme",
            FileType::Changelog => "changelog",
            FileType::License => "license",
            FileType::Icon => "icon",
        }
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FileType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FileType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| DomainError::UnknownFileType(s.to_string()))
    }
}

/// Where the binary content of a resource lives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageType {
    /// Content is kept in the database row
    Database,
    /// Content lives in the local-filesystem blob store
    Local,
}

impl StorageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageType::Database => "database",
            StorageType::Local => "local",
        }
    }

    pub fn is_external(&self) -> bool {
        !matches!(self, StorageType::Database)
    }
}

impl fmt::Display for StorageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StorageType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "database" => Ok(StorageType::Database),
            "local" => Ok(StorageType::Local),
            other => Err(DomainError::UnknownStorageType(other.to_string())),
        }
    }
}

/// A stored file owned by an extension version
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileResource {
    pub id: Option<ResourceId>,
    pub extension_version_id: VersionId,
    pub name: String,
    pub file_type: FileType,

    /// `None` until placement has run
    pub storage_type: Option<StorageType>,

    /// Binary content; cleared once the bytes are owned by external storage
    #[serde(skip)]
    pub content: Option<Vec<u8>>,
}

impl FileResource {
    /// Create a new, not yet persisted resource
    pub fn new(
        extension_version_id: VersionId,
        name: impl Into<String>,
        file_type: FileType,
        content: Vec<u8>,
    ) -> Self {
        Self {
            id: None,
            extension_version_id,
            name: name.into(),
            file_type,
            storage_type: None,
            content: Some(content),
        }
    }

    pub fn is_download(&self) -> bool {
        self.file_type == FileType::Download
    }

    pub fn content_len(&self) -> usize {
        self.content.as_ref().map_or(0, Vec::len)
    }

    pub fn require_id(&self) -> Result<ResourceId, DomainError> {
        self.id.ok_or(DomainError::Unsaved("file resource"))
    }
}
