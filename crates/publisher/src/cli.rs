//! Subcommands of the publisher CLI

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use marketplace_core::application::PublishJobService;
use marketplace_core::domain::{FileResource, FileType, ResourceId, StorageType, VersionId};
use marketplace_core::port::EntityStore;
use serde::Serialize;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(name = "marketplace-publisher")]
#[command(about = "Extension marketplace publish pipeline", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file (default: ./marketplace.toml if present)
    #[arg(long, env = "MARKETPLACE_CONFIG")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show a file resource (metadata only)
    ShowResource {
        /// File resource ID
        id: ResourceId,
    },

    /// Read a file from disk, place it and persist it as a new resource
    AddResource {
        /// Owning extension version ID
        #[arg(long)]
        version_id: VersionId,

        /// Resource type (download, manifest, readme, icon, ...)
        #[arg(long = "type")]
        file_type: FileType,

        /// Resource name (defaults to the file name)
        #[arg(long)]
        name: Option<String>,

        /// File to read the content from
        #[arg(long)]
        file: PathBuf,
    },

    /// Re-run storage placement for an existing resource
    Store {
        /// File resource ID
        id: ResourceId,
    },

    /// Delete all non-download resources of a version
    DeleteResources {
        /// Extension version ID
        version_id: VersionId,
    },

    /// Activate a version and refresh its extension
    Activate {
        /// Extension version ID
        version_id: VersionId,
    },
}

/// JSON view of a resource without its content
#[derive(Debug, Serialize)]
struct ResourceView<'a> {
    id: Option<ResourceId>,
    extension_version_id: VersionId,
    name: &'a str,
    #[serde(rename = "type")]
    file_type: FileType,
    storage_type: Option<StorageType>,
    content_len: usize,
}

impl<'a> From<&'a FileResource> for ResourceView<'a> {
    fn from(resource: &'a FileResource) -> Self {
        Self {
            id: resource.id,
            extension_version_id: resource.extension_version_id,
            name: &resource.name,
            file_type: resource.file_type,
            storage_type: resource.storage_type,
            content_len: resource.content_len(),
        }
    }
}

fn print_resource(resource: &FileResource) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(&ResourceView::from(resource))?);
    Ok(())
}

pub async fn run(
    command: Commands,
    service: &PublishJobService,
    entities: &dyn EntityStore,
) -> Result<()> {
    match command {
        Commands::ShowResource { id } => {
            let resource = service
                .get_file_resource(id)
                .await?
                .ok_or_else(|| anyhow!("File resource {} not found", id))?;
            print_resource(&resource)?;
        }

        Commands::AddResource {
            version_id,
            file_type,
            name,
            file,
        } => {
            entities
                .find_extension_version(version_id)
                .await?
                .ok_or_else(|| anyhow!("Extension version {} not found", version_id))?;

            let name = match name {
                Some(name) => name,
                None => file
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .ok_or_else(|| anyhow!("Cannot derive a name from {}", file.display()))?,
            };
            let content = tokio::fs::read(&file)
                .await
                .with_context(|| format!("Failed to read {}", file.display()))?;

            let mut resource = FileResource::new(version_id, name, file_type, content);
            if resource.is_download() {
                service.store_download(&mut resource).await?;
            } else {
                service.store_resource(&mut resource).await?;
            }
            service.persist_resource(&mut resource).await?;

            info!(resource_id = ?resource.id, "Resource added");
            print_resource(&resource)?;
        }

        Commands::Store { id } => {
            let mut resource = service
                .get_file_resource(id)
                .await?
                .ok_or_else(|| anyhow!("File resource {} not found", id))?;

            if resource.is_download() {
                service.store_download(&mut resource).await?;
            } else {
                service.store_resource(&mut resource).await?;
            }
            service.update_resource(&mut resource).await?;
            print_resource(&resource)?;
        }

        Commands::DeleteResources { version_id } => {
            let version = entities
                .find_extension_version(version_id)
                .await?
                .ok_or_else(|| anyhow!("Extension version {} not found", version_id))?;

            let removed = service.delete_file_resources(&version).await?;
            println!("Deleted {} resource(s) of version {}", removed, version_id);
        }

        Commands::Activate { version_id } => {
            let mut version = entities
                .find_extension_version(version_id)
                .await?
                .ok_or_else(|| anyhow!("Extension version {} not found", version_id))?;

            service.activate_extension(&mut version).await?;

            let extension = entities
                .find_extension(version.extension_id)
                .await?
                .ok_or_else(|| anyhow!("Extension {} not found", version.extension_id))?;
            println!("{}", serde_json::to_string_pretty(&extension)?);
        }
    }

    Ok(())
}
