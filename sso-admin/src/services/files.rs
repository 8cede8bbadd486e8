use crate::config::files::FilesConfig;
use crate::errors::ServiceError;
use async_trait::async_trait;
use log::{error, info};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use utoipa::ToSchema;

#[derive(Debug, Error)]
pub enum FileStorageError {
    #[error("File storage I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Blob storage for uploaded avatars and logos
#[async_trait]
pub trait FileStorage: Send + Sync {
    /// Stores `content` under `file_name`, replacing any previous file of that name
    async fn save(&self, file_name: &str, content: &[u8]) -> Result<(), FileStorageError>;

    /// Public URL of a stored file
    fn file_url(&self, file_name: &str) -> String;
}

/// Writes uploads below `{root}/{folder}`, served back as `/{folder}/{file_name}`
#[derive(Debug, Clone)]
pub struct LocalFileStorage {
    dir: PathBuf,
    folder: String,
}

impl LocalFileStorage {
    pub fn new(config: &FilesConfig) -> Self {
        Self {
            dir: config.upload_dir(),
            folder: config.folder.clone(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[async_trait]
impl FileStorage for LocalFileStorage {
    async fn save(&self, file_name: &str, content: &[u8]) -> Result<(), FileStorageError> {
        tokio::fs::create_dir_all(&self.dir).await?;
        tokio::fs::write(self.dir.join(file_name), content).await?;
        Ok(())
    }

    fn file_url(&self, file_name: &str) -> String {
        format!("/{}/{}", self.folder, file_name)
    }
}

/// Metadata of a stored upload
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FileUpload {
    pub file_name: String,
    pub file_path: String,
    pub file_size: usize,
    /// Extension including the dot, empty when the name has none
    pub file_type: String,
}

fn validate_file_name(file_name: &str) -> Result<&str, ServiceError> {
    let file_name = file_name.trim();
    if file_name.is_empty() {
        return Err(ServiceError::Validation("fileName is required".to_string()));
    }
    if file_name.contains(['/', '\\']) || file_name.contains("..") {
        return Err(ServiceError::Validation(format!(
            "fileName '{file_name}' must not contain path separators or '..'"
        )));
    }
    Ok(file_name)
}

pub async fn upload(
    storage: &dyn FileStorage,
    file_name: &str,
    content: &[u8],
) -> Result<FileUpload, ServiceError> {
    let file_name = validate_file_name(file_name)?;
    if content.is_empty() {
        return Err(ServiceError::Validation("file is empty".to_string()));
    }
    storage.save(file_name, content).await.map_err(|e| {
        error!("Failed to store upload '{file_name}': {e}");
        ServiceError::Persistence(format!("Failed to store '{file_name}'"))
    })?;

    let file_type = Path::new(file_name)
        .extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_default();
    info!("Stored upload '{file_name}' ({} bytes)", content.len());
    Ok(FileUpload {
        file_name: file_name.to_string(),
        file_path: storage.file_url(file_name),
        file_size: content.len(),
        file_type,
    })
}
