//! Download remote log processors into a local directory

use crate::staging::reference::{split_references, staged_file_name, ReferenceError, S3Reference};
use crate::staging::store::{ObjectStore, ObjectStoreError};
use futures::StreamExt;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

/// Directory log processors are staged into
pub const DEFAULT_STAGING_DIR: &str = "/tmp/log_processors";

/// A reference and the local path it will be written to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedPath {
    pub position: usize,
    pub reference: S3Reference,
    pub destination: PathBuf,
}

/// Fetches object references into a staging directory
#[derive(Debug, Clone)]
pub struct ResourceStager {
    staging_dir: PathBuf,
}

impl Default for ResourceStager {
    fn default() -> Self {
        Self::new(DEFAULT_STAGING_DIR)
    }
}

impl ResourceStager {
    pub fn new(staging_dir: impl Into<PathBuf>) -> Self {
        Self {
            staging_dir: staging_dir.into(),
        }
    }

    pub fn staging_dir(&self) -> &Path {
        &self.staging_dir
    }

    /// Resolve destinations without fetching anything.
    ///
    /// Stops at the first malformed reference.
    pub fn plan(&self, references: &str) -> Result<Vec<StagedPath>, ReferenceError> {
        split_references(references)
            .into_iter()
            .map(|(position, raw)| {
                let reference = S3Reference::parse(raw)?;
                let destination = self
                    .staging_dir
                    .join(staged_file_name(position, &reference));
                Ok(StagedPath {
                    position,
                    reference,
                    destination,
                })
            })
            .collect()
    }

    /// Download every reference in `references` (comma-separated), in order.
    ///
    /// Returns the local paths in reference order. An empty list does not
    /// touch the filesystem and never calls `connect`. The first failure
    /// aborts staging; files already written are left in place.
    pub async fn stage<S, F>(&self, references: &str, connect: F) -> Result<Vec<PathBuf>, StageError>
    where
        S: ObjectStore,
        F: FnOnce() -> Result<S, ObjectStoreError>,
    {
        let entries = split_references(references);
        if entries.is_empty() {
            return Ok(Vec::new());
        }

        tokio::fs::create_dir_all(&self.staging_dir)
            .await
            .map_err(|e| StageError::CreateDir {
                path: self.staging_dir.display().to_string(),
                source: e,
            })?;

        let store = connect().map_err(StageError::Connect)?;

        let mut staged = Vec::with_capacity(entries.len());
        for (position, raw) in entries {
            let reference = S3Reference::parse(raw)?;
            let destination = self
                .staging_dir
                .join(staged_file_name(position, &reference));

            log::info!("Downloading S3 object {} to {}", reference, destination.display());
            download(&store, &reference, &destination).await?;

            staged.push(destination);
        }

        Ok(staged)
    }
}

async fn download<S: ObjectStore>(
    store: &S,
    reference: &S3Reference,
    destination: &Path,
) -> Result<(), StageError> {
    let fetch_error = |source| StageError::Fetch {
        bucket: reference.bucket.clone(),
        key: reference.key.clone(),
        source,
    };
    let write_error = |source| StageError::Write {
        path: destination.display().to_string(),
        source,
    };

    let mut body = store
        .get_object(&reference.bucket, &reference.key)
        .await
        .map_err(fetch_error)?;

    let mut file = tokio::fs::File::create(destination)
        .await
        .map_err(write_error)?;

    let mut written = 0usize;
    while let Some(chunk) = body.next().await {
        let chunk = chunk.map_err(fetch_error)?;
        file.write_all(&chunk).await.map_err(write_error)?;
        written += chunk.len();
    }
    file.flush().await.map_err(write_error)?;

    log::debug!("Wrote {} bytes to {}", written, destination.display());
    Ok(())
}

/// Errors that can occur while staging log processors
#[derive(Debug, thiserror::Error)]
pub enum StageError {
    #[error("failed to create log processor directory '{path}': {source}")]
    CreateDir {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to initialize S3 client: {0}")]
    Connect(#[source] ObjectStoreError),

    #[error("failed to parse S3 path: {0}")]
    Reference(#[from] ReferenceError),

    #[error("failed to download s3://{bucket}/{key}: {source}")]
    Fetch {
        bucket: String,
        key: String,
        #[source]
        source: ObjectStoreError,
    },

    #[error("failed to write file {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
}
