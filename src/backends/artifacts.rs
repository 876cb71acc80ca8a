// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 stevedore contributors

//! Remote Dockerfile downloads and rendered Dockerfile destinations

use async_trait::async_trait;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::NamedTempFile;

use super::{ArtifactStore, AwsCli};
use crate::errors::{StevedoreError, StevedoreResult};

/// Downloads over HTTPS, uploads to S3, copies everything else locally
#[derive(Debug)]
pub struct DefaultArtifactStore {
    client: reqwest::Client,
    aws: Arc<AwsCli>,
}

impl DefaultArtifactStore {
    pub fn new(aws: Arc<AwsCli>) -> Self {
        Self {
            client: reqwest::Client::new(),
            aws,
        }
    }
}

#[async_trait]
impl ArtifactStore for DefaultArtifactStore {
    async fn fetch(&self, url: &str) -> StevedoreResult<NamedTempFile> {
        tracing::debug!(url, "downloading Dockerfile");

        let body = self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;

        let mut file = NamedTempFile::new()?;
        file.write_all(&body)?;
        file.flush()?;
        Ok(file)
    }

    async fn save(&self, local: &Path, destination: &str) -> StevedoreResult<()> {
        if destination.starts_with("s3://") {
            return self.aws.upload_public(local, destination).await;
        }

        copy_local(local, Path::new(destination)).await
    }
}

/// Copy a file, creating the destination's parent directories
async fn copy_local(from: &Path, to: &Path) -> StevedoreResult<()> {
    let write_error = |path: PathBuf, e: std::io::Error| StevedoreError::FileWriteError {
        path,
        error: e.to_string(),
    };

    if let Some(parent) = to.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| write_error(parent.to_path_buf(), e))?;
    }

    tokio::fs::copy(from, to)
        .await
        .map_err(|e| write_error(to.to_path_buf(), e))?;
    Ok(())
}
