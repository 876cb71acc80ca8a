// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 stevedore contributors

//! AWS CLI backend
//!
//! Secrets Manager lookups, ECR repository provisioning and S3 uploads,
//! all through the `aws` binary.

use async_trait::async_trait;
use once_cell::sync::{Lazy, OnceCell};
use regex::Regex;
use std::path::{Path, PathBuf};

use super::{locate, run_tool, RepositoryProvisioner, SecretStore};
use crate::errors::{StevedoreError, StevedoreResult};

static ECR_REGISTRY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[0-9]{10,}\.dkr\.ecr\.[a-z]{2}-[a-z]+-[0-9]+\.amazonaws\.com/.+")
        .expect("ECR pattern is valid")
});

/// An ECR repository parsed from a registry reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EcrRepository {
    pub region: String,
    pub name: String,
}

/// Parse an ECR registry reference; anything else gives `None`
pub fn parse_ecr_repository(registry: &str) -> Option<EcrRepository> {
    if !ECR_REGISTRY.is_match(registry) {
        return None;
    }

    let without_tag = registry.split(':').next().unwrap_or(registry);
    let (host, path) = without_tag.split_once('/')?;
    let region = host.split('.').nth(3)?;

    if path.is_empty() {
        return None;
    }

    Some(EcrRepository {
        region: region.to_string(),
        name: path.to_string(),
    })
}

/// Split `s3://bucket/key` into bucket and key
pub fn split_s3_location(location: &str) -> StevedoreResult<(String, String)> {
    let rest = location
        .strip_prefix("s3://")
        .ok_or_else(|| StevedoreError::InvalidInventory {
            reason: format!("{} is not a S3 URL", location),
            help: Some("Object-store destinations look like s3://bucket/key".to_string()),
        })?;

    let (bucket, key) = rest.split_once('/').unwrap_or((rest, ""));
    Ok((bucket.to_string(), key.to_string()))
}

/// AWS CLI backend
#[derive(Debug, Default)]
pub struct AwsCli {
    binary: OnceCell<PathBuf>,
}

impl AwsCli {
    pub fn new() -> Self {
        Self::default()
    }

    fn binary(&self) -> StevedoreResult<PathBuf> {
        locate(&self.binary, "aws")
    }

    /// Upload a file with a public-read ACL
    pub async fn upload_public(&self, local: &Path, location: &str) -> StevedoreResult<()> {
        let (bucket, key) = split_s3_location(location)?;
        tracing::debug!(bucket = %bucket, key = %key, "uploading to S3");

        let mut args = vec!["s3".into(), "cp".into(), local.as_os_str().to_os_string()];
        args.push(location.into());
        args.push("--acl".into());
        args.push("public-read".into());

        let output = run_tool::<_, std::ffi::OsString>(&self.binary()?, "aws", args).await?;
        if !output.success {
            return Err(StevedoreError::FileWriteError {
                path: PathBuf::from(location),
                error: output.stderr.trim().to_string(),
            });
        }

        Ok(())
    }
}

#[async_trait]
impl SecretStore for AwsCli {
    async fn get_secret(&self, name: &str, region: &str) -> StevedoreResult<String> {
        let output = run_tool(
            &self.binary()?,
            "aws",
            [
                "secretsmanager",
                "get-secret-value",
                "--secret-id",
                name,
                "--region",
                region,
                "--query",
                "SecretString",
                "--output",
                "text",
            ],
        )
        .await?;

        if !output.success {
            return Err(StevedoreError::ToolExecutionFailed {
                tool: "aws".to_string(),
                error: output.stderr.trim().to_string(),
                help: Some(format!("Check that secret '{}' exists in {}", name, region)),
            });
        }

        // The CLI appends a newline to text output
        Ok(output.stdout.trim_end_matches('\n').to_string())
    }
}

#[async_trait]
impl RepositoryProvisioner for AwsCli {
    async fn ensure_repository(&self, registry: &str) -> StevedoreResult<()> {
        let Some(repository) = parse_ecr_repository(registry) else {
            tracing::info!(registry, "not an ECR repository");
            return Ok(());
        };

        tracing::debug!(
            region = %repository.region,
            name = %repository.name,
            "creating ECR repository"
        );

        let output = run_tool(
            &self.binary()?,
            "aws",
            [
                "ecr",
                "create-repository",
                "--region",
                repository.region.as_str(),
                "--repository-name",
                repository.name.as_str(),
                "--image-tag-mutability",
                "MUTABLE",
                "--image-scanning-configuration",
                "scanOnPush=false",
            ],
        )
        .await?;

        if output.success {
            return Ok(());
        }

        if output.stderr.contains("RepositoryAlreadyExistsException") {
            tracing::debug!(name = %repository.name, "repository already exists");
            return Ok(());
        }

        Err(StevedoreError::ToolExecutionFailed {
            tool: "aws".to_string(),
            error: output.stderr.trim().to_string(),
            help: None,
        })
    }
}
