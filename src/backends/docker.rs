// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 stevedore contributors

//! Docker CLI backend
//!
//! Builds, pulls, tags and pushes through the `docker` binary, and reads
//! signer identities from `docker trust inspect`.

use async_trait::async_trait;
use once_cell::sync::OnceCell;
use serde::Deserialize;
use std::ffi::OsString;
use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;

use super::{
    locate, run_tool, BuildBackend, BuildRequest, ImageHandle, SignerDirectory, ToolOutput,
};
use crate::errors::{StevedoreError, StevedoreResult};

const DEFAULT_PUSH_RETRIES: u32 = 3;
const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(5);

/// Docker CLI backend
#[derive(Debug)]
pub struct DockerCli {
    /// Path to docker binary, found on first use
    binary: OnceCell<PathBuf>,
    push_retries: u32,
    retry_delay: Duration,
}

impl Default for DockerCli {
    fn default() -> Self {
        Self::new()
    }
}

impl DockerCli {
    /// Create a docker backend with the default push retry policy
    pub fn new() -> Self {
        Self {
            binary: OnceCell::new(),
            push_retries: DEFAULT_PUSH_RETRIES,
            retry_delay: DEFAULT_RETRY_DELAY,
        }
    }

    /// Override the push retry policy; the delay grows linearly per attempt
    pub fn with_retry(mut self, retries: u32, delay: Duration) -> Self {
        self.push_retries = retries;
        self.retry_delay = delay;
        self
    }

    fn binary(&self) -> StevedoreResult<PathBuf> {
        locate(&self.binary, "docker")
    }

    /// Run `attempt_push` until it succeeds or the retries are used up
    ///
    /// Exhausted retries surface as one `PublishFailed` carrying the last
    /// error. Errors running the tool itself are not retried.
    async fn push_with_retry<F, Fut>(
        &self,
        reference: &str,
        mut attempt_push: F,
    ) -> StevedoreResult<()>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = StevedoreResult<ToolOutput>>,
    {
        let attempts = self.push_retries + 1;
        let mut last_error = String::new();

        for attempt in 1..=attempts {
            let output = attempt_push().await?;
            if output.success {
                return Ok(());
            }

            last_error = output.stderr.trim().to_string();
            tracing::warn!(
                reference,
                attempt,
                attempts,
                error = %last_error,
                "push failed"
            );

            if attempt < attempts {
                tokio::time::sleep(self.retry_delay * attempt).await;
            }
        }

        Err(StevedoreError::PublishFailed {
            operation: "push".to_string(),
            target: reference.to_string(),
            message: format!("{} (after {} attempts)", last_error, attempts),
        })
    }
}

/// Arguments for `docker build`
pub(crate) fn build_args(request: &BuildRequest) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec!["build".into(), "--quiet".into()];

    args.push("--file".into());
    args.push(request.dockerfile.clone().into_os_string());

    for (key, value) in &request.build_args {
        args.push("--build-arg".into());
        args.push(format!("{}={}", key, value).into());
    }

    for (key, value) in &request.labels {
        args.push("--label".into());
        args.push(format!("{}={}", key, value).into());
    }

    if let Some(platform) = &request.platform {
        args.push("--platform".into());
        args.push(platform.into());
    }

    args.push(request.context.clone().into_os_string());
    args
}

#[async_trait]
impl BuildBackend for DockerCli {
    async fn build(&self, request: &BuildRequest) -> StevedoreResult<ImageHandle> {
        let context = request.context.display().to_string();
        let output = run_tool(&self.binary()?, "docker", build_args(request)).await?;

        if !output.success {
            return Err(StevedoreError::BuildFailed {
                context,
                message: output.stderr.trim().to_string(),
            });
        }

        // --quiet prints only the image ID
        let id = output
            .stdout
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .last()
            .ok_or_else(|| StevedoreError::BuildFailed {
                context,
                message: "docker build did not report an image ID".to_string(),
            })?;

        tracing::debug!(image = id, "image built");
        Ok(ImageHandle { id: id.to_string() })
    }

    async fn pull(&self, registry: &str, tag: &str) -> StevedoreResult<ImageHandle> {
        let reference = format!("{}:{}", registry, tag);
        let output = run_tool(&self.binary()?, "docker", ["pull", reference.as_str()]).await?;

        if !output.success {
            return Err(StevedoreError::PublishFailed {
                operation: "pull".to_string(),
                target: reference,
                message: output.stderr.trim().to_string(),
            });
        }

        Ok(ImageHandle { id: reference })
    }

    async fn tag(&self, image: &ImageHandle, registry: &str, tag: &str) -> StevedoreResult<()> {
        let reference = format!("{}:{}", registry, tag);
        let output = run_tool(
            &self.binary()?,
            "docker",
            ["tag", image.id.as_str(), reference.as_str()],
        )
        .await?;

        if !output.success {
            return Err(StevedoreError::PublishFailed {
                operation: "tag".to_string(),
                target: reference,
                message: output.stderr.trim().to_string(),
            });
        }

        Ok(())
    }

    async fn push(&self, registry: &str, tag: &str) -> StevedoreResult<()> {
        let binary = self.binary()?;
        let reference = format!("{}:{}", registry, tag);

        let args = ["push", reference.as_str()];

        self.push_with_retry(&reference, || run_tool(&binary, "docker", args))
            .await
    }
}

#[async_trait]
impl SignerDirectory for DockerCli {
    async fn private_key_name(&self, registry: &str, signer: &str) -> StevedoreResult<String> {
        let output = run_tool(&self.binary()?, "docker", ["trust", "inspect", registry]).await?;

        if !output.success {
            return Err(StevedoreError::ToolExecutionFailed {
                tool: "docker".to_string(),
                error: output.stderr.trim().to_string(),
                help: Some(format!("Check that '{}' has signers configured", registry)),
            });
        }

        parse_private_key_name(&output.stdout, signer)
    }
}

#[derive(Debug, Deserialize)]
struct TrustInfo {
    #[serde(rename = "Signers", default)]
    signers: Vec<Signer>,
}

#[derive(Debug, Deserialize)]
struct Signer {
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "Keys", default)]
    keys: Vec<SignerKey>,
}

#[derive(Debug, Deserialize)]
struct SignerKey {
    #[serde(rename = "ID")]
    id: String,
}

/// Key file name for `signer` in `docker trust inspect` JSON output
pub fn parse_private_key_name(json: &str, signer: &str) -> StevedoreResult<String> {
    let info: Vec<TrustInfo> = serde_json::from_str(json)?;

    let not_found = |reason: String| StevedoreError::ToolExecutionFailed {
        tool: "docker".to_string(),
        error: reason,
        help: Some("Add the signer with 'docker trust signer add'".to_string()),
    };

    let first = info
        .first()
        .ok_or_else(|| not_found("docker trust inspect returned no repositories".to_string()))?;

    let entry = first
        .signers
        .iter()
        .find(|s| s.name == signer)
        .ok_or_else(|| not_found(format!("no signer named '{}'", signer)))?;

    let key = entry
        .keys
        .first()
        .ok_or_else(|| not_found(format!("signer '{}' has no keys", signer)))?;

    Ok(format!("{}.key", key.id))
}
