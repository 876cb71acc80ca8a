// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 stevedore contributors

//! External collaborators
//!
//! The engine never talks to docker, AWS or the network directly. Every
//! operation it needs goes through one of the traits below; the default
//! implementations shell out to the `docker` and `aws` command line tools.

mod artifacts;
mod aws;
mod docker;
mod template;

pub use artifacts::DefaultArtifactStore;
pub use aws::{parse_ecr_repository, split_s3_location, AwsCli, EcrRepository};
pub use docker::{parse_private_key_name, DockerCli};
pub use template::{template_name, TeraRenderer};

use async_trait::async_trait;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::NamedTempFile;
use tokio::process::Command;

use crate::errors::{StevedoreError, StevedoreResult};
use crate::inventory::Vars;

/// A built or pulled image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageHandle {
    /// Image ID or reference understood by the build backend
    pub id: String,
}

/// Everything needed to build one image
#[derive(Debug, Clone)]
pub struct BuildRequest {
    pub context: PathBuf,
    pub dockerfile: PathBuf,
    pub build_args: Vars,
    pub labels: Vars,
    pub platform: Option<String>,
}

/// Builds, pulls, tags and pushes images
#[async_trait]
pub trait BuildBackend: Send + Sync {
    /// Build an image; failures are [`StevedoreError::BuildFailed`]
    async fn build(&self, request: &BuildRequest) -> StevedoreResult<ImageHandle>;

    async fn pull(&self, registry: &str, tag: &str) -> StevedoreResult<ImageHandle>;

    async fn tag(&self, image: &ImageHandle, registry: &str, tag: &str) -> StevedoreResult<()>;

    /// Push `registry:tag`, retrying before giving up
    async fn push(&self, registry: &str, tag: &str) -> StevedoreResult<()>;
}

/// Renders Dockerfile templates
pub trait TemplateRenderer: Send + Sync {
    /// Render `Dockerfile.<variant>` (or `Dockerfile`) found in `context_dir`
    fn render(
        &self,
        context_dir: &Path,
        variant: Option<&str>,
        params: &Vars,
    ) -> StevedoreResult<String>;
}

/// Fetches secrets by name and region
#[async_trait]
pub trait SecretStore: Send + Sync {
    async fn get_secret(&self, name: &str, region: &str) -> StevedoreResult<String>;
}

/// Makes sure a registry repository exists before pushing to it
#[async_trait]
pub trait RepositoryProvisioner: Send + Sync {
    /// Idempotent; a no-op for registries it does not manage
    async fn ensure_repository(&self, registry: &str) -> StevedoreResult<()>;
}

/// Looks up signer identities for content trust
#[async_trait]
pub trait SignerDirectory: Send + Sync {
    /// File name the signer's private key must be stored under
    async fn private_key_name(&self, registry: &str, signer: &str) -> StevedoreResult<String>;
}

/// Moves Dockerfiles in and out of the run
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Download a remote file; it lives as long as the returned handle
    async fn fetch(&self, url: &str) -> StevedoreResult<NamedTempFile>;

    /// Save a local file to a local path or an object-store location
    async fn save(&self, local: &Path, destination: &str) -> StevedoreResult<()>;
}

/// The full set of backends a run uses
#[derive(Clone)]
pub struct Backends {
    pub builder: Arc<dyn BuildBackend>,
    pub templates: Arc<dyn TemplateRenderer>,
    pub secrets: Arc<dyn SecretStore>,
    pub repositories: Arc<dyn RepositoryProvisioner>,
    pub signers: Arc<dyn SignerDirectory>,
    pub artifacts: Arc<dyn ArtifactStore>,
}

impl Backends {
    /// Backends driving the local `docker` and `aws` tools
    pub fn from_environment() -> Self {
        let docker = Arc::new(DockerCli::new());
        let aws = Arc::new(AwsCli::new());

        Self {
            builder: docker.clone(),
            templates: Arc::new(TeraRenderer::new()),
            secrets: aws.clone(),
            repositories: aws.clone(),
            signers: docker,
            artifacts: Arc::new(DefaultArtifactStore::new(aws)),
        }
    }
}

impl std::fmt::Debug for Backends {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Backends").finish_non_exhaustive()
    }
}

/// Locate a tool on the PATH once, on first use
fn locate(cell: &once_cell::sync::OnceCell<PathBuf>, tool: &str) -> StevedoreResult<PathBuf> {
    cell.get_or_try_init(|| which::which(tool).map_err(|_| StevedoreError::tool_not_found(tool)))
        .cloned()
}

/// Output of a finished tool invocation
#[derive(Debug)]
struct ToolOutput {
    success: bool,
    stdout: String,
    stderr: String,
}

/// Run a tool to completion, capturing its output
async fn run_tool<I, S>(program: &Path, tool: &str, args: I) -> StevedoreResult<ToolOutput>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let mut cmd = Command::new(program);
    cmd.args(args);
    tracing::debug!(tool, command = ?cmd.as_std(), "running tool");

    let output = cmd
        .output()
        .await
        .map_err(|e| StevedoreError::ToolExecutionFailed {
            tool: tool.to_string(),
            error: e.to_string(),
            help: None,
        })?;

    Ok(ToolOutput {
        success: output.status.success(),
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
    })
}
