// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 stevedore contributors

//! Recording fake backends shared by the integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::NamedTempFile;

use stevedore::backends::{
    template_name, ArtifactStore, Backends, BuildBackend, BuildRequest, ImageHandle,
    RepositoryProvisioner, SecretStore, SignerDirectory, TemplateRenderer,
};
use stevedore::engine::{CONTENT_TRUST, CONTENT_TRUST_PASSPHRASE};
use stevedore::inventory::{Inventory, Vars};
use stevedore::{RunContext, RunOptions, StevedoreError, StevedoreResult};

/// Name the fake signer directory hands out for every signer
pub const KEY_NAME: &str = "abcd1234.key";

/// One call into a backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Build {
        context: PathBuf,
        dockerfile: PathBuf,
        dockerfile_content: Option<String>,
        build_args: Vars,
        labels: Vars,
        platform: Option<String>,
    },
    Pull {
        registry: String,
        tag: String,
    },
    Tag {
        image: String,
        registry: String,
        tag: String,
    },
    Push {
        registry: String,
        tag: String,
        signing: Option<SigningState>,
    },
    EnsureRepository {
        registry: String,
    },
    GetSecret {
        name: String,
        region: String,
    },
    Render {
        context: PathBuf,
        variant: Option<String>,
        params: Vars,
    },
    Fetch {
        url: String,
        path: PathBuf,
    },
    Save {
        destination: String,
        content: String,
    },
}

/// Signing environment observed while pushing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SigningState {
    pub passphrase: Option<String>,
    pub key: Option<String>,
}

/// Every backend in one recording fake
#[derive(Debug, Default)]
pub struct Fakes {
    calls: Mutex<Vec<Call>>,
    /// 1-based push attempts that fail
    failing_pushes: Vec<usize>,
    fail_pull: bool,
    fail_build: bool,
    secrets: BTreeMap<String, String>,
    remote_dockerfile: String,
    /// Where signing keys are expected, to observe them at push time
    trust_dir: Option<PathBuf>,
}

impl Fakes {
    pub fn new() -> Self {
        Self {
            remote_dockerfile: "FROM remote\n".to_string(),
            ..Default::default()
        }
    }

    pub fn failing_pushes(mut self, pushes: &[usize]) -> Self {
        self.failing_pushes = pushes.to_vec();
        self
    }

    pub fn failing_pull(mut self) -> Self {
        self.fail_pull = true;
        self
    }

    pub fn failing_build(mut self) -> Self {
        self.fail_build = true;
        self
    }

    pub fn with_secret(mut self, name: &str, value: &str) -> Self {
        self.secrets.insert(name.to_string(), value.to_string());
        self
    }

    pub fn watching_trust_dir(mut self, dir: &Path) -> Self {
        self.trust_dir = Some(dir.to_path_buf());
        self
    }

    pub fn into_backends(self) -> (Arc<Self>, Backends) {
        let fakes = Arc::new(self);
        let backends = Backends {
            builder: fakes.clone(),
            templates: fakes.clone(),
            secrets: fakes.clone(),
            repositories: fakes.clone(),
            signers: fakes.clone(),
            artifacts: fakes.clone(),
        };
        (fakes, backends)
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn builds(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| matches!(c, Call::Build { .. }))
            .collect()
    }

    /// (registry, tag) of every tag call
    pub fn tags(&self) -> Vec<(String, String)> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Tag { registry, tag, .. } => Some((registry, tag)),
                _ => None,
            })
            .collect()
    }

    /// (registry, tag) of every push attempt
    pub fn pushes(&self) -> Vec<(String, String)> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Push { registry, tag, .. } => Some((registry, tag)),
                _ => None,
            })
            .collect()
    }

    pub fn push_signing_states(&self) -> Vec<Option<SigningState>> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Push { signing, .. } => Some(signing),
                _ => None,
            })
            .collect()
    }

    fn push_count(&self) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| matches!(c, Call::Push { .. }))
            .count()
    }

    fn observe_signing(&self) -> Option<SigningState> {
        if std::env::var(CONTENT_TRUST).ok().as_deref() != Some("1") {
            return None;
        }

        Some(SigningState {
            passphrase: std::env::var(CONTENT_TRUST_PASSPHRASE).ok(),
            key: self
                .trust_dir
                .as_ref()
                .and_then(|dir| std::fs::read_to_string(dir.join(KEY_NAME)).ok()),
        })
    }
}

#[async_trait]
impl BuildBackend for Fakes {
    async fn build(&self, request: &BuildRequest) -> StevedoreResult<ImageHandle> {
        self.record(Call::Build {
            context: request.context.clone(),
            dockerfile: request.dockerfile.clone(),
            dockerfile_content: std::fs::read_to_string(&request.dockerfile).ok(),
            build_args: request.build_args.clone(),
            labels: request.labels.clone(),
            platform: request.platform.clone(),
        });

        if self.fail_build {
            return Err(StevedoreError::BuildFailed {
                context: request.context.display().to_string(),
                message: "step 3/7 failed".to_string(),
            });
        }

        Ok(ImageHandle {
            id: "sha256:built".to_string(),
        })
    }

    async fn pull(&self, registry: &str, tag: &str) -> StevedoreResult<ImageHandle> {
        self.record(Call::Pull {
            registry: registry.to_string(),
            tag: tag.to_string(),
        });

        if self.fail_pull {
            return Err(StevedoreError::PublishFailed {
                operation: "pull".to_string(),
                target: format!("{}:{}", registry, tag),
                message: "manifest unknown".to_string(),
            });
        }

        Ok(ImageHandle {
            id: format!("{}:{}", registry, tag),
        })
    }

    async fn tag(&self, image: &ImageHandle, registry: &str, tag: &str) -> StevedoreResult<()> {
        self.record(Call::Tag {
            image: image.id.clone(),
            registry: registry.to_string(),
            tag: tag.to_string(),
        });
        Ok(())
    }

    async fn push(&self, registry: &str, tag: &str) -> StevedoreResult<()> {
        let attempt = self.push_count() + 1;
        self.record(Call::Push {
            registry: registry.to_string(),
            tag: tag.to_string(),
            signing: self.observe_signing(),
        });

        if self.failing_pushes.contains(&attempt) {
            return Err(StevedoreError::PublishFailed {
                operation: "push".to_string(),
                target: format!("{}:{}", registry, tag),
                message: "denied: requested access to the resource is denied".to_string(),
            });
        }

        Ok(())
    }
}

impl TemplateRenderer for Fakes {
    fn render(
        &self,
        context_dir: &Path,
        variant: Option<&str>,
        params: &Vars,
    ) -> StevedoreResult<String> {
        self.record(Call::Render {
            context: context_dir.to_path_buf(),
            variant: variant.map(String::from),
            params: params.clone(),
        });

        let mut rendered = format!("# {}\n", template_name(variant));
        for (key, value) in params {
            rendered.push_str(&format!("ARG {}={}\n", key, value));
        }
        Ok(rendered)
    }
}

#[async_trait]
impl SecretStore for Fakes {
    async fn get_secret(&self, name: &str, region: &str) -> StevedoreResult<String> {
        self.record(Call::GetSecret {
            name: name.to_string(),
            region: region.to_string(),
        });

        self.secrets
            .get(name)
            .cloned()
            .ok_or_else(|| StevedoreError::ToolExecutionFailed {
                tool: "aws".to_string(),
                error: format!("ResourceNotFoundException: {}", name),
                help: None,
            })
    }
}

#[async_trait]
impl RepositoryProvisioner for Fakes {
    async fn ensure_repository(&self, registry: &str) -> StevedoreResult<()> {
        self.record(Call::EnsureRepository {
            registry: registry.to_string(),
        });
        Ok(())
    }
}

#[async_trait]
impl SignerDirectory for Fakes {
    async fn private_key_name(&self, _registry: &str, _signer: &str) -> StevedoreResult<String> {
        Ok(KEY_NAME.to_string())
    }
}

#[async_trait]
impl ArtifactStore for Fakes {
    async fn fetch(&self, url: &str) -> StevedoreResult<NamedTempFile> {
        let mut file = NamedTempFile::new()?;
        file.write_all(self.remote_dockerfile.as_bytes())?;
        file.flush()?;

        self.record(Call::Fetch {
            url: url.to_string(),
            path: file.path().to_path_buf(),
        });
        Ok(file)
    }

    async fn save(&self, local: &Path, destination: &str) -> StevedoreResult<()> {
        let content = std::fs::read_to_string(local)?;
        self.record(Call::Save {
            destination: destination.to_string(),
            content,
        });
        Ok(())
    }
}

/// Quiet run options for `image`
pub fn options(image: &str) -> RunOptions {
    let mut options = RunOptions::new(image);
    options.quiet = true;
    options
}

/// Build a context from inline YAML
pub fn context(yaml: &str, options: &RunOptions) -> RunContext {
    let inventory = Inventory::from_yaml(yaml).expect("test inventory parses");
    RunContext::new(inventory, options).expect("test context builds")
}

pub fn params(pairs: &[(&str, &str)]) -> Vars {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}
