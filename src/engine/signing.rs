// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 stevedore contributors

//! Content trust signing around a push
//!
//! Docker signs on push when two environment variables are set and the
//! signer's private key sits in the trust directory. That state is
//! process-wide, so only one signing setup may be armed at a time. A
//! [`SigningGuard`] holds the lock and undoes everything when dropped.

use std::path::{Path, PathBuf};
use tokio::sync::{Mutex, MutexGuard};

use crate::backends::{SecretStore, SignerDirectory};
use crate::engine::context::RunContext;
use crate::errors::{StevedoreError, StevedoreResult};
use crate::inventory::{Output, Stage};

/// Turns docker content trust on
pub const CONTENT_TRUST: &str = "DOCKER_CONTENT_TRUST";
/// Passphrase of the repository key
pub const CONTENT_TRUST_PASSPHRASE: &str = "DOCKER_CONTENT_TRUST_REPOSITORY_PASSPHRASE";

static SIGNING_LOCK: Mutex<()> = Mutex::const_new(());

/// Signing is on when all four signing fields are set
pub fn is_signing_enabled(output: &Output) -> bool {
    output.signer_name.is_some()
        && output.key_secret_name.is_some()
        && output.passphrase_secret_name.is_some()
        && output.region.is_some()
}

/// Interpolated signing settings for one destination
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SigningRequest {
    pub registry: String,
    pub signer_name: String,
    pub key_secret_name: String,
    pub passphrase_secret_name: String,
    pub region: String,
}

impl SigningRequest {
    /// Build the request for `output`, or `None` when it isn't signed
    pub fn from_output(
        ctx: &RunContext,
        stage: &Stage,
        output: &Output,
        registry: &str,
    ) -> StevedoreResult<Option<Self>> {
        let (Some(signer), Some(key), Some(passphrase), Some(region)) = (
            &output.signer_name,
            &output.key_secret_name,
            &output.passphrase_secret_name,
            &output.region,
        ) else {
            return Ok(None);
        };

        Ok(Some(Self {
            registry: registry.to_string(),
            signer_name: ctx.interpolate(signer, Some(stage))?,
            key_secret_name: ctx.interpolate(key, Some(stage))?,
            passphrase_secret_name: ctx.interpolate(passphrase, Some(stage))?,
            region: ctx.interpolate(region, Some(stage))?,
        }))
    }
}

/// Armed signing state; dropping it tears everything down
#[derive(Debug)]
pub struct SigningGuard {
    _lock: MutexGuard<'static, ()>,
    key_path: Option<PathBuf>,
}

impl SigningGuard {
    /// Fetch the secrets, set the environment and write the private key
    ///
    /// On failure, whatever was already set up is undone before returning.
    pub async fn arm(
        request: &SigningRequest,
        secrets: &dyn SecretStore,
        signers: &dyn SignerDirectory,
        trust_dir: &Path,
    ) -> StevedoreResult<Self> {
        let lock = SIGNING_LOCK.lock().await;
        let mut guard = Self {
            _lock: lock,
            key_path: None,
        };

        let passphrase = secrets
            .get_secret(&request.passphrase_secret_name, &request.region)
            .await?;
        let private_key = secrets
            .get_secret(&request.key_secret_name, &request.region)
            .await?;

        std::env::set_var(CONTENT_TRUST, "1");
        std::env::set_var(CONTENT_TRUST_PASSPHRASE, passphrase);

        let key_name = signers
            .private_key_name(&request.registry, &request.signer_name)
            .await?;

        std::fs::create_dir_all(trust_dir).map_err(|e| StevedoreError::FileWriteError {
            path: trust_dir.to_path_buf(),
            error: e.to_string(),
        })?;

        let key_path = trust_dir.join(key_name);
        guard.key_path = Some(key_path.clone());
        write_private_key(&key_path, &private_key)?;

        tracing::debug!(
            registry = %request.registry,
            signer = %request.signer_name,
            key = %key_path.display(),
            "signing armed"
        );

        Ok(guard)
    }
}

impl Drop for SigningGuard {
    fn drop(&mut self) {
        std::env::remove_var(CONTENT_TRUST);
        std::env::remove_var(CONTENT_TRUST_PASSPHRASE);

        if let Some(path) = self.key_path.take() {
            match std::fs::remove_file(&path) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => tracing::warn!(
                    key = %path.display(),
                    error = %e,
                    "could not remove signing key"
                ),
            }
        }
    }
}

fn write_private_key(path: &Path, key: &str) -> StevedoreResult<()> {
    std::fs::write(path, key).map_err(|e| StevedoreError::FileWriteError {
        path: path.to_path_buf(),
        error: e.to_string(),
    })?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
    }

    Ok(())
}
