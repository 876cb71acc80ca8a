// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 stevedore contributors

//! Publishing an image to its output destinations
//!
//! Each destination is tagged, its repository provisioned, optionally
//! signed, and pushed. A failure anywhere in that sequence is a publish
//! error and goes through the error policy; the next destination is tried
//! when the policy captures it.

use std::path::Path;

use crate::backends::{Backends, ImageHandle};
use crate::engine::context::RunContext;
use crate::engine::signing::{SigningGuard, SigningRequest};
use crate::errors::{StevedoreError, StevedoreResult};
use crate::inventory::{Output, Stage};

pub(super) const PUSH_EVENT: &str = "docker-image-push";

/// Push `image` to every destination in order
pub(super) async fn publish_all(
    ctx: &mut RunContext,
    backends: &Backends,
    stage: &Stage,
    image: &ImageHandle,
    outputs: &[Output],
    allow_signing: bool,
) -> StevedoreResult<()> {
    for output in outputs {
        publish(ctx, backends, stage, image, output, allow_signing).await?;
    }
    Ok(())
}

async fn publish(
    ctx: &mut RunContext,
    backends: &Backends,
    stage: &Stage,
    image: &ImageHandle,
    output: &Output,
    allow_signing: bool,
) -> StevedoreResult<()> {
    let (Some(registry), Some(tag)) = (&output.registry, &output.tag) else {
        return Err(StevedoreError::invalid_stage(
            &stage.name,
            "every output destination needs a 'registry' and a 'tag'",
        ));
    };

    let registry = ctx.interpolate(registry, Some(stage))?;
    let tag = ctx.interpolate(tag, Some(stage))?;
    let target = format!("{}:{}", registry, tag);

    let signing = if allow_signing {
        SigningRequest::from_output(ctx, stage, output, &registry)?
    } else {
        None
    };

    ctx.emit(Some(stage), PUSH_EVENT, &target);

    let pushed = push_destination(
        backends,
        image,
        &registry,
        &tag,
        signing.as_ref(),
        ctx.trust_dir(),
    )
    .await;

    match pushed {
        Ok(()) => {
            tracing::debug!(registry = %registry, tag = %tag, "pushed");
            Ok(())
        }
        Err(e) => ctx.capture(stage, PUSH_EVENT, StevedoreError::publish("push", &target, e)),
    }
}

async fn push_destination(
    backends: &Backends,
    image: &ImageHandle,
    registry: &str,
    tag: &str,
    signing: Option<&SigningRequest>,
    trust_dir: &Path,
) -> StevedoreResult<()> {
    backends.builder.tag(image, registry, tag).await?;
    backends.repositories.ensure_repository(registry).await?;

    // Held until the push returns, whatever its outcome
    let _guard = match signing {
        Some(request) => Some(
            SigningGuard::arm(
                request,
                backends.secrets.as_ref(),
                backends.signers.as_ref(),
                trust_dir,
            )
            .await?,
        ),
        None => None,
    };

    backends.builder.push(registry, tag).await
}
