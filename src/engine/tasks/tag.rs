// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 stevedore contributors

//! `tag_image` handler: republish an existing image under new names

use super::publish::publish_all;
use crate::backends::Backends;
use crate::engine::context::RunContext;
use crate::errors::{StevedoreError, StevedoreResult};
use crate::inventory::{Stage, TagImage};

const PULL_EVENT: &str = "docker-image-pull";

pub(super) async fn tag_image(
    ctx: &mut RunContext,
    backends: &Backends,
    stage: &Stage,
    task: &TagImage,
) -> StevedoreResult<()> {
    let registry = ctx.interpolate(&task.source.registry, Some(stage))?;
    let tag = ctx.interpolate(&task.source.tag, Some(stage))?;
    let source = format!("{}:{}", registry, tag);

    ctx.emit(Some(stage), PULL_EVENT, &source);

    let image = match backends.builder.pull(&registry, &tag).await {
        Ok(image) => image,
        Err(e) => {
            // Nothing to republish without the source image
            return ctx.capture(stage, PULL_EVENT, StevedoreError::publish("pull", &source, e));
        }
    };

    // Signing only happens for freshly built images
    publish_all(ctx, backends, stage, &image, &task.destination, false).await
}
