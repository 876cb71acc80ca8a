// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 stevedore contributors

//! `docker_build` handler

use std::path::PathBuf;

use super::find_docker_context;
use super::publish::publish_all;
use crate::backends::{Backends, BuildRequest};
use crate::engine::context::RunContext;
use crate::errors::StevedoreResult;
use crate::inventory::{DockerBuild, Stage};

/// Build once, then publish to every output destination
pub(super) async fn docker_build(
    ctx: &mut RunContext,
    backends: &Backends,
    stage: &Stage,
    task: &DockerBuild,
) -> StevedoreResult<()> {
    let context = find_docker_context(ctx, stage)?;
    let dockerfile = ctx.interpolate(&task.dockerfile, Some(stage))?;

    // A downloaded Dockerfile is deleted when `_download` goes out of scope
    let (dockerfile, _download) = if dockerfile.starts_with("https://") {
        let file = backends.artifacts.fetch(&dockerfile).await?;
        (file.path().to_path_buf(), Some(file))
    } else {
        (PathBuf::from(dockerfile), None)
    };

    let request = BuildRequest {
        context,
        dockerfile,
        build_args: ctx.interpolate_map(&task.buildargs, Some(stage))?,
        labels: ctx.interpolate_map(&task.labels, Some(stage))?,
        platform: task
            .platform
            .as_ref()
            .map(|platform| ctx.interpolate(platform, Some(stage)))
            .transpose()?,
    };

    tracing::debug!(
        stage = %stage.name,
        context = %request.context.display(),
        dockerfile = %request.dockerfile.display(),
        "building image"
    );

    let image = backends.builder.build(&request).await?;

    publish_all(ctx, backends, stage, &image, &task.output, true).await
}
