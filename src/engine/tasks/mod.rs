// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 stevedore contributors

//! Task handlers, one per task kind

mod build;
mod dockerfile;
mod publish;
mod tag;

use std::path::PathBuf;

use crate::backends::Backends;
use crate::engine::context::RunContext;
use crate::errors::{StevedoreError, StevedoreResult};
use crate::inventory::{Stage, Task};

/// Run the handler for `stage`'s task
///
/// A stage whose task did not decode fails here, once it has passed the tag
/// filter.
pub(crate) async fn dispatch(
    ctx: &mut RunContext,
    backends: &Backends,
    stage: &Stage,
) -> StevedoreResult<()> {
    let task = stage.task()?;
    tracing::debug!(stage = %stage.name, task = %task.kind(), "dispatching stage");

    match task {
        Task::DockerfileCreate(task) => dockerfile::create(ctx, stage, task).await,
        Task::DockerfileTemplate(task) => dockerfile::template(ctx, backends, stage, task).await,
        Task::DockerBuild(task) => build::docker_build(ctx, backends, stage, task).await,
        Task::TagImage(task) => tag::tag_image(ctx, backends, stage, task).await,
    }
}

/// Docker build context of a stage
///
/// Looked up in stage `vars.context`, then stage `dockercontext`, then image
/// `vars.context`.
pub fn find_docker_context(ctx: &RunContext, stage: &Stage) -> StevedoreResult<PathBuf> {
    let raw = stage
        .vars
        .get("context")
        .or(stage.dockercontext.as_ref())
        .or_else(|| ctx.image().vars.get("context"))
        .ok_or_else(|| StevedoreError::MissingDockerContext {
            stage: stage.name.clone(),
        })?;

    Ok(PathBuf::from(ctx.interpolate(raw, Some(stage))?))
}
