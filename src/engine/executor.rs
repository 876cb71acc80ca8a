// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 stevedore contributors

//! Image executor
//!
//! Walks an image's stages in document order, filters them by tag and hands
//! each remaining stage to its task handler. Stages never run concurrently.

use crate::backends::Backends;
use crate::engine::context::{RunContext, RunOptions, RunOutcome, RunState};
use crate::engine::tags::should_run;
use crate::engine::tasks;
use crate::errors::StevedoreResult;

/// Runs the stages of one image
pub struct ImageExecutor {
    backends: Backends,
}

impl ImageExecutor {
    /// Create an executor using the given backends
    pub fn new(backends: Backends) -> Self {
        Self { backends }
    }

    /// Run every stage of the context's image
    ///
    /// The first fatal error stops the run. Captured errors are handed to
    /// the error policy once all stages are done.
    pub async fn execute(&self, ctx: &mut RunContext) -> StevedoreResult<RunOutcome> {
        let image = ctx.image_handle();
        let total = image.stages.len();

        ctx.emit(None, "image-build-start", &image.name);

        for (index, stage) in image.stages.iter().enumerate() {
            ctx.set_state(RunState::Running { index });

            if !should_run(stage, ctx.skip_tags(), ctx.include_tags()) {
                ctx.emit(Some(stage), "skipping-stage", &stage.name);
                continue;
            }

            ctx.emit(
                Some(stage),
                "stage-started",
                &format!("{}/{}", index + 1, total),
            );

            if let Err(e) = tasks::dispatch(ctx, &self.backends, stage).await {
                ctx.emit(Some(stage), "stage-aborted", &e.to_string());
                ctx.set_state(RunState::Aborted);
                return Err(e);
            }
        }

        ctx.set_state(RunState::Completed);
        ctx.finish()
    }
}

/// Load the inventory, build a context and run the selected image
pub async fn process_image(
    options: &RunOptions,
    backends: Backends,
) -> StevedoreResult<RunOutcome> {
    let mut ctx = RunContext::load(options)?;
    ImageExecutor::new(backends).execute(&mut ctx).await
}
