// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 stevedore contributors

//! `dockerfile_create` and `dockerfile_template` handlers

use std::io::Write;
use std::path::PathBuf;
use tempfile::NamedTempFile;

use super::find_docker_context;
use crate::backends::Backends;
use crate::engine::context::RunContext;
use crate::errors::{StevedoreError, StevedoreResult};
use crate::inventory::{DockerfileCreate, DockerfileTemplate, Stage, Vars};

/// Write a data-only Dockerfile: a FROM line and one ADD per static file
pub(super) async fn create(
    ctx: &mut RunContext,
    stage: &Stage,
    task: &DockerfileCreate,
) -> StevedoreResult<()> {
    let destination = task
        .output
        .first()
        .and_then(|output| output.dockerfile.as_ref())
        .ok_or_else(|| {
            StevedoreError::invalid_stage(&stage.name, "the first output needs a 'dockerfile'")
        })?;

    let path = ctx.interpolate(destination, Some(stage))?;
    let content = data_dockerfile(ctx, stage, task)?;

    tokio::fs::write(&path, content)
        .await
        .map_err(|e| StevedoreError::FileWriteError {
            path: PathBuf::from(&path),
            error: e.to_string(),
        })?;

    ctx.emit(Some(stage), "dockerfile-save-location", &path);
    Ok(())
}

fn data_dockerfile(
    ctx: &RunContext,
    stage: &Stage,
    task: &DockerfileCreate,
) -> StevedoreResult<String> {
    let base = match &task.from {
        Some(from) => ctx.interpolate(from, Some(stage))?,
        None => "scratch".to_string(),
    };

    let mut content = format!("FROM {}\n", base);
    for file in &task.static_files {
        content.push_str("ADD ");
        if let Some(from) = &file.from {
            content.push_str(&format!("--from={} ", from));
        }
        content.push_str(&format!(
            "{} {}\n",
            ctx.interpolate(&file.src, Some(stage))?,
            ctx.interpolate(&file.dst, Some(stage))?
        ));
    }

    Ok(content)
}

/// Render a Dockerfile template and save it to every `dockerfile` output
pub(super) async fn template(
    ctx: &mut RunContext,
    backends: &Backends,
    stage: &Stage,
    task: &DockerfileTemplate,
) -> StevedoreResult<()> {
    let template_context = match ctx.image().vars.get("template_context") {
        Some(dir) => PathBuf::from(ctx.interpolate(dir, Some(stage))?),
        None => find_docker_context(ctx, stage)?,
    };

    let params = task
        .inputs
        .iter()
        .map(|name| Ok((name.clone(), ctx.resolve(name, Some(stage))?)))
        .collect::<StevedoreResult<Vars>>()?;

    let distro = task
        .distro
        .as_ref()
        .map(|distro| ctx.interpolate(distro, Some(stage)))
        .transpose()?;

    tracing::debug!(
        stage = %stage.name,
        context = %template_context.display(),
        params = ?params.keys().collect::<Vec<_>>(),
        "rendering template"
    );

    let rendered = backends
        .templates
        .render(&template_context, distro.as_deref(), &params)?;

    let mut file = NamedTempFile::new()?;
    file.write_all(rendered.as_bytes())?;
    file.flush()?;

    for output in &task.output {
        let Some(destination) = &output.dockerfile else {
            continue;
        };

        let destination = ctx.interpolate(destination, Some(stage))?;
        backends.artifacts.save(file.path(), &destination).await?;
        ctx.emit(Some(stage), "dockerfile-save-location", &destination);
    }

    Ok(())
}
