// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 stevedore contributors

//! Run context
//!
//! The state owned by one run: the inventory, the selected image, the run
//! parameters and tag filters, the run identifier, captured errors and the
//! pipeline-mode report. The stage being executed is never stored here; it
//! is handed to every call that needs it.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::engine::policy::{CapturedError, Disposition, ErrorPolicy};
use crate::engine::report::Report;
use crate::engine::resolver::{Scopes, VERSION_ID};
use crate::engine::tags::TagSet;
use crate::errors::{StevedoreError, StevedoreResult};
use crate::inventory::{Image, Inventory, Stage, Vars};
use crate::utils;

/// Options for a single run
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Name of the image to build
    pub image: String,
    /// Variable overrides and image inputs
    pub parameters: Vars,
    pub skip_tags: Vec<String>,
    pub include_tags: Vec<String>,
    /// Inventory file location
    pub inventory: PathBuf,
    pub continue_on_errors: bool,
    pub fail_on_errors: bool,
    /// Accumulate a report for the caller
    pub pipeline: bool,
    /// Don't print events to the terminal
    pub quiet: bool,
    /// Where signing keys are written while an image is pushed
    pub trust_dir: PathBuf,
}

impl RunOptions {
    /// Options with defaults for everything but the image name
    pub fn new(image: impl Into<String>) -> Self {
        Self {
            image: image.into(),
            parameters: Vars::new(),
            skip_tags: Vec::new(),
            include_tags: Vec::new(),
            inventory: PathBuf::from("inventory.yaml"),
            continue_on_errors: true,
            fail_on_errors: false,
            pipeline: false,
            quiet: false,
            trust_dir: default_trust_dir(),
        }
    }
}

/// Docker's per-user directory for content trust private keys
pub fn default_trust_dir() -> PathBuf {
    let home = directories::BaseDirs::new()
        .map(|dirs| dirs.home_dir().to_path_buf())
        .unwrap_or_default();
    home.join(".docker").join("trust").join("private")
}

/// Lifecycle of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    NotStarted,
    /// Executing (or skipping) the stage at this index
    Running { index: usize },
    Completed,
    Aborted,
}

/// What a finished run hands back
#[derive(Debug)]
pub struct RunOutcome {
    pub run_id: String,
    /// Present in pipeline mode
    pub report: Option<Report>,
    /// Publish errors tolerated during the run
    pub captured: Vec<CapturedError>,
}

/// Mutable state of one run
#[derive(Debug)]
pub struct RunContext {
    inventory: Inventory,
    image: Arc<Image>,
    parameters: Vars,
    skip_tags: TagSet,
    include_tags: TagSet,
    run_id: String,
    policy: ErrorPolicy,
    pipeline: bool,
    quiet: bool,
    trust_dir: PathBuf,
    captured: Vec<CapturedError>,
    report: Report,
    state: RunState,
}

impl RunContext {
    /// Read the inventory named in `options` and build a context
    pub fn load(options: &RunOptions) -> StevedoreResult<Self> {
        let inventory = Inventory::from_file(&options.inventory)?;
        Self::new(inventory, options)
    }

    /// Build a context around an already loaded inventory
    pub fn new(inventory: Inventory, options: &RunOptions) -> StevedoreResult<Self> {
        let image = inventory.find_image(&options.image)?;

        tracing::debug!(
            image = %image.name,
            skip_tags = ?options.skip_tags,
            include_tags = ?options.include_tags,
            "building run context"
        );

        Ok(Self {
            inventory,
            image: Arc::new(image),
            parameters: options.parameters.clone(),
            skip_tags: options.skip_tags.iter().cloned().collect(),
            include_tags: options.include_tags.iter().cloned().collect(),
            run_id: run_id_from_env(),
            policy: ErrorPolicy {
                continue_on_errors: options.continue_on_errors,
                fail_on_errors: options.fail_on_errors,
            },
            pipeline: options.pipeline,
            quiet: options.quiet,
            trust_dir: options.trust_dir.clone(),
            captured: Vec::new(),
            report: Report::new(),
            state: RunState::NotStarted,
        })
    }

    pub fn inventory(&self) -> &Inventory {
        &self.inventory
    }

    pub fn image(&self) -> &Image {
        &self.image
    }

    /// Shared handle to the image, so stages can be walked while the
    /// context is mutated
    pub fn image_handle(&self) -> Arc<Image> {
        Arc::clone(&self.image)
    }

    pub fn image_name(&self) -> &str {
        &self.image.name
    }

    pub fn parameters(&self) -> &Vars {
        &self.parameters
    }

    pub fn skip_tags(&self) -> &TagSet {
        &self.skip_tags
    }

    pub fn include_tags(&self) -> &TagSet {
        &self.include_tags
    }

    /// Identifier of this run, stable for the context's lifetime
    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn policy(&self) -> ErrorPolicy {
        self.policy
    }

    pub fn is_pipeline(&self) -> bool {
        self.pipeline
    }

    pub fn trust_dir(&self) -> &Path {
        &self.trust_dir
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub(crate) fn set_state(&mut self, state: RunState) {
        tracing::debug!(image = %self.image.name, ?state, "run state changed");
        self.state = state;
    }

    pub fn report(&self) -> &Report {
        &self.report
    }

    pub fn captured_errors(&self) -> &[CapturedError] {
        &self.captured
    }

    /// Variable scopes for an optional stage
    pub fn scopes<'a>(&'a self, stage: Option<&'a Stage>) -> Scopes<'a> {
        Scopes {
            run_id: &self.run_id,
            inventory: &self.inventory.vars,
            parameters: &self.parameters,
            image: &self.image.vars,
            stage: stage.map(|s| &s.vars),
            inputs: &self.image.inputs,
        }
    }

    /// Resolve one variable
    pub fn resolve(&self, name: &str, stage: Option<&Stage>) -> StevedoreResult<String> {
        self.scopes(stage).resolve(name)
    }

    /// Interpolate variable references in `template`
    pub fn interpolate(&self, template: &str, stage: Option<&Stage>) -> StevedoreResult<String> {
        self.scopes(stage).interpolate(template)
    }

    /// Interpolate every value of a mapping
    pub fn interpolate_map(
        &self,
        values: &Vars,
        stage: Option<&Stage>,
    ) -> StevedoreResult<Vars> {
        let scopes = self.scopes(stage);
        values
            .iter()
            .map(|(k, v)| Ok((k.clone(), scopes.interpolate(v)?)))
            .collect()
    }

    /// Emit an event: recorded in pipeline mode, always logged and printed
    pub fn emit(&mut self, stage: Option<&Stage>, event: &str, message: &str) {
        let stage_name = stage.map(|s| s.name.as_str());

        tracing::info!(
            image = %self.image.name,
            stage = stage_name.unwrap_or(""),
            event,
            "{}",
            message
        );

        if self.pipeline {
            self.report.record(&self.image.name, stage_name, event, message);
        }

        if !self.quiet {
            let title = stage
                .map(|s| format!("[{}/{}] ", s.name, s.task_type))
                .unwrap_or_default();
            // Pipeline output owns stdout
            utils::print_event(&title, event, message, self.pipeline);
        }
    }

    /// Route an error raised during `operation` through the error policy
    ///
    /// Returns `Ok(())` when the error was captured and the run goes on.
    pub fn capture(
        &mut self,
        stage: &Stage,
        operation: &str,
        error: StevedoreError,
    ) -> StevedoreResult<()> {
        if !error.is_capturable() {
            return Err(error);
        }

        self.emit(Some(stage), &format!("{}/error", operation), &error.to_string());

        match self.policy.disposition(&error) {
            Disposition::Capture => {
                self.captured.push(CapturedError {
                    stage: stage.name.clone(),
                    operation: operation.to_string(),
                    error,
                });
                Ok(())
            }
            Disposition::Abort => Err(error),
        }
    }

    /// Apply the end-of-run policy and hand back the outcome
    pub fn finish(&mut self) -> StevedoreResult<RunOutcome> {
        if self.policy.fails_run(&self.captured) {
            let summary = self
                .captured
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("; ");
            self.emit(None, "docker-image-push/captured-errors", &summary);

            let first = self.captured.remove(0);
            return Err(first.error);
        }

        Ok(RunOutcome {
            run_id: self.run_id.clone(),
            report: self.pipeline.then(|| self.report.clone()),
            captured: std::mem::take(&mut self.captured),
        })
    }
}

/// Run identifier: the `version_id` environment variable when set
fn run_id_from_env() -> String {
    run_id_or_new(std::env::var(VERSION_ID).ok())
}

/// A supplied id is used as given, even when empty
fn run_id_or_new(version_id: Option<String>) -> String {
    version_id.unwrap_or_else(|| uuid::Uuid::new_v4().to_string())
}
