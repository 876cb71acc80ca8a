// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 stevedore contributors

//! Error types
//!
//! Every failure a run can produce is a [`StevedoreError`]. Errors are grouped
//! into kinds; the kind decides whether the error policy may capture an error
//! and keep going, or whether the run has to stop.

use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for stevedore operations
pub type StevedoreResult<T> = Result<T, StevedoreError>;

/// Broad classification of errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A variable or image could not be resolved
    Resolution,
    /// A stage declares a task type that does not exist
    Dispatch,
    /// The build backend failed to produce an image
    Build,
    /// Pulling, tagging, pushing or signing an image failed
    Publish,
    /// A stage or output is missing required fields
    Configuration,
    /// Files, processes, parsing and other plumbing
    System,
}

/// Main error type for stevedore
#[derive(Error, Debug, Diagnostic)]
pub enum StevedoreError {
    // ─────────────────────────────────────────────────────────────────────────
    // Resolution Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("No value for variable '{name}'")]
    #[diagnostic(
        code(stevedore::variable_not_found),
        help("Define '{name}' in the inventory, image or stage vars, or pass it with -p {name}=<value>")
    )]
    VariableNotFound { name: String },

    #[error("Image input '{name}' was not supplied")]
    #[diagnostic(
        code(stevedore::missing_input),
        help("The image declares '{name}' in its inputs; pass it with -p {name}=<value>")
    )]
    MissingInput { name: String },

    #[error("Image {name} not found")]
    #[diagnostic(
        code(stevedore::image_not_found),
        help("Run 'stevedore list' to see the images defined in the inventory")
    )]
    ImageNotFound { name: String },

    // ─────────────────────────────────────────────────────────────────────────
    // Dispatch Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("task_type {task_type} not supported (stage '{stage}')")]
    #[diagnostic(
        code(stevedore::unknown_task_type),
        help("Supported task types: dockerfile_create, dockerfile_template, docker_build, tag_image")
    )]
    UnknownTaskType { stage: String, task_type: String },

    // ─────────────────────────────────────────────────────────────────────────
    // Build Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("Image build failed for context '{context}': {message}")]
    #[diagnostic(code(stevedore::build_failed))]
    BuildFailed { context: String, message: String },

    // ─────────────────────────────────────────────────────────────────────────
    // Publish Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("{operation} of '{target}' failed: {message}")]
    #[diagnostic(code(stevedore::publish_failed))]
    PublishFailed {
        operation: String,
        target: String,
        message: String,
    },

    // ─────────────────────────────────────────────────────────────────────────
    // Configuration Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("Stage '{stage}' is invalid: {reason}")]
    #[diagnostic(code(stevedore::invalid_stage))]
    InvalidStage { stage: String, reason: String },

    #[error("No context defined for image or stage '{stage}'")]
    #[diagnostic(
        code(stevedore::missing_docker_context),
        help("Set 'vars.context' on the stage or image, or 'dockercontext' on the stage")
    )]
    MissingDockerContext { stage: String },

    #[error("Invalid inventory: {reason}")]
    #[diagnostic(code(stevedore::invalid_inventory))]
    InvalidInventory {
        reason: String,
        #[help]
        help: Option<String>,
    },

    // ─────────────────────────────────────────────────────────────────────────
    // Tool Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("Tool '{tool}' not found")]
    #[diagnostic(code(stevedore::tool_not_found), help("{suggestion}"))]
    ToolNotFound { tool: String, suggestion: String },

    #[error("Tool '{tool}' execution failed: {error}")]
    #[diagnostic(code(stevedore::tool_execution_failed))]
    ToolExecutionFailed {
        tool: String,
        error: String,
        #[help]
        help: Option<String>,
    },

    // ─────────────────────────────────────────────────────────────────────────
    // File Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("Inventory file not found: {path}")]
    #[diagnostic(
        code(stevedore::inventory_not_found),
        help("Pass --inventory <path> or create inventory.yaml in the working directory")
    )]
    InventoryNotFound { path: PathBuf },

    #[error("Failed to read file '{path}': {error}")]
    #[diagnostic(code(stevedore::file_read_error))]
    FileReadError { path: PathBuf, error: String },

    #[error("Failed to write file '{path}': {error}")]
    #[diagnostic(code(stevedore::file_write_error))]
    FileWriteError { path: PathBuf, error: String },

    // ─────────────────────────────────────────────────────────────────────────
    // IO/System Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("IO error: {message}")]
    #[diagnostic(code(stevedore::io_error))]
    Io { message: String },

    #[error("YAML parsing error: {message}")]
    #[diagnostic(code(stevedore::yaml_error))]
    Yaml { message: String },

    #[error("JSON parsing error: {message}")]
    #[diagnostic(code(stevedore::json_error))]
    Json { message: String },

    #[error("Template rendering error: {message}")]
    #[diagnostic(code(stevedore::template_error))]
    Template { message: String },

    #[error("HTTP error: {message}")]
    #[diagnostic(code(stevedore::http_error))]
    Http { message: String },
}

impl From<std::io::Error> for StevedoreError {
    fn from(e: std::io::Error) -> Self {
        Self::Io { message: e.to_string() }
    }
}

impl From<serde_yaml::Error> for StevedoreError {
    fn from(e: serde_yaml::Error) -> Self {
        Self::Yaml { message: e.to_string() }
    }
}

impl From<serde_json::Error> for StevedoreError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json { message: e.to_string() }
    }
}

impl From<tera::Error> for StevedoreError {
    fn from(e: tera::Error) -> Self {
        // tera keeps the useful part of the message in the source chain
        let mut message = e.to_string();
        let mut source = std::error::Error::source(&e);
        while let Some(inner) = source {
            message.push_str(": ");
            message.push_str(&inner.to_string());
            source = inner.source();
        }
        Self::Template { message }
    }
}

impl From<reqwest::Error> for StevedoreError {
    fn from(e: reqwest::Error) -> Self {
        Self::Http { message: e.to_string() }
    }
}

impl StevedoreError {
    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::VariableNotFound { .. }
            | Self::MissingInput { .. }
            | Self::ImageNotFound { .. } => ErrorKind::Resolution,
            Self::UnknownTaskType { .. } => ErrorKind::Dispatch,
            Self::BuildFailed { .. } => ErrorKind::Build,
            Self::PublishFailed { .. } => ErrorKind::Publish,
            Self::InvalidStage { .. }
            | Self::MissingDockerContext { .. }
            | Self::InvalidInventory { .. } => ErrorKind::Configuration,
            _ => ErrorKind::System,
        }
    }

    /// Whether the error policy may record this error and continue
    pub fn is_capturable(&self) -> bool {
        self.kind() == ErrorKind::Publish
    }

    /// Create a tool not found error with installation suggestion
    pub fn tool_not_found(tool: &str) -> Self {
        let suggestion = match tool {
            "docker" => "Install Docker: https://docs.docker.com/get-docker/".to_string(),
            "aws" => "Install the AWS CLI: https://aws.amazon.com/cli/".to_string(),
            _ => format!("Install {} and ensure it's in your PATH", tool),
        };

        Self::ToolNotFound {
            tool: tool.to_string(),
            suggestion,
        }
    }

    /// Wrap any error raised while publishing `target`
    ///
    /// Publish failures are already in the right shape and pass through
    /// untouched; everything else keeps its message under the new operation.
    pub fn publish(operation: &str, target: &str, error: StevedoreError) -> Self {
        match error {
            Self::PublishFailed { .. } => error,
            other => Self::PublishFailed {
                operation: operation.to_string(),
                target: target.to_string(),
                message: other.to_string(),
            },
        }
    }

    /// Create an invalid stage error
    pub fn invalid_stage(stage: &str, reason: impl Into<String>) -> Self {
        Self::InvalidStage {
            stage: stage.to_string(),
            reason: reason.into(),
        }
    }
}
