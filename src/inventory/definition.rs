// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 stevedore contributors

//! Inventory definition structures
//!
//! Defines the schema for inventory.yaml files. The inventory itself is read
//! loosely: only the image selected for a run is decoded into typed stages,
//! so a problem in one image never blocks building another. Within an image,
//! a stage whose task fields do not decode keeps the failure next to it and
//! only reports it when the stage is actually run.

use serde::{Deserialize, Deserializer};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use crate::errors::{StevedoreError, StevedoreResult};

/// A variable scope: name to (stringified) value
pub type Vars = BTreeMap<String, String>;

/// Inventory file: shared vars plus every buildable image
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Inventory {
    /// Top-level variable scope
    #[serde(default, deserialize_with = "scalar_map")]
    pub vars: Vars,

    /// Image definitions, decoded on demand
    #[serde(default)]
    pub images: Vec<serde_yaml::Value>,
}

impl Inventory {
    /// Load inventory from a YAML file
    pub fn from_file(path: &Path) -> StevedoreResult<Self> {
        if !path.exists() {
            return Err(StevedoreError::InventoryNotFound {
                path: path.to_path_buf(),
            });
        }

        let content =
            std::fs::read_to_string(path).map_err(|e| StevedoreError::FileReadError {
                path: path.to_path_buf(),
                error: e.to_string(),
            })?;

        Self::from_yaml(&content)
    }

    /// Parse inventory from YAML string
    pub fn from_yaml(yaml: &str) -> StevedoreResult<Self> {
        serde_yaml::from_str(yaml).map_err(Into::into)
    }

    /// Find and decode the image with the given name
    pub fn find_image(&self, name: &str) -> StevedoreResult<Image> {
        let value = self
            .images
            .iter()
            .find(|value| image_name(value) == Some(name))
            .ok_or_else(|| StevedoreError::ImageNotFound {
                name: name.to_string(),
            })?;

        Image::from_value(value.clone())
    }

    /// Decode every image, keeping failures next to the image they belong to
    pub fn decode_images(&self) -> Vec<(String, StevedoreResult<Image>)> {
        self.images
            .iter()
            .enumerate()
            .map(|(idx, value)| {
                let label = image_name(value)
                    .map(String::from)
                    .unwrap_or_else(|| format!("#{}", idx + 1));
                (label, Image::from_value(value.clone()))
            })
            .collect()
    }
}

fn image_name(value: &serde_yaml::Value) -> Option<&str> {
    value.get("name").and_then(serde_yaml::Value::as_str)
}

/// One buildable image
#[derive(Debug, Clone)]
pub struct Image {
    /// Image name (selection key)
    pub name: String,

    /// Image-level variable scope
    pub vars: Vars,

    /// Variables that must come from run parameters
    pub inputs: Vec<String>,

    /// Stages in execution order
    pub stages: Vec<Stage>,
}

impl Image {
    /// Decode an image from its YAML value
    ///
    /// Fails only when the image itself or a stage's common fields are
    /// malformed. Task fields are decoded per stage, see [`Stage::task`].
    pub fn from_value(value: serde_yaml::Value) -> StevedoreResult<Self> {
        let raw: RawImage = serde_yaml::from_value(value)?;

        Ok(Self {
            name: raw.name,
            vars: raw.vars,
            inputs: raw.inputs,
            stages: raw.stages.into_iter().map(Stage::from_raw).collect(),
        })
    }
}

#[derive(Debug, Deserialize)]
struct RawImage {
    name: String,
    #[serde(default, deserialize_with = "scalar_map")]
    vars: Vars,
    #[serde(default)]
    inputs: Vec<String>,
    #[serde(default)]
    stages: Vec<RawStage>,
}

#[derive(Debug, Deserialize)]
struct RawStage {
    name: String,
    task_type: String,
    #[serde(default, deserialize_with = "scalar_map")]
    vars: Vars,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    dockercontext: Option<String>,
    #[serde(flatten)]
    fields: serde_yaml::Mapping,
}

/// A single stage of an image pipeline
#[derive(Debug, Clone)]
pub struct Stage {
    /// Stage name
    pub name: String,

    /// Stage-level variable scope
    pub vars: Vars,

    /// Tags used for skip/include filtering
    pub tags: Vec<String>,

    /// Explicit docker build context
    pub dockercontext: Option<String>,

    /// `task_type` as written in the inventory
    pub task_type: String,

    task: Result<Task, StageDefect>,
}

/// Why a stage's task could not be decoded
#[derive(Debug, Clone, PartialEq, Eq)]
enum StageDefect {
    UnknownTaskType,
    InvalidFields(String),
}

impl Stage {
    /// Create a stage with no variables, tags or context
    #[cfg(test)]
    pub(crate) fn new(name: impl Into<String>, task: Task) -> Self {
        Self {
            name: name.into(),
            vars: Vars::new(),
            tags: Vec::new(),
            dockercontext: None,
            task_type: task.kind().as_str().to_string(),
            task: Ok(task),
        }
    }

    /// Set the stage's tags
    #[cfg(test)]
    pub(crate) fn with_tags(mut self, tags: &[&str]) -> Self {
        self.tags = tags.iter().map(|t| t.to_string()).collect();
        self
    }

    /// The decoded task of this stage
    ///
    /// An unknown `task_type` gives `UnknownTaskType`, task fields that do not
    /// fit the task type give `InvalidStage`.
    pub fn task(&self) -> StevedoreResult<&Task> {
        self.task.as_ref().map_err(|defect| match defect {
            StageDefect::UnknownTaskType => StevedoreError::UnknownTaskType {
                stage: self.name.clone(),
                task_type: self.task_type.clone(),
            },
            StageDefect::InvalidFields(reason) => {
                StevedoreError::invalid_stage(&self.name, reason.clone())
            }
        })
    }

    fn from_raw(raw: RawStage) -> Self {
        let task = decode_task(&raw.task_type, raw.fields);

        Self {
            name: raw.name,
            vars: raw.vars,
            tags: raw.tags,
            dockercontext: raw.dockercontext,
            task_type: raw.task_type,
            task,
        }
    }
}

/// Decode the task-specific fields of a stage
///
/// The task type is checked first so that an unknown type is reported as
/// such rather than as a generic parse failure.
fn decode_task(task_type: &str, fields: serde_yaml::Mapping) -> Result<Task, StageDefect> {
    let kind = TaskKind::parse(task_type).ok_or(StageDefect::UnknownTaskType)?;
    let fields = serde_yaml::Value::Mapping(fields);

    let task = match kind {
        TaskKind::DockerfileCreate => serde_yaml::from_value(fields).map(Task::DockerfileCreate),
        TaskKind::DockerfileTemplate => {
            serde_yaml::from_value(fields).map(Task::DockerfileTemplate)
        }
        TaskKind::DockerBuild => serde_yaml::from_value(fields).map(Task::DockerBuild),
        TaskKind::TagImage => serde_yaml::from_value(fields).map(Task::TagImage),
    };

    task.map_err(|e| StageDefect::InvalidFields(e.to_string()))
}

/// Closed set of task types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskKind {
    DockerfileCreate,
    DockerfileTemplate,
    DockerBuild,
    TagImage,
}

impl TaskKind {
    /// Every supported task kind
    pub const ALL: [TaskKind; 4] = [
        Self::DockerfileCreate,
        Self::DockerfileTemplate,
        Self::DockerBuild,
        Self::TagImage,
    ];

    /// The `task_type` spelling used in inventories
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DockerfileCreate => "dockerfile_create",
            Self::DockerfileTemplate => "dockerfile_template",
            Self::DockerBuild => "docker_build",
            Self::TagImage => "tag_image",
        }
    }

    /// Parse a `task_type` value
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == s)
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Task-specific stage configuration
#[derive(Debug, Clone)]
pub enum Task {
    /// Write a data-only Dockerfile made of ADD statements
    DockerfileCreate(DockerfileCreate),
    /// Render a Dockerfile template
    DockerfileTemplate(DockerfileTemplate),
    /// Build an image and publish it
    DockerBuild(DockerBuild),
    /// Pull an image and republish it under new names
    TagImage(TagImage),
}

impl Task {
    /// Get the kind of this task
    pub fn kind(&self) -> TaskKind {
        match self {
            Self::DockerfileCreate(_) => TaskKind::DockerfileCreate,
            Self::DockerfileTemplate(_) => TaskKind::DockerfileTemplate,
            Self::DockerBuild(_) => TaskKind::DockerBuild,
            Self::TagImage(_) => TaskKind::TagImage,
        }
    }
}

/// `dockerfile_create` stage fields
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DockerfileCreate {
    /// Base image, `scratch` when absent
    #[serde(default)]
    pub from: Option<String>,

    /// Files to ADD
    #[serde(default)]
    pub static_files: Vec<StaticFile>,

    /// Output destinations; the first one names the Dockerfile to write
    #[serde(default)]
    pub output: Vec<Output>,
}

/// One ADD statement
#[derive(Debug, Clone, Deserialize)]
pub struct StaticFile {
    /// Build stage to copy from, kept verbatim
    #[serde(default)]
    pub from: Option<String>,
    pub src: String,
    pub dst: String,
}

/// `dockerfile_template` stage fields
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DockerfileTemplate {
    /// Template variant: renders `Dockerfile.<distro>`
    #[serde(default)]
    pub distro: Option<String>,

    /// Variables handed to the template
    #[serde(default)]
    pub inputs: Vec<String>,

    #[serde(default)]
    pub output: Vec<Output>,
}

/// `docker_build` stage fields
#[derive(Debug, Clone, Deserialize)]
pub struct DockerBuild {
    /// Local path or https:// URL
    pub dockerfile: String,

    #[serde(default, deserialize_with = "scalar_map")]
    pub buildargs: BTreeMap<String, String>,

    #[serde(default, deserialize_with = "scalar_map")]
    pub labels: BTreeMap<String, String>,

    #[serde(default)]
    pub platform: Option<String>,

    #[serde(default)]
    pub output: Vec<Output>,
}

/// `tag_image` stage fields
#[derive(Debug, Clone, Deserialize)]
pub struct TagImage {
    pub source: ImageRef,

    #[serde(default)]
    pub destination: Vec<Output>,
}

/// A registry + tag pair
#[derive(Debug, Clone, Deserialize)]
pub struct ImageRef {
    pub registry: String,
    pub tag: String,
}

/// Output destination of a stage
///
/// Dockerfile stages use `dockerfile`; publishing stages use `registry` and
/// `tag`, plus the four signing fields when the pushed image must be signed.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Output {
    #[serde(default)]
    pub dockerfile: Option<String>,
    #[serde(default)]
    pub registry: Option<String>,
    #[serde(default)]
    pub tag: Option<String>,
    #[serde(default)]
    pub signer_name: Option<String>,
    #[serde(default)]
    pub key_secret_name: Option<String>,
    #[serde(default)]
    pub passphrase_secret_name: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
}

/// Deserialize a mapping of YAML scalars into strings
///
/// Numbers and booleans are stringified, nulls are dropped.
fn scalar_map<'de, D>(deserializer: D) -> Result<BTreeMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;
    use serde_yaml::Value;

    let raw = Option::<BTreeMap<String, Value>>::deserialize(deserializer)?.unwrap_or_default();
    let mut vars = BTreeMap::new();

    for (key, value) in raw {
        let value = match value {
            Value::Null => continue,
            Value::String(s) => s,
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => n.to_string(),
            _ => {
                return Err(D::Error::custom(format!(
                    "variable '{}' must be a scalar value",
                    key
                )))
            }
        };
        vars.insert(key, value);
    }

    Ok(vars)
}
