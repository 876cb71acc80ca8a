// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 stevedore contributors

//! Inventory validation
//!
//! Checks an inventory before anything is built. A run only needs the
//! selected image to decode; validation looks at every image at once.

use std::collections::HashSet;

use crate::engine::find_references;
use crate::inventory::{Image, Inventory, Output, Stage, Task};

/// Inventory validator
pub struct InventoryValidator;

impl InventoryValidator {
    /// Validate an inventory
    pub fn validate(inventory: &Inventory) -> ValidationResult {
        let mut result = ValidationResult::new();

        if inventory.images.is_empty() {
            result.add_error("Inventory has no images defined");
        }

        let mut seen_names = HashSet::new();
        for (idx, value) in inventory.images.iter().enumerate() {
            match value.get("name").and_then(serde_yaml::Value::as_str) {
                Some(name) => {
                    if !seen_names.insert(name) {
                        result.add_error(&format!("Duplicate image name: '{}'", name));
                    }
                }
                None => result.add_error(&format!("Image #{} has no name", idx + 1)),
            }
        }

        let decoded = inventory.decode_images().into_iter();
        for ((label, image), value) in decoded.zip(&inventory.images) {
            match image {
                Ok(image) => Self::validate_image(&image, value, &mut result),
                Err(e) => result.add_error(&format!("Image '{}': {}", label, e)),
            }
        }

        result
    }

    /// Validate a single decoded image
    fn validate_image(image: &Image, raw: &serde_yaml::Value, result: &mut ValidationResult) {
        if image.stages.is_empty() {
            result.add_warning(&format!("Image '{}': no stages defined", image.name));
        }

        let mut seen_stages = HashSet::new();
        for stage in &image.stages {
            if !seen_stages.insert(stage.name.as_str()) {
                result.add_error(&format!(
                    "Image '{}': Duplicate stage name: '{}'",
                    image.name, stage.name
                ));
            }

            Self::validate_stage(image, stage, result);
        }

        // Inputs nobody references are almost always a typo
        let text = serde_yaml::to_string(raw).unwrap_or_default();
        let referenced: HashSet<String> = find_references(&text).into_iter().collect();
        for input in &image.inputs {
            let used_by_template = image.stages.iter().any(|stage| {
                matches!(stage.task(), Ok(Task::DockerfileTemplate(t)) if t.inputs.contains(input))
            });

            if !referenced.contains(input) && !used_by_template {
                result.add_warning(&format!(
                    "Image '{}': input '{}' is never referenced",
                    image.name, input
                ));
            }
        }
    }

    /// Validate task-specific fields of a stage
    fn validate_stage(image: &Image, stage: &Stage, result: &mut ValidationResult) {
        let prefix = format!("Image '{}', stage '{}'", image.name, stage.name);

        let task = match stage.task() {
            Ok(task) => task,
            Err(e) => {
                result.add_error(&format!("Image '{}': {}", image.name, e));
                return;
            }
        };

        match task {
            Task::DockerfileCreate(create) => match create.output.first() {
                Some(Output { dockerfile: Some(_), .. }) => {}
                _ => result.add_error(&format!(
                    "{}: first output must name a dockerfile",
                    prefix
                )),
            },
            Task::DockerfileTemplate(template) => {
                if !template.output.iter().any(|o| o.dockerfile.is_some()) {
                    result.add_warning(&format!(
                        "{}: no dockerfile output, rendered template will be discarded",
                        prefix
                    ));
                }
            }
            Task::DockerBuild(build) => {
                if build.dockerfile.is_empty() {
                    result.add_error(&format!("{}: dockerfile is empty", prefix));
                }
                Self::validate_publish_outputs(&prefix, &build.output, result);
            }
            Task::TagImage(tag) => {
                if tag.destination.is_empty() {
                    result.add_warning(&format!("{}: no destinations to push to", prefix));
                }
                Self::validate_publish_outputs(&prefix, &tag.destination, result);
            }
        }
    }

    fn validate_publish_outputs(prefix: &str, outputs: &[Output], result: &mut ValidationResult) {
        for (idx, output) in outputs.iter().enumerate() {
            if output.registry.is_none() || output.tag.is_none() {
                result.add_error(&format!(
                    "{}: output #{} needs both registry and tag",
                    prefix,
                    idx + 1
                ));
            }

            let signing_fields = [
                &output.signer_name,
                &output.key_secret_name,
                &output.passphrase_secret_name,
                &output.region,
            ];
            let present = signing_fields.iter().filter(|f| f.is_some()).count();
            if present > 0 && present < signing_fields.len() {
                result.add_warning(&format!(
                    "{}: output #{} has partial signing configuration, image will not be signed",
                    prefix,
                    idx + 1
                ));
            }
        }
    }
}

/// Result of inventory validation
#[derive(Debug, Default)]
pub struct ValidationResult {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_error(&mut self, message: &str) {
        self.errors.push(message.to_string());
    }

    pub fn add_warning(&mut self, message: &str) {
        self.warnings.push(message.to_string());
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}
