// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 stevedore contributors

//! Pipeline-mode output report
//!
//! Events are recorded as `image -> stage -> event -> message`. Events that
//! happen outside any stage sit directly under the image.

use serde_json::{Map, Value};

use crate::errors::StevedoreResult;

/// Accumulated events of a run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Report {
    root: Map<String, Value>,
}

impl Report {
    /// Create an empty report
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an event; a later event with the same name replaces the earlier one
    pub fn record(&mut self, image: &str, stage: Option<&str>, event: &str, message: &str) {
        let mut target = section(&mut self.root, image);
        if let Some(stage) = stage {
            target = section(target, stage);
        }
        target.insert(event.to_string(), Value::String(message.to_string()));
    }

    /// Everything recorded for an image
    pub fn image(&self, image: &str) -> Option<&Map<String, Value>> {
        self.root.get(image).and_then(Value::as_object)
    }

    /// Everything recorded for a stage of an image
    pub fn stage(&self, image: &str, stage: &str) -> Option<&Map<String, Value>> {
        self.image(image)?.get(stage).and_then(Value::as_object)
    }

    /// A single event message
    pub fn event(&self, image: &str, stage: Option<&str>, event: &str) -> Option<&str> {
        let section = match stage {
            Some(stage) => self.stage(image, stage)?,
            None => self.image(image)?,
        };
        section.get(event).and_then(Value::as_str)
    }

    /// Whether nothing has been recorded
    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }

    /// The report as a JSON value
    pub fn to_json(&self) -> Value {
        Value::Object(self.root.clone())
    }

    /// The report as pretty-printed JSON
    pub fn to_json_pretty(&self) -> StevedoreResult<String> {
        serde_json::to_string_pretty(&self.root).map_err(Into::into)
    }
}

fn section<'a>(map: &'a mut Map<String, Value>, key: &str) -> &'a mut Map<String, Value> {
    let entry = map
        .entry(key.to_string())
        .or_insert_with(|| Value::Object(Map::new()));

    // A plain event recorded under the same name gives way to the section
    if !entry.is_object() {
        *entry = Value::Object(Map::new());
    }

    match entry {
        Value::Object(section) => section,
        _ => unreachable!("entry was just made an object"),
    }
}
