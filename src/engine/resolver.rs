// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 stevedore contributors

//! Variable resolution and interpolation
//!
//! A variable is looked up in four scopes, in increasing precedence:
//! inventory vars, run parameters, image vars and stage vars. A later scope
//! that defines the name overrides every earlier one. Two rules sit outside
//! that fold: `version_id` always resolves to the run identifier, and a name
//! listed in the image `inputs` must come from the run parameters.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::collections::HashMap;

use crate::errors::{StevedoreError, StevedoreResult};
use crate::inventory::Vars;

/// Reserved variable holding the run identifier
pub const VERSION_ID: &str = "version_id";

static REFERENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\$\(inputs\.params\.(\w+)\)").expect("reference pattern is valid")
});

/// Distinct variable names referenced in `template`, in order of appearance
pub fn find_references(template: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for caps in REFERENCE.captures_iter(template) {
        let name = &caps[1];
        if !names.iter().any(|n| n == name) {
            names.push(name.to_string());
        }
    }
    names
}

/// The scopes a variable can be resolved against
#[derive(Debug, Clone, Copy)]
pub struct Scopes<'a> {
    pub run_id: &'a str,
    pub inventory: &'a Vars,
    pub parameters: &'a Vars,
    pub image: &'a Vars,
    pub stage: Option<&'a Vars>,
    /// Image inputs: names forced to come from `parameters`
    pub inputs: &'a [String],
}

impl<'a> Scopes<'a> {
    /// Resolve a single variable
    pub fn resolve(&self, name: &str) -> StevedoreResult<String> {
        if name == VERSION_ID {
            return Ok(self.run_id.to_string());
        }

        if self.inputs.iter().any(|input| input == name) {
            return self
                .parameters
                .get(name)
                .cloned()
                .ok_or_else(|| StevedoreError::MissingInput {
                    name: name.to_string(),
                });
        }

        let lookups: [Option<&Vars>; 4] = [
            Some(self.inventory),
            Some(self.parameters),
            Some(self.image),
            self.stage,
        ];

        lookups
            .into_iter()
            .flatten()
            .fold(None, |found, scope| scope.get(name).or(found))
            .cloned()
            .ok_or_else(|| StevedoreError::VariableNotFound {
                name: name.to_string(),
            })
    }

    /// Substitute every variable reference in `template`
    ///
    /// Each distinct name is resolved once. If any name fails to resolve the
    /// whole call fails; a partially substituted string is never returned.
    pub fn interpolate(&self, template: &str) -> StevedoreResult<String> {
        let names = find_references(template);
        if names.is_empty() {
            return Ok(template.to_string());
        }

        let mut values = HashMap::with_capacity(names.len());
        for name in names {
            let value = self.resolve(&name)?;
            values.insert(name, value);
        }

        let interpolated = REFERENCE.replace_all(template, |caps: &Captures| {
            values.get(&caps[1]).cloned().unwrap_or_default()
        });

        Ok(interpolated.into_owned())
    }
}
