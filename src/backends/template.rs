// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 stevedore contributors

//! Dockerfile templates rendered with tera

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{BTreeMap, VecDeque};
use std::path::Path;
use tera::{Context, Tera};

use super::TemplateRenderer;
use crate::errors::{StevedoreError, StevedoreResult};
use crate::inventory::Vars;

/// Name of the template for a variant: `Dockerfile.<variant>` or `Dockerfile`
pub fn template_name(variant: Option<&str>) -> String {
    match variant {
        Some(variant) => format!("Dockerfile.{}", variant),
        None => "Dockerfile".to_string(),
    }
}

/// Templates named by `extends`, `include` and `import` tags
static TEMPLATE_REFERENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"\{%-?\s*(?:extends|include|import)\s+["']([^"']+)["']"#)
        .expect("template reference pattern is valid")
});

/// Renders `Dockerfile*` templates from a directory
#[derive(Debug, Default)]
pub struct TeraRenderer;

impl TeraRenderer {
    pub fn new() -> Self {
        Self
    }

    /// Load template `name` from `dir`, plus the templates it references
    ///
    /// Other files in `dir` are never read. A referenced template that does
    /// not exist is left for tera to report.
    fn load(dir: &Path, name: &str) -> StevedoreResult<Tera> {
        let mut templates = BTreeMap::new();
        let mut pending = VecDeque::from([name.to_string()]);

        while let Some(next) = pending.pop_front() {
            if templates.contains_key(&next) {
                continue;
            }

            let path = dir.join(&next);
            if next != name && !path.is_file() {
                continue;
            }

            let content =
                std::fs::read_to_string(&path).map_err(|e| StevedoreError::FileReadError {
                    path: path.clone(),
                    error: if e.kind() == std::io::ErrorKind::NotFound {
                        "template not found".to_string()
                    } else {
                        e.to_string()
                    },
                })?;

            pending.extend(
                TEMPLATE_REFERENCE
                    .captures_iter(&content)
                    .map(|c| c[1].to_string()),
            );
            templates.insert(next, content);
        }

        let mut tera = Tera::default();
        tera.add_raw_templates(templates)?;
        Ok(tera)
    }
}

impl TemplateRenderer for TeraRenderer {
    fn render(
        &self,
        context_dir: &Path,
        variant: Option<&str>,
        params: &Vars,
    ) -> StevedoreResult<String> {
        let name = template_name(variant);
        let tera = Self::load(context_dir, &name)?;

        let mut context = Context::new();
        for (key, value) in params {
            context.insert(key.as_str(), value);
        }

        // Undefined variables are an error in tera
        Ok(tera.render(&name, &context)?)
    }
}
