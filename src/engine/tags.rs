// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 stevedore contributors

//! Stage tag filtering

use std::collections::BTreeSet;

use crate::inventory::Stage;

/// Set of tags given on the command line
pub type TagSet = BTreeSet<String>;

/// Split a comma-separated tag list, trimming entries and dropping empty ones
pub fn parse_tag_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(String::from)
        .collect()
}

/// A stage is skipped when it has tags and any of them is a skip tag
pub fn should_skip(stage: &Stage, skip_tags: &TagSet) -> bool {
    if stage.tags.is_empty() {
        return false;
    }

    stage.tags.iter().any(|tag| skip_tags.contains(tag))
}

/// A stage is included when no include tags were given, or when it carries
/// at least one of them. Untagged stages are left out of a filtered run.
pub fn should_include(stage: &Stage, include_tags: &TagSet) -> bool {
    if include_tags.is_empty() {
        return true;
    }

    stage.tags.iter().any(|tag| include_tags.contains(tag))
}

/// Combined filter used by the executor
pub fn should_run(stage: &Stage, skip_tags: &TagSet, include_tags: &TagSet) -> bool {
    !should_skip(stage, skip_tags) && should_include(stage, include_tags)
}
