// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 stevedore contributors

//! Pipeline execution engine
//!
//! Variable resolution, tag filtering, stage dispatch, the error policy and
//! signing around publishes.

mod context;
mod executor;
mod policy;
mod report;
mod resolver;
mod signing;
mod tags;
mod tasks;

pub use context::{default_trust_dir, RunContext, RunOptions, RunOutcome, RunState};
pub use executor::{process_image, ImageExecutor};
pub use policy::{CapturedError, Disposition, ErrorPolicy};
pub use report::Report;
pub use resolver::{find_references, Scopes, VERSION_ID};
pub use signing::{
    is_signing_enabled, SigningGuard, SigningRequest, CONTENT_TRUST, CONTENT_TRUST_PASSPHRASE,
};
pub use tags::{parse_tag_list, should_include, should_run, should_skip, TagSet};
pub use tasks::find_docker_context;
