// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 stevedore contributors

//! # stevedore - inventory-driven container image builds
//!
//! An inventory file lists images; each image is an ordered list of stages.
//! `stevedore` runs the stages of one image in order: it writes or renders
//! Dockerfiles, builds images, retags existing ones, and pushes the results
//! to their registries, signing them when asked to.
//!
//! ## Features
//!
//! - **Layered variables** - inventory, run parameters, image and stage scopes
//! - **Tag filtering** - skip or select stages by tag
//! - **Error policy** - abort, tolerate, or tolerate and fail at the end
//! - **Signing** - docker content trust keys provisioned around each push
//! - **Pipeline mode** - a JSON report of every event for CI systems
//!
//! ## Quick Start
//!
//! ```bash
//! # Build every stage of an image
//! stevedore run --image app -p version=1.2
//!
//! # Only the stages tagged 'ubi', with a JSON report on stdout
//! stevedore run --image app --include-tags ubi --pipeline
//!
//! # Check the inventory
//! stevedore validate
//! ```

pub mod backends;
pub mod cli;
pub mod engine;
pub mod errors;
pub mod inventory;
pub mod utils;

// Re-export commonly used types
pub use backends::Backends;
pub use engine::{process_image, ImageExecutor, RunContext, RunOptions, RunOutcome};
pub use errors::{StevedoreError, StevedoreResult};
pub use inventory::{Image, Inventory, Stage};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
