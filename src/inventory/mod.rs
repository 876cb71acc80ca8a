// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 stevedore contributors

//! Inventory definitions and types
//!
//! This module defines the data structures read from an inventory file:
//! shared variables, images, stages and their task-specific fields.

mod definition;
mod validation;

pub use definition::*;
pub use validation::{InventoryValidator, ValidationResult};
