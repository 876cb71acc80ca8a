// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 stevedore contributors

//! Utility modules
//!
//! Terminal output shared by the engine and the CLI.

pub mod colors;

pub use colors::*;
