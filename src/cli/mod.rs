// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 stevedore contributors

//! CLI command definitions and handlers
//!
//! Defines the command-line interface for stevedore.

pub mod list;
pub mod run;
pub mod validate;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Inventory-driven container image builds
#[derive(Parser, Debug)]
#[clap(
    name = "stevedore",
    version,
    about = "Build, tag, sign and push container images described in an inventory file",
    long_about = None,
    after_help = "Examples:\n\
        stevedore run --image app                    Build every stage of 'app'\n\
        stevedore run --image app -p version=1.2     Pass a run parameter\n\
        stevedore run --image app --include-tags ubi Only run stages tagged 'ubi'\n\
        stevedore list                               Show images and stages\n\n\
        See 'stevedore <command> --help' for more information on a specific command."
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[clap(short, long, global = true)]
    pub verbose: bool,

    /// Change to directory before executing
    #[clap(short = 'C', long, global = true, value_name = "DIR")]
    pub directory: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the stages of an image
    Run(RunArgs),

    /// Check an inventory for problems
    Validate {
        /// Inventory file
        #[clap(short, long, default_value = "inventory.yaml", env = "STEVEDORE_INVENTORY")]
        inventory: PathBuf,
    },

    /// List images and their stages
    List {
        /// Inventory file
        #[clap(short, long, default_value = "inventory.yaml", env = "STEVEDORE_INVENTORY")]
        inventory: PathBuf,
    },
}

/// Arguments of the run command
#[derive(clap::Args, Debug, Clone)]
pub struct RunArgs {
    /// Image to build
    #[clap(long)]
    pub image: String,

    /// Run parameter as key=value (repeatable)
    #[clap(short = 'p', long = "param", value_name = "KEY=VALUE", value_parser = parse_key_value)]
    pub params: Vec<(String, String)>,

    /// Print a JSON report of every event on stdout
    #[clap(long)]
    pub pipeline: bool,

    /// Comma-separated tags of stages to skip
    #[clap(long, default_value = "")]
    pub skip_tags: String,

    /// Comma-separated tags of stages to run
    #[clap(long, default_value = "")]
    pub include_tags: String,

    /// Inventory file
    #[clap(short, long, default_value = "inventory.yaml", env = "STEVEDORE_INVENTORY")]
    pub inventory: PathBuf,

    /// Stop at the first publish error instead of carrying on
    #[clap(long)]
    pub abort_on_error: bool,

    /// Fail at the end if any publish error was tolerated
    #[clap(long)]
    pub fail_on_errors: bool,
}

/// Parse a `key=value` pair
pub fn parse_key_value(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{}'", s))?;

    if key.is_empty() {
        return Err(format!("empty key in '{}'", s));
    }

    Ok((key.to_string(), value.to_string()))
}
