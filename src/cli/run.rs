// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 stevedore contributors

//! Run command - execute the stages of an image

use colored::Colorize;
use miette::Result;

use super::RunArgs;
use crate::backends::Backends;
use crate::engine::{parse_tag_list, process_image, RunOptions};

/// Build run options from command line arguments
pub fn options_from_args(args: RunArgs) -> RunOptions {
    let mut options = RunOptions::new(args.image);
    options.parameters = args.params.into_iter().collect();
    options.skip_tags = parse_tag_list(&args.skip_tags);
    options.include_tags = parse_tag_list(&args.include_tags);
    options.inventory = args.inventory;
    options.continue_on_errors = !args.abort_on_error;
    options.fail_on_errors = args.fail_on_errors;
    options.pipeline = args.pipeline;
    options
}

/// Run the image
pub async fn run(args: RunArgs, verbose: bool) -> Result<()> {
    let options = options_from_args(args);
    let outcome = process_image(&options, Backends::from_environment()).await?;

    if let Some(report) = &outcome.report {
        println!("{}", report.to_json_pretty()?);
    }

    if !outcome.captured.is_empty() {
        eprintln!();
        eprintln!(
            "{}",
            format!("{} publish error(s) were tolerated:", outcome.captured.len())
                .yellow()
                .bold()
        );
        for captured in &outcome.captured {
            eprintln!("  {} {}", "⚠".yellow(), captured);
        }
    }

    if verbose {
        eprintln!("{} {}", "Run ID:".dimmed(), outcome.run_id);
    }

    Ok(())
}
