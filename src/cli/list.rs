// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 stevedore contributors

//! List command - show images and their stages

use colored::Colorize;
use miette::Result;
use std::path::PathBuf;

use crate::inventory::Inventory;
use crate::utils;

/// Run the list command
pub async fn run(inventory_path: PathBuf, verbose: bool) -> Result<()> {
    let inventory = Inventory::from_file(&inventory_path)?;

    utils::print_header(&format!("Images in {}", inventory_path.display()));

    for (name, image) in inventory.decode_images() {
        println!();
        let image = match image {
            Ok(image) => image,
            Err(e) => {
                println!("{} {}", name.bold(), "(invalid)".red());
                utils::print_error(&e.to_string());
                continue;
            }
        };

        println!("{}", image.name.bold());

        if verbose && !image.inputs.is_empty() {
            println!("  {} {}", "inputs:".dimmed(), image.inputs.join(", "));
        }

        for (idx, stage) in image.stages.iter().enumerate() {
            let tags = if stage.tags.is_empty() {
                String::new()
            } else {
                format!(" [tags: {}]", stage.tags.join(", "))
            };
            println!(
                "  {}. {} ({}){}",
                idx + 1,
                stage.name,
                stage.task_type.cyan(),
                tags.dimmed()
            );
        }
    }

    Ok(())
}
