// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 stevedore contributors

//! Validate command - check an inventory

use colored::Colorize;
use miette::Result;
use std::path::PathBuf;

use crate::inventory::{Inventory, InventoryValidator};
use crate::utils;

/// Run the validate command
pub async fn run(inventory_path: PathBuf, verbose: bool) -> Result<()> {
    println!("{}", "Validating inventory...".bold());
    println!();

    let inventory = match Inventory::from_file(&inventory_path) {
        Ok(inventory) => inventory,
        Err(e) => {
            utils::print_error("Failed to load inventory");
            eprintln!();
            return Err(e.into());
        }
    };

    utils::print_success("Inventory file is valid YAML");

    let validation = InventoryValidator::validate(&inventory);

    if !validation.errors.is_empty() {
        println!();
        println!("{}:", "Errors".red().bold());
        for error in &validation.errors {
            utils::print_error(error);
        }
    }

    if !validation.warnings.is_empty() {
        println!();
        println!("{}:", "Warnings".yellow().bold());
        for warning in &validation.warnings {
            utils::print_warning(warning);
        }
    }

    if verbose {
        println!();
        println!("{}:", "Inventory summary".bold());
        println!("  Variables: {}", inventory.vars.len());
        println!("  Images: {}", inventory.images.len());
    }

    println!();

    if !validation.is_valid() {
        return Err(miette::miette!("Inventory validation failed"));
    }

    if validation.has_warnings() {
        println!("{}", "Inventory is valid but has warnings.".yellow().bold());
    } else {
        println!("{}", "Inventory is valid!".green().bold());
    }

    Ok(())
}
