// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 stevedore contributors

//! Terminal color utilities
//!
//! Engine events and CLI messages share one color scheme.

use colored::{Color, Colorize};

/// Color an engine event is printed in
pub fn event_color(event: &str) -> Color {
    if event.ends_with("/error") || event.ends_with("/captured-errors") || event == "stage-aborted"
    {
        Color::Red
    } else if event == "image-build-start" {
        Color::Yellow
    } else if event == "skipping-stage" {
        Color::Green
    } else {
        Color::White
    }
}

/// Format an engine event line: `[stage/task_type] event: message`
pub fn format_event(title: &str, event: &str, message: &str) -> String {
    format!("{}{}: {}", title, event, message)
}

/// Print an engine event, to stderr when stdout carries machine output
pub fn print_event(title: &str, event: &str, message: &str, to_stderr: bool) {
    let line = format_event(title, event, message).color(event_color(event));
    if to_stderr {
        eprintln!("{}", line);
    } else {
        println!("{}", line);
    }
}

/// Print a styled header
pub fn print_header(title: &str) {
    println!("{}", title.bold());
    println!("{}", "═".repeat(title.len().max(40)));
}

/// Print a success check
pub fn print_success(msg: &str) {
    println!("  {} {}", "✓".green(), msg);
}

/// Print an error cross
pub fn print_error(msg: &str) {
    println!("  {} {}", "✗".red(), msg);
}

/// Print a warning
pub fn print_warning(msg: &str) {
    println!("  {} {}", "⚠".yellow(), msg);
}

/// Print an info item
pub fn print_info(msg: &str) {
    println!("  {} {}", "→".blue(), msg);
}
