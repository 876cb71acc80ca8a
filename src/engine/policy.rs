// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 stevedore contributors

//! Error policy
//!
//! Two flags give three run outcomes: abort at the first publish error,
//! tolerate publish errors and succeed, or tolerate them and fail once every
//! stage has run. Errors of any other kind always abort.

use crate::errors::StevedoreError;

/// What to do with an error raised while publishing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Record the error and move on to the next destination or stage
    Capture,
    /// Stop the run with this error
    Abort,
}

/// Per-run error policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorPolicy {
    /// Record publish errors instead of stopping
    pub continue_on_errors: bool,
    /// Fail the run at the end if anything was recorded
    pub fail_on_errors: bool,
}

impl Default for ErrorPolicy {
    fn default() -> Self {
        Self {
            continue_on_errors: true,
            fail_on_errors: false,
        }
    }
}

impl ErrorPolicy {
    /// Decide what happens to `error`
    pub fn disposition(&self, error: &StevedoreError) -> Disposition {
        if self.continue_on_errors && error.is_capturable() {
            Disposition::Capture
        } else {
            Disposition::Abort
        }
    }

    /// Whether a completed run with these captured errors must fail
    pub fn fails_run(&self, captured: &[CapturedError]) -> bool {
        self.fail_on_errors && !captured.is_empty()
    }
}

/// A tolerated error and where it happened
#[derive(Debug)]
pub struct CapturedError {
    /// Stage that was running
    pub stage: String,
    /// Event prefix of the failed operation, e.g. `docker-image-push`
    pub operation: String,
    pub error: StevedoreError,
}

impl std::fmt::Display for CapturedError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.stage, self.error)
    }
}
