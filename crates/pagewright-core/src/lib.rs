// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Pagewright — Core types, error definitions and page-reference resolution
// shared across all crates.

pub mod config;
pub mod error;
pub mod human_errors;
pub mod selector;
pub mod types;

pub use config::EngineConfig;
pub use error::{PagewrightError, ValidationError};
pub use selector::{PageSelector, SplitPlan, SplitRange};
pub use types::*;
