//! Priority-ordered composition of pluggable validation rules.
//!
//! Validators produce severity-tagged results; the engine runs every
//! registered validator in ascending priority order and accumulates all
//! results, so a caller sees every error and every warning in one pass.

pub mod engine;
pub mod types;

pub use engine::ValidationEngine;
pub use types::{RuleDescriptor, Severity, ValidationFailed, ValidationResult, Validator};
