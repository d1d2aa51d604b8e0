//! Configuration validation module.
//!
//! Hands configuration text to an external validator through a temporary
//! file and reports the outcome as a `ValidationResult`.

pub mod amtool;

pub use amtool::{check_config, ConfigChecker};
