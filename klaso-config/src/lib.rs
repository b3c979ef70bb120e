//! Klaso Config - Pure configuration data structures
//!
//! This crate contains only data structures, no logic or global state.
//! It serves as the shared configuration vocabulary across all Klaso crates.
//! Configuration is passed explicitly via parameters, never via globals.

use serde::{Deserialize, Serialize};

/// Definition-time limits enforced when a class is published
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LimitConfig {
    /// Maximum number of fields across the whole inheritance chain
    pub max_fields: usize,
    /// Maximum number of dispatch slots across the whole inheritance chain
    pub max_slots: usize,
    /// Maximum inheritance chain depth (root class counts as 1)
    pub max_depth: usize,
}

impl Default for LimitConfig {
    fn default() -> Self {
        Self {
            max_fields: 1024,
            max_slots: 1024,
            max_depth: 64,
        }
    }
}

/// Evaluation limits applied while a compiled method body runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvalConfig {
    /// Maximum nested method-call depth per dispatch
    pub max_call_depth: usize,
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self { max_call_depth: 256 }
    }
}

/// Top-level configuration for the object model
///
/// Captured by each class descriptor at publication time, so instances of
/// a published class keep the limits they were defined under.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelConfig {
    pub limits: LimitConfig,
    pub eval: EvalConfig,
}
