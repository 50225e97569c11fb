//! Shared types, errors, and domain constants for the goal-tracking schema.

pub mod defaults;
pub mod error;
pub mod hashing;
pub mod settings;
pub mod types;
