// Lockbox shared type definitions
// Each submodule defines types used across the crate.

pub mod action;
pub mod credential;
pub mod errors;
pub mod fill;
pub mod item;
pub mod settings;
pub mod structure;
