//! Command handlers for acpi-extract
//!
//! Each subcommand has its own module with handler functions.

pub mod configure;
pub mod extract;
