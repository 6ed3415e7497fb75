//! CLI command implementations
//!
//! Each submodule implements one subcommand and returns the text to print.

pub mod history;
pub mod quote;
