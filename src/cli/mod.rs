//! CLI layer for rizom-bridge.
//!
//! Provides the command-line interface using clap, with commands for
//! exporting scenes, importing UVs and inspecting bridge state.

pub mod commands;
pub mod output;
pub mod parser;

pub use commands::execute;
pub use output::OutputFormat;
pub use parser::{Cli, Commands};
