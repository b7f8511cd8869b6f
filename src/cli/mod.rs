//! CLI module for modsched - command-line interface and subcommands.

pub mod commands;

pub use commands::Cli;
