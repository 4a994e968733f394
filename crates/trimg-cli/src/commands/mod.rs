//! Subcommand implementations

pub mod replace;
pub mod transfer;
