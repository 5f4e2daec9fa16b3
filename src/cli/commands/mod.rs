//! Subcommand implementations.

pub mod asset;
pub mod collection;
pub mod remote;
