//! Subcommand implementations.

pub mod activity;
pub mod commits;
pub mod fetch;
pub mod fetch_fixed;
pub mod fixes;
pub mod populate;
pub mod timestamp;
pub mod untriaged;
