//! Command implementations, one module per subcommand

pub mod build;
pub mod push;
