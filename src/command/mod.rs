//! Command execution pipeline
//!
//! External inputs (player selection, move orders, debug controls) arrive as
//! [`Command`] values and are applied between frames by [`CommandExecutor`].

pub mod executor;

pub use executor::{Command, CommandExecutor, ExecutionResult};
