//! Command-line interface module.

mod args;
pub mod export;
pub mod import;
pub mod pull;
pub mod push;
pub mod watch;

pub use args::{Cli, Commands};
