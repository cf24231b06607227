//! Shared helpers: external commands, path handling, pluralization.

pub mod exec;
pub mod path;
pub mod plural;
