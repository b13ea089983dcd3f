//! # lineal
//!
//! Library surface of the Lineal binary: the CLI structure and the
//! command implementations, exposed so integration tests can drive
//! commands without spawning a process.

pub mod cli;
