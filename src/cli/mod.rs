//! CLI module for BakeBuddy
//!
//! Handles command-line argument parsing.

pub mod args;

pub use args::{Args, Commands, SignalArg, Verbosity};
