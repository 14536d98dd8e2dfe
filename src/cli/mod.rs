//! CLI module for netpilot
//!
//! Command-line argument parsing and verbosity handling.

pub mod args;

pub use args::{parse_device, Args, Commands, DeviceArgs, Verbosity};
