//! Command-line interface

pub mod args;

pub use args::{parse_duration, Args, Command, DetectArgs};
