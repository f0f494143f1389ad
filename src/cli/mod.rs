//! CLI command implementations.
//!
//! Thin argument handling over the library; each subcommand lives in its
//! own module.

pub mod run;
pub mod sessions;
