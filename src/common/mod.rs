//! # Common Components
//!
//! Shared utilities used by both the HTTP server and the command-line tool.
//!
//! ## Modules
//!
//! - [`config`]: Configuration parsing utilities
//! - [`logging`]: Logger setup

pub mod config;
pub mod logging;
