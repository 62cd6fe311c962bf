//! # Markora
//!
//! Hides a short text watermark in the low bits of an image's RGB channels and
//! recovers it later.
//!
//! - [`processing`]: the watermark codec and marker rules
//! - [`common`]: configuration and logging
//! - [`server`]: HTTP service around the codec

pub mod common;
pub mod processing;
pub mod server;

pub use processing::{DetectionOutcome, MarkerPolicy, WatermarkError};
pub use server::ServerCore;
