//! Core utilities shared by the swapframe crates.
//!
//! This crate provides:
//! - Error types and result aliases
//! - Logging initialization
//! - Fixed renderer configuration

pub mod config;
mod error;
mod logging;

pub use config::RendererConfig;
pub use error::{Error, Result};
pub use logging::init_logging;
