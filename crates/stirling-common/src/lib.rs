//! Stirling Common - Shared utilities and types
//!
//! This crate provides functionality used across all Stirling components:
//! - Error types and handling
//! - Configuration management
//! - Metrics and observability

#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod metrics;

pub use config::Config;
pub use error::{Error, Result, StoreError};
