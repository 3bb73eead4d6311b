//! Stirling API Layer
//!
//! Provides the REST API (axum): the fix feed, health, metrics and the
//! static dashboard files.

#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod rest;

pub use error::ApiError;
pub use rest::RestServer;
