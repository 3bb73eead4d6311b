//! Stirling Fixes - from raw telemetry rows to client-ready fixes
//!
//! Provides:
//! - `Fix` output record and its JSON shape
//! - Field transform with mounting and declination corrections
//! - Geomagnetic declination models
//! - Paginated fetch-and-normalize pipeline
//! - `FixFeed`, the query-to-fixes entry point used by the API and CLI

#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod feed;
pub mod fix;
pub mod geomag;
pub mod pipeline;
pub mod transform;

pub use feed::FixFeed;
pub use fix::{Fix, FixBatch, Heading, WholeDegrees};
pub use geomag::{DeclinationModel, DipoleModel, FixedDeclination};
pub use pipeline::FixPipeline;
pub use transform::{Corrections, FieldTransform};
