//! Stirling Store - access to the telemetry table
//!
//! Provides:
//! - Raw entity model as returned by the table service
//! - Range query builder keyed on RowKey
//! - `TableStore` paging contract with opaque continuation tokens
//! - Azure Table REST client and an in-memory table

#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod azure;
pub mod client;
pub mod entity;
pub mod memory;
pub mod query;

pub use azure::AzureTableClient;
pub use client::{ContinuationToken, Page, TableStore};
pub use entity::{RawEntity, RawValue};
pub use memory::InMemoryTableStore;
pub use query::{Query, RangeQueryBuilder, RowKeyBound, TimeBound, FIX_COLUMNS};
