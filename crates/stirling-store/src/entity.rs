//! Raw table entities
//!
//! An entity lives only for the processing of the page it arrived in.

use std::collections::BTreeMap;

/// A column value as stored: the string form of a number or a timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawValue {
    Number(String),
    Timestamp(String),
}

impl RawValue {
    /// The encoded value, whatever its tag
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            RawValue::Number(s) | RawValue::Timestamp(s) => s,
        }
    }

    /// Empty values count as absent
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.as_str().is_empty()
    }
}

/// One row of the telemetry table.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RawEntity {
    partition_key: String,
    row_key: String,
    fields: BTreeMap<String, RawValue>,
}

impl RawEntity {
    pub fn new(partition_key: impl Into<String>, row_key: impl Into<String>) -> Self {
        Self {
            partition_key: partition_key.into(),
            row_key: row_key.into(),
            fields: BTreeMap::new(),
        }
    }

    /// Builder-style numeric column
    #[must_use]
    pub fn with_number(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(name, RawValue::Number(value.into()));
        self
    }

    /// Builder-style timestamp column
    #[must_use]
    pub fn with_timestamp(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(name, RawValue::Timestamp(value.into()));
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: RawValue) {
        self.fields.insert(name.into(), value);
    }

    #[must_use]
    pub fn partition_key(&self) -> &str {
        &self.partition_key
    }

    #[must_use]
    pub fn row_key(&self) -> &str {
        &self.row_key
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&RawValue> {
        self.fields.get(name)
    }

    /// Non-key columns in name order
    pub fn fields(&self) -> impl Iterator<Item = (&str, &RawValue)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Keep only the named columns
    pub fn retain_columns(&mut self, columns: &[String]) {
        self.fields.retain(|name, _| columns.iter().any(|c| c == name));
    }
}
