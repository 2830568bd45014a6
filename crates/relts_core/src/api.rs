use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{Location, Metadata, NameFilter, Parameter, Scalar, Snapshot, TsResult};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UpsertLocationInput {
    pub name: String,
    #[serde(default)]
    pub details: Metadata,
}

impl UpsertLocationInput {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            details: Metadata::new(),
        }
    }

    pub fn with_details(mut self, details: Metadata) -> Self {
        self.details = details;
        self
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UpsertParameterInput {
    pub name: String,
    pub unit: Option<String>,
    #[serde(default)]
    pub details: Metadata,
}

impl UpsertParameterInput {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            unit: None,
            details: Metadata::new(),
        }
    }

    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    pub fn with_details(mut self, details: Metadata) -> Self {
        self.details = details;
        self
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InsertValueInput {
    pub location: String,
    pub parameter: String,
    pub timestamp: i64,
    pub value: Scalar,
    /// Report unknown names as `Ok(false)` instead of `NotFound`.
    #[serde(default)]
    pub fail_silently: bool,
}

impl InsertValueInput {
    pub fn new(
        location: impl Into<String>,
        parameter: impl Into<String>,
        timestamp: i64,
        value: impl Into<Scalar>,
    ) -> Self {
        Self {
            location: location.into(),
            parameter: parameter.into(),
            timestamp,
            value: value.into(),
            fail_silently: false,
        }
    }

    pub fn fail_silently(mut self) -> Self {
        self.fail_silently = true;
        self
    }
}

/// Bounds are inclusive; a missing bound leaves that side open.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RangeQuery {
    pub start: Option<i64>,
    pub end: Option<i64>,
    #[serde(default)]
    pub locations: NameFilter,
    #[serde(default)]
    pub parameters: NameFilter,
    #[serde(default = "lenient")]
    pub fail_silently: bool,
}

impl Default for RangeQuery {
    fn default() -> Self {
        Self {
            start: None,
            end: None,
            locations: NameFilter::All,
            parameters: NameFilter::All,
            fail_silently: true,
        }
    }
}

impl RangeQuery {
    pub fn between(start: Option<i64>, end: Option<i64>) -> Self {
        Self {
            start,
            end,
            ..Self::default()
        }
    }

    pub fn locations(mut self, filter: impl Into<NameFilter>) -> Self {
        self.locations = filter.into();
        self
    }

    pub fn parameters(mut self, filter: impl Into<NameFilter>) -> Self {
        self.parameters = filter.into();
        self
    }

    pub fn strict(mut self) -> Self {
        self.fail_silently = false;
        self
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LatestQuery {
    #[serde(default)]
    pub locations: NameFilter,
    #[serde(default)]
    pub parameters: NameFilter,
    #[serde(default = "lenient")]
    pub fail_silently: bool,
    /// Drops entries whose timestamp is below this value.
    pub min_timestamp: Option<i64>,
}

impl Default for LatestQuery {
    fn default() -> Self {
        Self {
            locations: NameFilter::All,
            parameters: NameFilter::All,
            fail_silently: true,
            min_timestamp: None,
        }
    }
}

impl LatestQuery {
    pub fn locations(mut self, filter: impl Into<NameFilter>) -> Self {
        self.locations = filter.into();
        self
    }

    pub fn parameters(mut self, filter: impl Into<NameFilter>) -> Self {
        self.parameters = filter.into();
        self
    }

    pub fn since(mut self, min_timestamp: i64) -> Self {
        self.min_timestamp = Some(min_timestamp);
        self
    }

    pub fn strict(mut self) -> Self {
        self.fail_silently = false;
        self
    }
}

fn lenient() -> bool {
    true
}

/// One fact joined with its dictionary names.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ValueRow {
    pub timestamp: i64,
    #[serde(rename = "loc")]
    pub location: String,
    #[serde(rename = "par")]
    pub parameter: String,
    #[serde(rename = "val")]
    pub value: Scalar,
}

impl ValueRow {
    pub fn new(
        timestamp: i64,
        location: impl Into<String>,
        parameter: impl Into<String>,
        value: impl Into<Scalar>,
    ) -> Self {
        Self {
            timestamp,
            location: location.into(),
            parameter: parameter.into(),
            value: value.into(),
        }
    }
}

#[async_trait]
pub trait DictionaryApi {
    async fn upsert_location(&self, input: UpsertLocationInput) -> TsResult<()>;
    async fn upsert_parameter(&self, input: UpsertParameterInput) -> TsResult<()>;
    async fn locations(&self) -> TsResult<Arc<Snapshot<Location>>>;
    async fn parameters(&self) -> TsResult<Arc<Snapshot<Parameter>>>;
    async fn resolve_location(&self, name: &str) -> TsResult<Location>;
    async fn resolve_parameter(&self, name: &str) -> TsResult<Parameter>;
}

#[async_trait]
pub trait ValueWriteApi {
    /// Returns `Ok(false)` only for unknown names under `fail_silently`.
    async fn insert_value(&self, input: InsertValueInput) -> TsResult<bool>;
    /// Removes facts strictly older than `timestamp` and returns how many went.
    /// The latest-value index is left untouched.
    async fn delete_values_older_than(&self, timestamp: i64) -> TsResult<u64>;
}

#[async_trait]
pub trait ValueQueryApi {
    async fn range(&self, query: RangeQuery) -> TsResult<Vec<ValueRow>>;
    async fn latest(&self, query: LatestQuery) -> TsResult<Vec<ValueRow>>;
}
