use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::pkg::internal::store::{StoreError, StoreResult};

pub const INVALID_BODY: &str = "Invalid request body";
pub const MISSING_ROWS: &str = "Request body must contain a \"rows\" array";

/// Typed view of a single tracked application.
///
/// Rows are stored as raw JSON so that records which do not fit this shape
/// survive a round trip untouched; this type is only used to inspect them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobRecord {
    pub location: String,
    pub website: String,
    pub website_to_jobs: String,
    pub has_job: bool,
    pub name: Option<String>,
    pub salary: Option<String>,
    pub home_office_option: Option<bool>,
    pub period: Option<String>,
    pub employment_type: Option<String>,
    pub application_date: Option<String>,
    pub comments: Option<String>,
    pub found_on: Option<String>,
    pub occupy_start: Option<String>,
}

impl TryFrom<&Value> for JobRecord {
    type Error = serde_json::Error;

    fn try_from(value: &Value) -> Result<Self, Self::Error> {
        JobRecord::deserialize(value)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobCollection {
    pub rows: Vec<Value>,
}

impl JobCollection {
    /// Checks the root shape of a candidate and keeps only its `rows`.
    /// A bare array counts as an object without `rows`.
    pub fn from_value(candidate: Value) -> StoreResult<Self> {
        let mut root = match candidate {
            Value::Object(root) => root,
            Value::Array(_) => return Err(StoreError::MalformedInput(MISSING_ROWS.into())),
            _ => return Err(StoreError::MalformedInput(INVALID_BODY.into())),
        };
        let rows = match root.remove("rows") {
            Some(Value::Array(rows)) => rows,
            _ => return Err(StoreError::MalformedInput(MISSING_ROWS.into())),
        };
        if !root.is_empty() {
            let ignored: Vec<&String> = root.keys().collect();
            tracing::debug!("ignoring unknown root keys: {:?}", &ignored);
        }
        Ok(JobCollection { rows })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn records(&self) -> impl Iterator<Item = Option<JobRecord>> + '_ {
        self.rows.iter().map(|row| JobRecord::try_from(row).ok())
    }

    /// Rows that do not fit [`JobRecord`]; they are still accepted.
    pub fn nonconforming(&self) -> usize {
        self.records().filter(Option::is_none).count()
    }
}
