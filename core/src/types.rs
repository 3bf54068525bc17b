//! Request and response schemas for the warehouse API.
//!
//! # Design
//! Stocks, task lists and progress rows are owned by the backend and
//! passed through as JSON records. Task detail is typed down to its jobs
//! because the client normalises each job's `done` flag. Request payloads
//! are typed and carry the backend's wire names via `serde(rename)`.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// A backend record passed through untransformed.
pub type Record = Map<String, Value>;

pub type Stock = Record;
pub type TaskSummary = Record;
pub type TaskProgress = Record;

/// Whatever `check_item` answered, success or not.
pub type CheckItemResult = Value;

/// Identity carried in the session token's `payload` claim.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    pub id: String,
    pub login: String,
    pub employee_name: String,
    /// Sent as `0`/`1` by the backend.
    #[serde(default, deserialize_with = "truthy")]
    pub can_login: bool,
}

/// Task detail as returned by the task/material route.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TaskDetail {
    #[serde(default)]
    pub jobs: Vec<Job>,
    #[serde(flatten)]
    pub extra: Record,
}

/// One weighing job inside a task.
///
/// Ids and weights are kept exactly as the backend sent them (numbers or
/// strings); only `done` is normalised.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Job {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub material_id: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tare_id: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rest_gross_weight: Option<Value>,
    #[serde(default, deserialize_with = "truthy")]
    pub done: bool,
    #[serde(flatten)]
    pub extra: Record,
}

/// Body of `PUT /job`, and one element of the bulk `POST /job` body.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JobStatusUpdate {
    #[serde(rename = "taskID")]
    pub task_id: i64,
    #[serde(rename = "materialID")]
    pub material_id: i64,
    #[serde(rename = "taraID")]
    pub tara_id: i64,
    #[serde(rename = "netWeightFact")]
    pub net_weight_fact: f64,
    #[serde(rename = "restGrossWeight")]
    pub rest_gross_weight: f64,
    #[serde(rename = "processingID")]
    pub processing_id: i64,
    pub done: bool,
}

/// Body of the bulk `POST /job`: a JSON array of single updates.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct JobsStatusUpdate(pub Vec<JobStatusUpdate>);

impl From<Vec<JobStatusUpdate>> for JobsStatusUpdate {
    fn from(updates: Vec<JobStatusUpdate>) -> Self {
        Self(updates)
    }
}

/// Body of `POST /check_item`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CheckItemRequest {
    #[serde(rename = "materialID")]
    pub material_id: i64,
    #[serde(rename = "taraID")]
    pub tara_id: i64,
    #[serde(rename = "taskID")]
    pub task_id: i64,
}

/// Body of `PUT /rest_gross_weight`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RestGrossWeightUpdate {
    #[serde(rename = "taskID")]
    pub task_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub material_id: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tare_id: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gross_weight: Option<Value>,
}

impl RestGrossWeightUpdate {
    pub fn from_job(task_id: i64, job: &Job) -> Self {
        Self {
            task_id,
            material_id: job.material_id.clone(),
            tare_id: job.tare_id.clone(),
            gross_weight: job.rest_gross_weight.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoginPayload {
    pub login: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChangePassword {
    pub login: String,
    pub old_password: String,
    pub new_password: String,
}

/// Loose boolean: `false`, `null`, `0`, `""` and NaN are false, anything
/// else is true. The strings `"0"` and `"false"` are therefore true.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn truthy<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().is_some_and(is_truthy))
}
