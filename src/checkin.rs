//! Daily check-ins
//!
//! A check-in pairs the day's feature record with the prediction made for it.
//! Persisting check-ins is the caller's job; this module only builds the
//! record and its JSON form.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::InsightError;
use crate::types::{FeatureRecord, InferenceResult};

/// User ID recorded when no one is signed in
pub const GUEST_USER_ID: &str = "guest";

/// One submitted daily check-in
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckIn {
    pub id: Uuid,
    pub user_id: String,
    /// Calendar day (UTC) the check-in belongs to
    pub date: NaiveDate,
    pub recorded_at: DateTime<Utc>,
    pub data: FeatureRecord,
    pub prediction: InferenceResult,
}

impl CheckIn {
    /// Build a check-in stamped with the current time
    pub fn new(user_id: Option<&str>, data: FeatureRecord, prediction: InferenceResult) -> Self {
        Self::recorded_at(user_id, data, prediction, Utc::now())
    }

    /// Build a check-in stamped with an explicit time
    pub fn recorded_at(
        user_id: Option<&str>,
        data: FeatureRecord,
        prediction: InferenceResult,
        recorded_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: user_id.unwrap_or(GUEST_USER_ID).to_string(),
            date: recorded_at.date_naive(),
            recorded_at,
            data,
            prediction,
        }
    }

    pub fn to_json(&self) -> Result<String, InsightError> {
        serde_json::to_string(self).map_err(|e| InsightError::EncodingError(e.to_string()))
    }

    pub fn from_json(json: &str) -> Result<Self, InsightError> {
        Ok(serde_json::from_str(json)?)
    }
}
