//! Insight payload encoding
//!
//! This module wraps an inference result and its input into a versioned JSON
//! payload carrying producer metadata, so downstream consumers can tell which
//! build and which service instance computed it.

use chrono::Utc;
use uuid::Uuid;

use crate::error::InsightError;
use crate::types::{FeatureRecord, InferenceResult, InsightPayload, InsightProducer};
use crate::{INSIGHTS_VERSION, PRODUCER_NAME};

/// Current payload schema version
pub const INSIGHT_SCHEMA_VERSION: &str = "1.0.0";

/// Encoder for producing insight payloads
#[derive(Debug, Clone)]
pub struct InsightEncoder {
    instance_id: String,
}

impl Default for InsightEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl InsightEncoder {
    /// Create a new encoder with a unique instance ID
    pub fn new() -> Self {
        Self {
            instance_id: Uuid::new_v4().to_string(),
        }
    }

    /// Create an encoder with a specific instance ID
    pub fn with_instance_id(instance_id: String) -> Self {
        Self { instance_id }
    }

    pub fn instance_id(&self) -> &str {
        &self.instance_id
    }

    /// Build the payload for one inference
    pub fn encode(&self, input: &FeatureRecord, result: &InferenceResult) -> InsightPayload {
        InsightPayload {
            insight_version: INSIGHT_SCHEMA_VERSION.to_string(),
            producer: InsightProducer {
                name: PRODUCER_NAME.to_string(),
                version: INSIGHTS_VERSION.to_string(),
                instance_id: self.instance_id.clone(),
            },
            computed_at_utc: Utc::now().to_rfc3339(),
            input: *input,
            band: result.band(),
            result: result.clone(),
        }
    }

    /// Encode to JSON string
    pub fn encode_to_json(
        &self,
        input: &FeatureRecord,
        result: &InferenceResult,
    ) -> Result<String, InsightError> {
        let payload = self.encode(input, result);
        serde_json::to_string(&payload).map_err(|e| InsightError::EncodingError(e.to_string()))
    }
}
