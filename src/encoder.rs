//! Summary encoding
//!
//! Wraps a weekly report with producer metadata for clients. The payload is
//! fully determined by the report, the child, `computed_at` and the encoder's
//! instance ID.

use crate::error::AnalyticsError;
use crate::types::{SummaryPayload, SummaryProducer, WeeklySummaryReport};
use crate::{ENGINE_VERSION, PRODUCER_NAME};
use chrono::{DateTime, SecondsFormat, Utc};
use uuid::Uuid;

/// Current summary payload schema
pub const SCHEMA_VERSION: &str = "carelog.weekly_summary.v1";

/// Encoder for weekly summary payloads
#[derive(Debug, Clone)]
pub struct SummaryEncoder {
    instance_id: String,
}

impl Default for SummaryEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl SummaryEncoder {
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

    /// Wrap a report in a payload
    pub fn encode(
        &self,
        child_id: &str,
        computed_at: DateTime<Utc>,
        report: &WeeklySummaryReport,
    ) -> SummaryPayload {
        SummaryPayload {
            schema_version: SCHEMA_VERSION.to_string(),
            producer: SummaryProducer {
                name: PRODUCER_NAME.to_string(),
                version: ENGINE_VERSION.to_string(),
                instance_id: self.instance_id.clone(),
            },
            child_id: child_id.to_string(),
            computed_at_utc: computed_at.to_rfc3339_opts(SecondsFormat::Secs, true),
            summary: report.clone(),
        }
    }

    /// Encode to JSON string
    pub fn encode_to_json(
        &self,
        child_id: &str,
        computed_at: DateTime<Utc>,
        report: &WeeklySummaryReport,
    ) -> Result<String, AnalyticsError> {
        let payload = self.encode(child_id, computed_at, report);
        serde_json::to_string_pretty(&payload)
            .map_err(|e| AnalyticsError::EncodingError(e.to_string()))
    }
}
