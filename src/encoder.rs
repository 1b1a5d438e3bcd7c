//! Report encoding
//!
//! Encodes per-frame classifications into JSON reports carrying producer
//! metadata so downstream consumers can tell which instance produced them.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::PostureError;
use crate::overlay::FrameOverlay;
use crate::types::{Classification, LineSegment, PostureState, StrokeColor};
use crate::{PRODUCER_NAME, VERSION};

/// Producer metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Producer {
    pub name: String,
    pub version: String,
    pub instance_id: String,
}

/// Classification report for a single frame
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostureReport {
    pub producer: Producer,
    pub computed_at_utc: String,
    pub frame: u64,
    pub state: PostureState,
    pub angle: f64,
    pub threshold: f64,
    pub vertical_ok: bool,
    pub eye_line: LineSegment,
    pub stroke: StrokeColor,
    /// Whether this frame triggered an audio alert
    pub alert: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overlay: Option<FrameOverlay>,
}

/// Encoder for producing report payloads
pub struct ReportEncoder {
    instance_id: String,
}

impl Default for ReportEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportEncoder {
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

    pub fn encode(
        &self,
        frame: u64,
        classification: &Classification,
        threshold: f64,
        alert: bool,
        overlay: Option<FrameOverlay>,
    ) -> PostureReport {
        PostureReport {
            producer: Producer {
                name: PRODUCER_NAME.to_string(),
                version: VERSION.to_string(),
                instance_id: self.instance_id.clone(),
            },
            computed_at_utc: Utc::now().to_rfc3339(),
            frame,
            state: classification.state,
            angle: classification.angle,
            threshold,
            vertical_ok: classification.vertical_ok,
            eye_line: classification.display_line,
            stroke: classification.state.stroke_color(),
            alert,
            overlay,
        }
    }

    pub fn to_json(&self, report: &PostureReport) -> Result<String, PostureError> {
        serde_json::to_string(report).map_err(|e| PostureError::EncodingError(e.to_string()))
    }
}
