//! Runtime configuration
//!
//! Frame geometry, thresholds and alert resources are injected through
//! [`PostureConfig`] rather than compiled in. Defaults match a 640x480 webcam
//! feed with a 20 unit dead-band.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::PostureError;
use crate::geometry::DEFAULT_ANGLE_MULTIPLIER;
use crate::types::LineSegment;

pub const DEFAULT_FRAME_WIDTH: f64 = 640.0;
pub const DEFAULT_FRAME_HEIGHT: f64 = 480.0;
pub const DEFAULT_NOSE_SCALE_FACTOR: f64 = 2.5;
pub const DEFAULT_THRESHOLD_DEGREES: f64 = 20.0;
pub const DEFAULT_AUDIO_RESOURCE: &str = "alarm_sound.wav";

/// Configuration shared by the classifier, overlay builder and alerter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PostureConfig {
    /// Frame width in pixels
    pub frame_width: f64,
    /// Frame height in pixels
    pub frame_height: f64,
    /// Eye distance is divided by this to size the nose marker
    pub nose_scale_factor: f64,
    /// Half-width of the neutral dead-band, in scaled angle units
    pub threshold_degrees: f64,
    /// Multiplier applied to the raw angle in radians
    pub angle_multiplier: f64,
    /// Audio resource played on alert
    pub audio_resource: String,
}

impl Default for PostureConfig {
    fn default() -> Self {
        Self {
            frame_width: DEFAULT_FRAME_WIDTH,
            frame_height: DEFAULT_FRAME_HEIGHT,
            nose_scale_factor: DEFAULT_NOSE_SCALE_FACTOR,
            threshold_degrees: DEFAULT_THRESHOLD_DEGREES,
            angle_multiplier: DEFAULT_ANGLE_MULTIPLIER,
            audio_resource: DEFAULT_AUDIO_RESOURCE.to_string(),
        }
    }
}

impl PostureConfig {
    /// Parse and validate a JSON configuration. Missing fields take defaults.
    pub fn from_json(json: &str) -> Result<Self, PostureError> {
        let config: PostureConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON configuration file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, PostureError> {
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn to_json_pretty(&self) -> Result<String, PostureError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), PostureError> {
        let positive = [
            ("frame_width", self.frame_width),
            ("frame_height", self.frame_height),
            ("nose_scale_factor", self.nose_scale_factor),
            ("threshold_degrees", self.threshold_degrees),
            ("angle_multiplier", self.angle_multiplier),
        ];
        for (name, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(PostureError::InvalidConfig(format!(
                    "{name} must be a positive number, got {value}"
                )));
            }
        }

        if self.audio_resource.trim().is_empty() {
            return Err(PostureError::InvalidConfig(
                "audio_resource must not be empty".to_string(),
            ));
        }

        Ok(())
    }

    /// Horizontal line across the full frame width at half the frame height
    pub fn reference_line(&self) -> LineSegment {
        LineSegment::horizontal(self.frame_height / 2.0, self.frame_width)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Point2D;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults() {
        let config = PostureConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.threshold_degrees, 20.0);
        assert_eq!(config.audio_resource, "alarm_sound.wav");
        assert_eq!(
            config.reference_line(),
            LineSegment::new(Point2D::new(0.0, 240.0), Point2D::new(640.0, 240.0))
        );
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = PostureConfig::from_json(r#"{"frame_width": 1280, "frame_height": 720}"#).unwrap();
        assert_eq!(config.frame_width, 1280.0);
        assert_eq!(config.threshold_degrees, DEFAULT_THRESHOLD_DEGREES);
        assert_eq!(config.reference_line().start.y, 360.0);
    }

    #[test]
    fn test_rejects_non_positive_threshold() {
        let result = PostureConfig::from_json(r#"{"threshold_degrees": 0}"#);
        assert!(matches!(result, Err(PostureError::InvalidConfig(_))));

        let result = PostureConfig::from_json(r#"{"threshold_degrees": -5.0}"#);
        assert!(matches!(result, Err(PostureError::InvalidConfig(_))));
    }

    #[test]
    fn test_rejects_empty_audio_resource() {
        let config = PostureConfig {
            audio_resource: "  ".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_json() {
        let result = PostureConfig::from_json("not json");
        assert!(matches!(result, Err(PostureError::JsonError(_))));
    }

    #[test]
    fn test_json_roundtrip() {
        let config = PostureConfig {
            threshold_degrees: 12.5,
            ..Default::default()
        };
        let json = config.to_json_pretty().unwrap();
        assert_eq!(PostureConfig::from_json(&json).unwrap(), config);
    }
}
