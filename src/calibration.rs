//! Calibration and recalibration policies
//!
//! A [`Calibration`] pairs the horizontal reference line with the half-width of
//! the neutral dead-band. It is built once from configuration and replaced only
//! through a [`RecalibrationPolicy`].

use serde::{Deserialize, Serialize};

use crate::config::PostureConfig;
use crate::error::PostureError;
use crate::types::LineSegment;

/// Reference line and dead-band threshold
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "CalibrationFields")]
pub struct Calibration {
    reference_line: LineSegment,
    threshold_degrees: f64,
}

/// Unchecked wire form; deserialization goes through [`Calibration::new`]
#[derive(Deserialize)]
struct CalibrationFields {
    reference_line: LineSegment,
    threshold_degrees: f64,
}

impl TryFrom<CalibrationFields> for Calibration {
    type Error = PostureError;

    fn try_from(fields: CalibrationFields) -> Result<Self, Self::Error> {
        Calibration::new(fields.reference_line, fields.threshold_degrees)
    }
}

impl Calibration {
    /// Create a calibration. `threshold_degrees` must be finite and positive.
    pub fn new(reference_line: LineSegment, threshold_degrees: f64) -> Result<Self, PostureError> {
        if !threshold_degrees.is_finite() || threshold_degrees <= 0.0 {
            return Err(PostureError::InvalidCalibration(format!(
                "threshold must be positive, got {threshold_degrees}"
            )));
        }
        if !reference_line.start.is_finite() || !reference_line.end.is_finite() {
            return Err(PostureError::InvalidCalibration(
                "reference line has non-finite coordinates".to_string(),
            ));
        }
        Ok(Self {
            reference_line,
            threshold_degrees,
        })
    }

    /// Reference line at the vertical midline of the configured frame
    pub fn from_config(config: &PostureConfig) -> Result<Self, PostureError> {
        Self::new(config.reference_line(), config.threshold_degrees)
    }

    pub fn reference_line(&self) -> &LineSegment {
        &self.reference_line
    }

    pub fn threshold_degrees(&self) -> f64 {
        self.threshold_degrees
    }
}

/// Computes a new calibration from the user's current eye line.
///
/// Bound to a user action (e.g. a key press) by the caller.
pub trait RecalibrationPolicy {
    /// Short identifier used in logs and reports
    fn name(&self) -> &'static str;

    fn recalibrate(
        &self,
        current: &Calibration,
        eye_line: &LineSegment,
    ) -> Result<Calibration, PostureError>;
}

/// Leaves the calibration untouched.
///
/// Whether recalibration should move the reference line, the threshold or
/// both is currently unspecified, so this is the default.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeepCalibration;

impl RecalibrationPolicy for KeepCalibration {
    fn name(&self) -> &'static str {
        "keep"
    }

    fn recalibrate(
        &self,
        current: &Calibration,
        _eye_line: &LineSegment,
    ) -> Result<Calibration, PostureError> {
        Ok(*current)
    }
}

/// Moves the reference line to the mean height of the eyes, keeping its
/// horizontal extent and the threshold.
#[derive(Debug, Clone, Copy, Default)]
pub struct LevelAtEyeHeight;

impl RecalibrationPolicy for LevelAtEyeHeight {
    fn name(&self) -> &'static str {
        "level_at_eye_height"
    }

    fn recalibrate(
        &self,
        current: &Calibration,
        eye_line: &LineSegment,
    ) -> Result<Calibration, PostureError> {
        if !eye_line.start.is_finite() || !eye_line.end.is_finite() {
            return Err(PostureError::InvalidInput(
                "eye line has non-finite coordinates".to_string(),
            ));
        }

        let y = eye_line.mid_y();
        let mut reference = current.reference_line;
        reference.start.y = y;
        reference.end.y = y;

        Calibration::new(reference, current.threshold_degrees)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Point2D;

    fn eye_line() -> LineSegment {
        LineSegment::new(Point2D::new(340.0, 190.0), Point2D::new(300.0, 210.0))
    }

    #[test]
    fn test_threshold_must_be_positive() {
        let reference = LineSegment::horizontal(240.0, 640.0);
        assert!(Calibration::new(reference, 20.0).is_ok());
        assert!(matches!(
            Calibration::new(reference, 0.0),
            Err(PostureError::InvalidCalibration(_))
        ));
        assert!(Calibration::new(reference, -1.0).is_err());
        assert!(Calibration::new(reference, f64::NAN).is_err());
    }

    #[test]
    fn test_deserialize_enforces_threshold() {
        let json = r#"{
            "reference_line": { "start": { "x": 0.0, "y": 240.0 }, "end": { "x": 640.0, "y": 240.0 } },
            "threshold_degrees": -5.0
        }"#;
        assert!(serde_json::from_str::<Calibration>(json).is_err());

        let valid = Calibration::from_config(&PostureConfig::default()).unwrap();
        let roundtrip: Calibration =
            serde_json::from_str(&serde_json::to_string(&valid).unwrap()).unwrap();
        assert_eq!(roundtrip, valid);
    }

    #[test]
    fn test_from_config() {
        let calibration = Calibration::from_config(&PostureConfig::default()).unwrap();
        assert_eq!(calibration.reference_line().start, Point2D::new(0.0, 240.0));
        assert_eq!(calibration.reference_line().end, Point2D::new(640.0, 240.0));
        assert_eq!(calibration.threshold_degrees(), 20.0);
    }

    #[test]
    fn test_keep_policy_is_identity() {
        // recalibration semantics are currently unspecified; the default keeps state
        let current = Calibration::from_config(&PostureConfig::default()).unwrap();
        let next = KeepCalibration.recalibrate(&current, &eye_line()).unwrap();
        assert_eq!(next, current);
    }

    #[test]
    fn test_level_at_eye_height() {
        let current = Calibration::from_config(&PostureConfig::default()).unwrap();
        let next = LevelAtEyeHeight.recalibrate(&current, &eye_line()).unwrap();

        assert_eq!(next.reference_line().start, Point2D::new(0.0, 200.0));
        assert_eq!(next.reference_line().end, Point2D::new(640.0, 200.0));
        assert_eq!(next.threshold_degrees(), current.threshold_degrees());
    }

    #[test]
    fn test_level_rejects_non_finite_eyes() {
        let current = Calibration::from_config(&PostureConfig::default()).unwrap();
        let bad = LineSegment::new(Point2D::new(f64::NAN, 1.0), Point2D::new(2.0, 3.0));
        assert!(matches!(
            LevelAtEyeHeight.recalibrate(&current, &bad),
            Err(PostureError::InvalidInput(_))
        ));
    }
}
