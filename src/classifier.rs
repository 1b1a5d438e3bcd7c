//! Posture classification
//!
//! Classifies a frame from the two eye keypoints:
//! 1. Build the eye line `(right_eye, left_eye)`
//! 2. Measure its orientation against the reference line
//! 3. Apply the symmetric, inclusive dead-band threshold
//! 4. Override with `SlouchedLow` when both eyes drop below the reference
//!
//! Every frame is classified independently; there is no smoothing.

use log::{debug, info};

use crate::calibration::{Calibration, KeepCalibration, RecalibrationPolicy};
use crate::config::PostureConfig;
use crate::error::PostureError;
use crate::geometry::angle_between;
use crate::pose::Pose;
use crate::types::{Classification, LineSegment, Point2D, PostureState};

/// Per-frame posture classifier holding the active calibration
pub struct PostureClassifier {
    calibration: Calibration,
    angle_multiplier: f64,
    policy: Box<dyn RecalibrationPolicy>,
}

impl PostureClassifier {
    /// Create a classifier calibrated from configuration, using the
    /// [`KeepCalibration`] recalibration policy
    pub fn new(config: &PostureConfig) -> Result<Self, PostureError> {
        config.validate()?;
        Self::with_calibration(Calibration::from_config(config)?, config.angle_multiplier)
    }

    /// Create a classifier from an explicit calibration. `angle_multiplier`
    /// must be finite and positive.
    pub fn with_calibration(
        calibration: Calibration,
        angle_multiplier: f64,
    ) -> Result<Self, PostureError> {
        if !angle_multiplier.is_finite() || angle_multiplier <= 0.0 {
            return Err(PostureError::InvalidConfig(format!(
                "angle_multiplier must be a positive number, got {angle_multiplier}"
            )));
        }
        Ok(Self {
            calibration,
            angle_multiplier,
            policy: Box::new(KeepCalibration),
        })
    }

    /// Replace the recalibration policy
    pub fn with_policy(mut self, policy: Box<dyn RecalibrationPolicy>) -> Self {
        self.policy = policy;
        self
    }

    pub fn calibration(&self) -> &Calibration {
        &self.calibration
    }

    pub fn policy_name(&self) -> &'static str {
        self.policy.name()
    }

    /// Classify a frame from both eye positions
    pub fn classify(
        &self,
        left_eye: Point2D,
        right_eye: Point2D,
    ) -> Result<Classification, PostureError> {
        if !left_eye.is_finite() || !right_eye.is_finite() {
            return Err(PostureError::InvalidInput(format!(
                "eye coordinates must be finite (left={left_eye:?}, right={right_eye:?})"
            )));
        }

        let eye_line = LineSegment::new(right_eye, left_eye);
        let angle = self.orientation_angle(&eye_line);
        let lateral = self.lateral_state(angle);
        let vertical_ok = self.vertical_ok(left_eye, right_eye);

        let state = if vertical_ok {
            lateral
        } else {
            PostureState::SlouchedLow
        };

        debug!(
            "classified frame: angle={angle:.2} lateral={} vertical_ok={vertical_ok} state={}",
            lateral.as_str(),
            state.as_str()
        );

        Ok(Classification {
            state,
            display_line: eye_line,
            angle,
            vertical_ok,
        })
    }

    /// Classify from optional eye positions, failing when either is absent
    pub fn classify_eyes(
        &self,
        left_eye: Option<Point2D>,
        right_eye: Option<Point2D>,
    ) -> Result<Classification, PostureError> {
        match (left_eye, right_eye) {
            (Some(left), Some(right)) => self.classify(left, right),
            (None, _) => Err(PostureError::InvalidInput("left eye is missing".to_string())),
            (_, None) => Err(PostureError::InvalidInput("right eye is missing".to_string())),
        }
    }

    /// Classify a detected pose using its eye keypoints
    pub fn classify_pose(&self, pose: &Pose) -> Result<Classification, PostureError> {
        let (left_eye, right_eye) = pose.eyes()?;
        self.classify(left_eye, right_eye)
    }

    /// Scaled orientation of the eye line relative to the reference line.
    ///
    /// The eye line is measured in the reference line's winding, so a level
    /// pair of eyes reads as 0 whether or not the feed is mirrored.
    pub fn orientation_angle(&self, eye_line: &LineSegment) -> f64 {
        let reference = self.calibration.reference_line();
        let measured = aligned_with(eye_line, reference);
        angle_between(&measured, reference, self.angle_multiplier)
    }

    /// Dead-band classification of a scaled angle. Both bounds are inclusive.
    pub fn lateral_state(&self, angle: f64) -> PostureState {
        let threshold = self.calibration.threshold_degrees();
        if angle >= threshold {
            PostureState::TiltForward
        } else if angle <= -threshold {
            PostureState::TiltBackward
        } else {
            PostureState::Neutral
        }
    }

    /// True when at least one eye is at or above the reference height
    pub fn vertical_ok(&self, left_eye: Point2D, right_eye: Point2D) -> bool {
        let reference = self.calibration.reference_line();
        left_eye.y <= reference.start.y || right_eye.y <= reference.end.y
    }

    /// Replace the calibration using the configured policy
    pub fn recalibrate(&mut self, eye_line: &LineSegment) -> Result<Calibration, PostureError> {
        let next = self.policy.recalibrate(&self.calibration, eye_line)?;
        info!(
            "recalibrated with policy '{}': reference_y={:.1} threshold={}",
            self.policy.name(),
            next.reference_line().mid_y(),
            next.threshold_degrees()
        );
        self.calibration = next;
        Ok(next)
    }
}

/// `line` with its endpoints swapped if it points against `reference`
fn aligned_with(line: &LineSegment, reference: &LineSegment) -> LineSegment {
    let dot = (line.start.x - line.end.x) * (reference.start.x - reference.end.x)
        + (line.start.y - line.end.y) * (reference.start.y - reference.end.y);
    if dot < 0.0 {
        LineSegment::new(line.end, line.start)
    } else {
        *line
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calibration::LevelAtEyeHeight;
    use crate::pose::Keypoint;
    use std::collections::HashMap;

    fn classifier() -> PostureClassifier {
        PostureClassifier::new(&PostureConfig::default()).unwrap()
    }

    fn p(x: f64, y: f64) -> Point2D {
        Point2D::new(x, y)
    }

    #[test]
    fn test_level_eyes_above_midline_are_neutral() {
        let result = classifier().classify(p(300.0, 200.0), p(340.0, 200.0)).unwrap();
        assert_eq!(result.state, PostureState::Neutral);
        assert!(result.angle.abs() < 1e-9);
        assert!(result.vertical_ok);
    }

    #[test]
    fn test_unmirrored_level_eyes_are_neutral() {
        let result = classifier().classify(p(340.0, 200.0), p(300.0, 200.0)).unwrap();
        assert_eq!(result.state, PostureState::Neutral);
        assert!(result.angle.abs() < 1e-9);
    }

    #[test]
    fn test_level_eyes_below_midline_are_slouched() {
        let result = classifier().classify(p(300.0, 260.0), p(340.0, 260.0)).unwrap();
        assert_eq!(result.state, PostureState::SlouchedLow);
        assert!(result.angle.abs() < 1e-9);
        assert!(!result.vertical_ok);
    }

    #[test]
    fn test_eyes_on_midline_pass_vertical_check() {
        let result = classifier().classify(p(300.0, 240.0), p(340.0, 240.0)).unwrap();
        assert_eq!(result.state, PostureState::Neutral);
    }

    #[test]
    fn test_tilt_forward() {
        // atan(10 / 40) is about 14 degrees, scaled to about 24.5
        let result = classifier().classify(p(300.0, 190.0), p(340.0, 200.0)).unwrap();
        assert!(result.angle >= 20.0, "angle = {}", result.angle);
        assert_eq!(result.state, PostureState::TiltForward);
    }

    #[test]
    fn test_tilt_backward() {
        let result = classifier().classify(p(300.0, 200.0), p(340.0, 190.0)).unwrap();
        assert!(result.angle <= -20.0, "angle = {}", result.angle);
        assert_eq!(result.state, PostureState::TiltBackward);
    }

    #[test]
    fn test_small_tilt_is_neutral() {
        // about 10 degrees of raw tilt stays inside the dead-band
        let result = classifier().classify(p(300.0, 193.0), p(340.0, 200.0)).unwrap();
        assert!(result.angle > 0.0 && result.angle < 20.0);
        assert_eq!(result.state, PostureState::Neutral);
    }

    #[test]
    fn test_threshold_bounds_are_inclusive() {
        let c = classifier();
        assert_eq!(c.lateral_state(20.0), PostureState::TiltForward);
        assert_eq!(c.lateral_state(-20.0), PostureState::TiltBackward);
        assert_eq!(c.lateral_state(20.0 - 1e-9), PostureState::Neutral);
        assert_eq!(c.lateral_state(-20.0 + 1e-9), PostureState::Neutral);
        assert_eq!(c.lateral_state(0.0), PostureState::Neutral);
    }

    #[test]
    fn test_one_eye_above_keeps_lateral_state() {
        let result = classifier().classify(p(300.0, 230.0), p(340.0, 250.0)).unwrap();
        assert!(result.vertical_ok);
        assert_eq!(result.state, PostureState::TiltForward);
    }

    #[test]
    fn test_slouch_overrides_tilt() {
        let result = classifier().classify(p(300.0, 250.0), p(340.0, 300.0)).unwrap();
        assert!(result.angle.abs() >= 20.0);
        assert_eq!(result.state, PostureState::SlouchedLow);
    }

    #[test]
    fn test_display_line_is_right_to_left() {
        let left = p(300.0, 190.0);
        let right = p(340.0, 200.0);
        let result = classifier().classify(left, right).unwrap();
        assert_eq!(result.display_line, LineSegment::new(right, left));
    }

    #[test]
    fn test_non_finite_input_is_rejected() {
        let result = classifier().classify(p(f64::NAN, 200.0), p(340.0, 200.0));
        assert!(matches!(result, Err(PostureError::InvalidInput(_))));

        let result = classifier().classify(p(300.0, 200.0), p(340.0, f64::INFINITY));
        assert!(matches!(result, Err(PostureError::InvalidInput(_))));
    }

    #[test]
    fn test_missing_eye_is_rejected() {
        let c = classifier();
        assert!(matches!(
            c.classify_eyes(None, Some(p(340.0, 200.0))),
            Err(PostureError::InvalidInput(_))
        ));
        assert!(matches!(
            c.classify_eyes(Some(p(300.0, 200.0)), None),
            Err(PostureError::InvalidInput(_))
        ));
        assert!(c.classify_eyes(Some(p(300.0, 200.0)), Some(p(340.0, 200.0))).is_ok());
    }

    #[test]
    fn test_classify_pose() {
        let mut keypoints = HashMap::new();
        keypoints.insert(Keypoint::LeftEye, p(300.0, 260.0));
        keypoints.insert(Keypoint::RightEye, p(340.0, 260.0));
        let pose = Pose::new(keypoints);

        let result = classifier().classify_pose(&pose).unwrap();
        assert_eq!(result.state, PostureState::SlouchedLow);

        assert!(classifier().classify_pose(&Pose::default()).is_err());
    }

    #[test]
    fn test_classification_is_repeatable() {
        let c = classifier();
        let first = c.classify(p(300.0, 190.0), p(340.0, 200.0)).unwrap();
        let second = c.classify(p(300.0, 190.0), p(340.0, 200.0)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_default_recalibration_keeps_calibration() {
        // what recalibration should change is currently unspecified
        let mut c = classifier();
        let before = *c.calibration();
        let eye_line = LineSegment::new(p(340.0, 300.0), p(300.0, 300.0));
        c.recalibrate(&eye_line).unwrap();
        assert_eq!(*c.calibration(), before);
        assert_eq!(c.policy_name(), "keep");
    }

    #[test]
    fn test_level_policy_moves_reference() {
        let mut c = classifier().with_policy(Box::new(LevelAtEyeHeight));
        let (left, right) = (p(300.0, 300.0), p(340.0, 300.0));
        assert_eq!(c.classify(left, right).unwrap().state, PostureState::SlouchedLow);

        c.recalibrate(&LineSegment::new(right, left)).unwrap();
        assert_eq!(c.calibration().reference_line().start.y, 300.0);
        assert_eq!(c.classify(left, right).unwrap().state, PostureState::Neutral);
    }

    #[test]
    fn test_coincident_eyes_do_not_fail() {
        let eye = p(320.0, 200.0);
        let result = classifier().classify(eye, eye).unwrap();
        assert!(result.angle.is_finite());
        assert_eq!(result.display_line.length(), 0.0);
    }

    #[test]
    fn test_with_calibration_rejects_bad_multiplier() {
        let calibration = *classifier().calibration();
        for multiplier in [f64::NAN, f64::INFINITY, 0.0, -100.0] {
            assert!(matches!(
                PostureClassifier::with_calibration(calibration, multiplier),
                Err(PostureError::InvalidConfig(_))
            ));
        }

        let c = PostureClassifier::with_calibration(calibration, 100.0).unwrap();
        let result = c.classify(p(300.0, 190.0), p(340.0, 200.0)).unwrap();
        assert_eq!(result.state, PostureState::TiltForward);
    }

    #[test]
    fn test_custom_threshold() {
        let config = PostureConfig {
            threshold_degrees: 30.0,
            ..Default::default()
        };
        let c = PostureClassifier::new(&config).unwrap();
        // about 24.5 scaled, under the wider band
        let result = c.classify(p(300.0, 190.0), p(340.0, 200.0)).unwrap();
        assert_eq!(result.state, PostureState::Neutral);
    }
}
