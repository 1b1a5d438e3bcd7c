//! Frame overlay description
//!
//! Builds a renderer-agnostic list of what to draw on top of a frame: the
//! reference line, the classified eye line, the skeleton and keypoint markers.
//! Rendering itself belongs to the caller.

use serde::{Deserialize, Serialize};

use crate::config::PostureConfig;
use crate::pose::{Keypoint, Pose};
use crate::types::{Classification, LineSegment, Point2D, StrokeColor};

/// Wrist marker diameter in pixels
pub const WRIST_MARKER_DIAMETER: f64 = 32.0;
/// Diameter of the generic per-keypoint marker in pixels
pub const KEYPOINT_MARKER_DIAMETER: f64 = 16.0;

/// A line to stroke with a named color
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StyledLine {
    pub line: LineSegment,
    pub color: StrokeColor,
}

/// A filled circle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Marker {
    pub center: Point2D,
    pub diameter: f64,
    pub fill: StrokeColor,
}

/// Everything drawn for one frame, in back-to-front order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameOverlay {
    pub skeleton: Vec<StyledLine>,
    pub markers: Vec<Marker>,
    pub reference_line: StyledLine,
    pub eye_line: StyledLine,
}

/// Builds overlays for a fixed configuration
pub struct OverlayBuilder {
    nose_scale_factor: f64,
}

impl OverlayBuilder {
    pub fn new(config: &PostureConfig) -> Self {
        Self {
            nose_scale_factor: config.nose_scale_factor,
        }
    }

    pub fn build(
        &self,
        pose: &Pose,
        reference_line: &LineSegment,
        classification: &Classification,
    ) -> FrameOverlay {
        let skeleton = pose
            .skeleton_segments()
            .into_iter()
            .map(|line| StyledLine {
                line,
                color: StrokeColor::Gray,
            })
            .collect();

        FrameOverlay {
            skeleton,
            markers: self.markers(pose, &classification.display_line),
            reference_line: StyledLine {
                line: *reference_line,
                color: StrokeColor::Red,
            },
            eye_line: StyledLine {
                line: classification.display_line,
                color: classification.state.stroke_color(),
            },
        }
    }

    /// Nose marker diameter, proportional to the distance between the eyes
    pub fn nose_diameter(&self, eye_line: &LineSegment) -> f64 {
        eye_line.length() / self.nose_scale_factor
    }

    fn markers(&self, pose: &Pose, eye_line: &LineSegment) -> Vec<Marker> {
        let mut markers = Vec::new();

        if let Some(nose) = pose.get(Keypoint::Nose) {
            markers.push(Marker {
                center: nose,
                diameter: self.nose_diameter(eye_line),
                fill: StrokeColor::Red,
            });
        }

        for wrist in [Keypoint::RightWrist, Keypoint::LeftWrist] {
            if let Some(center) = pose.get(wrist) {
                markers.push(Marker {
                    center,
                    diameter: WRIST_MARKER_DIAMETER,
                    fill: StrokeColor::Blue,
                });
            }
        }

        // HashMap order is unstable, walk the fixed vocabulary instead
        for keypoint in Keypoint::ALL {
            if let Some(center) = pose.get(keypoint) {
                markers.push(Marker {
                    center,
                    diameter: KEYPOINT_MARKER_DIAMETER,
                    fill: StrokeColor::Green,
                });
            }
        }

        markers
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::PostureClassifier;
    use crate::types::PostureState;
    use std::collections::HashMap;

    fn sample_pose(eye_y: f64) -> Pose {
        let mut keypoints = HashMap::new();
        keypoints.insert(Keypoint::Nose, Point2D::new(320.0, eye_y + 30.0));
        keypoints.insert(Keypoint::LeftEye, Point2D::new(300.0, eye_y));
        keypoints.insert(Keypoint::RightEye, Point2D::new(340.0, eye_y));
        keypoints.insert(Keypoint::LeftWrist, Point2D::new(200.0, 470.0));
        keypoints.insert(Keypoint::LeftShoulder, Point2D::new(250.0, 350.0));
        keypoints.insert(Keypoint::RightShoulder, Point2D::new(390.0, 350.0));
        Pose::new(keypoints)
    }

    fn build(eye_y: f64) -> (FrameOverlay, Classification) {
        let config = PostureConfig::default();
        let classifier = PostureClassifier::new(&config).unwrap();
        let pose = sample_pose(eye_y);
        let classification = classifier.classify_pose(&pose).unwrap();
        let overlay = OverlayBuilder::new(&config).build(
            &pose,
            classifier.calibration().reference_line(),
            &classification,
        );
        (overlay, classification)
    }

    #[test]
    fn test_neutral_overlay() {
        let (overlay, classification) = build(200.0);
        assert_eq!(classification.state, PostureState::Neutral);
        assert_eq!(overlay.eye_line.color, StrokeColor::White);
        assert_eq!(overlay.reference_line.color, StrokeColor::Red);
        assert_eq!(overlay.reference_line.line.start.y, 240.0);
        assert_eq!(overlay.skeleton.len(), 1);
        assert_eq!(overlay.skeleton[0].color, StrokeColor::Gray);
    }

    #[test]
    fn test_slouched_overlay_is_red() {
        let (overlay, classification) = build(300.0);
        assert_eq!(classification.state, PostureState::SlouchedLow);
        assert_eq!(overlay.eye_line.color, StrokeColor::Red);
    }

    #[test]
    fn test_markers() {
        let (overlay, _) = build(200.0);

        // nose + one wrist + six keypoints
        assert_eq!(overlay.markers.len(), 8);

        let nose = overlay.markers[0];
        assert_eq!(nose.fill, StrokeColor::Red);
        assert!((nose.diameter - 40.0 / 2.5).abs() < 1e-9);

        assert_eq!(overlay.markers[1].diameter, WRIST_MARKER_DIAMETER);
        assert!(overlay.markers[2..]
            .iter()
            .all(|m| m.diameter == KEYPOINT_MARKER_DIAMETER));
    }
}
