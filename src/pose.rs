//! Pose keypoint input
//!
//! Poses are produced each frame by an external pose-detection model. Keypoint
//! names follow the 17-entry COCO vocabulary in camelCase (`leftEye`,
//! `rightShoulder`, ...). Only the eyes feed classification; the rest is kept
//! for the overlay.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::PostureError;
use crate::types::{LineSegment, Point2D};

/// Named anatomical landmark
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Keypoint {
    Nose,
    LeftEye,
    RightEye,
    LeftEar,
    RightEar,
    LeftShoulder,
    RightShoulder,
    LeftElbow,
    RightElbow,
    LeftWrist,
    RightWrist,
    LeftHip,
    RightHip,
    LeftKnee,
    RightKnee,
    LeftAnkle,
    RightAnkle,
}

impl Keypoint {
    /// All keypoints in model output order
    pub const ALL: [Keypoint; 17] = [
        Keypoint::Nose,
        Keypoint::LeftEye,
        Keypoint::RightEye,
        Keypoint::LeftEar,
        Keypoint::RightEar,
        Keypoint::LeftShoulder,
        Keypoint::RightShoulder,
        Keypoint::LeftElbow,
        Keypoint::RightElbow,
        Keypoint::LeftWrist,
        Keypoint::RightWrist,
        Keypoint::LeftHip,
        Keypoint::RightHip,
        Keypoint::LeftKnee,
        Keypoint::RightKnee,
        Keypoint::LeftAnkle,
        Keypoint::RightAnkle,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Keypoint::Nose => "nose",
            Keypoint::LeftEye => "leftEye",
            Keypoint::RightEye => "rightEye",
            Keypoint::LeftEar => "leftEar",
            Keypoint::RightEar => "rightEar",
            Keypoint::LeftShoulder => "leftShoulder",
            Keypoint::RightShoulder => "rightShoulder",
            Keypoint::LeftElbow => "leftElbow",
            Keypoint::RightElbow => "rightElbow",
            Keypoint::LeftWrist => "leftWrist",
            Keypoint::RightWrist => "rightWrist",
            Keypoint::LeftHip => "leftHip",
            Keypoint::RightHip => "rightHip",
            Keypoint::LeftKnee => "leftKnee",
            Keypoint::RightKnee => "rightKnee",
            Keypoint::LeftAnkle => "leftAnkle",
            Keypoint::RightAnkle => "rightAnkle",
        }
    }
}

/// Skeleton edges drawn when a pose carries no skeleton of its own
pub const DEFAULT_SKELETON: [[Keypoint; 2]; 12] = [
    [Keypoint::LeftShoulder, Keypoint::RightShoulder],
    [Keypoint::LeftShoulder, Keypoint::LeftElbow],
    [Keypoint::LeftElbow, Keypoint::LeftWrist],
    [Keypoint::RightShoulder, Keypoint::RightElbow],
    [Keypoint::RightElbow, Keypoint::RightWrist],
    [Keypoint::LeftShoulder, Keypoint::LeftHip],
    [Keypoint::RightShoulder, Keypoint::RightHip],
    [Keypoint::LeftHip, Keypoint::RightHip],
    [Keypoint::LeftHip, Keypoint::LeftKnee],
    [Keypoint::LeftKnee, Keypoint::LeftAnkle],
    [Keypoint::RightHip, Keypoint::RightKnee],
    [Keypoint::RightKnee, Keypoint::RightAnkle],
];

/// Keypoints detected for a single person in one frame
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub keypoints: HashMap<Keypoint, Point2D>,
    /// Connected keypoint pairs; empty means use [`DEFAULT_SKELETON`]
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skeleton: Vec<[Keypoint; 2]>,
}

impl Pose {
    pub fn new(keypoints: HashMap<Keypoint, Point2D>) -> Self {
        Self {
            keypoints,
            skeleton: Vec::new(),
        }
    }

    pub fn get(&self, keypoint: Keypoint) -> Option<Point2D> {
        self.keypoints.get(&keypoint).copied()
    }

    /// `(left_eye, right_eye)`, or `InvalidInput` if either is missing
    pub fn eyes(&self) -> Result<(Point2D, Point2D), PostureError> {
        let left = self
            .get(Keypoint::LeftEye)
            .ok_or_else(|| PostureError::InvalidInput("pose has no leftEye".to_string()))?;
        let right = self
            .get(Keypoint::RightEye)
            .ok_or_else(|| PostureError::InvalidInput("pose has no rightEye".to_string()))?;
        Ok((left, right))
    }

    /// Skeleton segments whose endpoints were both detected
    pub fn skeleton_segments(&self) -> Vec<LineSegment> {
        let edges: &[[Keypoint; 2]] = if self.skeleton.is_empty() {
            &DEFAULT_SKELETON
        } else {
            &self.skeleton
        };

        edges
            .iter()
            .filter_map(|[a, b]| Some(LineSegment::new(self.get(*a)?, self.get(*b)?)))
            .collect()
    }
}

/// One video frame as delivered by the pose-detection collaborator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    /// Monotonic frame index
    pub index: u64,
    /// Detected pose, absent when no person was found
    #[serde(default)]
    pub pose: Option<Pose>,
}

impl Frame {
    pub fn from_json(json: &str) -> Result<Self, PostureError> {
        serde_json::from_str(json).map_err(|e| PostureError::ParseError(e.to_string()))
    }
}
