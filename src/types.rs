//! Core types for the Posture Flux pipeline
//!
//! This module defines the geometric primitives and classification results that
//! flow through each stage: keypoints, line segments, posture states and the
//! stroke colors a renderer uses to display them.

use serde::{Deserialize, Serialize};

/// A tracked keypoint in image pixel space
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point2D {
    pub x: f64,
    pub y: f64,
}

impl Point2D {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point
    pub fn distance_to(&self, other: &Point2D) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Ordered pair of points
///
/// Point order only affects the sign of angles computed from the segment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LineSegment {
    pub start: Point2D,
    pub end: Point2D,
}

impl LineSegment {
    pub const fn new(start: Point2D, end: Point2D) -> Self {
        Self { start, end }
    }

    /// Horizontal segment spanning `[0, width]` at height `y`
    pub const fn horizontal(y: f64, width: f64) -> Self {
        Self {
            start: Point2D::new(0.0, y),
            end: Point2D::new(width, y),
        }
    }

    /// Direction of the segment in radians, measured from `end` towards `start`.
    ///
    /// Returns 0 for a zero-length segment.
    pub fn direction(&self) -> f64 {
        (self.start.y - self.end.y).atan2(self.start.x - self.end.x)
    }

    pub fn length(&self) -> f64 {
        self.start.distance_to(&self.end)
    }

    /// Mean height of both endpoints
    pub fn mid_y(&self) -> f64 {
        (self.start.y + self.end.y) / 2.0
    }
}

/// Discrete posture classification for a single frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostureState {
    Neutral,
    TiltForward,
    TiltBackward,
    SlouchedLow,
}

impl PostureState {
    pub fn as_str(&self) -> &'static str {
        match self {
            PostureState::Neutral => "neutral",
            PostureState::TiltForward => "tilt_forward",
            PostureState::TiltBackward => "tilt_backward",
            PostureState::SlouchedLow => "slouched_low",
        }
    }

    pub fn is_neutral(&self) -> bool {
        matches!(self, PostureState::Neutral)
    }

    /// Stroke color used to draw the eye line for this state
    pub fn stroke_color(&self) -> StrokeColor {
        match self {
            PostureState::TiltForward | PostureState::SlouchedLow => StrokeColor::Red,
            PostureState::TiltBackward => StrokeColor::Yellow,
            PostureState::Neutral => StrokeColor::White,
        }
    }
}

/// Named stroke colors understood by the rendering collaborator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrokeColor {
    White,
    Red,
    Yellow,
    Gray,
    Green,
    Blue,
}

/// Result of classifying one frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    /// Final posture state after the vertical override
    pub state: PostureState,
    /// Eye line `(right_eye, left_eye)` to draw
    pub display_line: LineSegment,
    /// Scaled orientation angle of the eye line against the reference
    pub angle: f64,
    /// Whether at least one eye is at or above the reference height
    pub vertical_ok: bool,
}
