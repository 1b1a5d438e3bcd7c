//! Posture Flux - frame-driven sitting posture classification
//!
//! Posture Flux turns per-frame pose keypoints into a discrete posture state
//! through a deterministic pipeline: eye line → orientation angle against a
//! calibrated horizontal reference → dead-band threshold → vertical override.
//!
//! ## Modules
//!
//! - **Geometry**: signed angle between two line segments
//! - **Classifier**: per-frame posture classification and recalibration
//! - **Pipeline**: frame parsing, alerting, overlays and report encoding

pub mod alert;
pub mod calibration;
pub mod classifier;
pub mod config;
pub mod encoder;
pub mod error;
pub mod geometry;
pub mod overlay;
pub mod pipeline;
pub mod pose;
pub mod types;

// FFI bindings for C interop (always available for cdylib/staticlib builds)
pub mod ffi;

pub use calibration::{Calibration, KeepCalibration, LevelAtEyeHeight, RecalibrationPolicy};
pub use classifier::PostureClassifier;
pub use config::PostureConfig;
pub use error::PostureError;
pub use geometry::angle_between;
pub use pipeline::{frame_to_report, PostureProcessor};
pub use pose::{Frame, Keypoint, Pose};
pub use types::{Classification, LineSegment, Point2D, PostureState};

/// Library version embedded in all reports
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for reports
pub const PRODUCER_NAME: &str = "posture-flux";
