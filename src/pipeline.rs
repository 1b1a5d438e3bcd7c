//! Pipeline orchestration
//!
//! This module provides the public API for Posture Flux.
//! It orchestrates the per-frame flow from pose JSON to a posture report:
//! frame parsing → classification → alerting → overlay → encoding.

use log::{debug, warn};

use crate::alert::{AlertSink, Alerter, LogSink};
use crate::calibration::{Calibration, RecalibrationPolicy};
use crate::classifier::PostureClassifier;
use crate::config::PostureConfig;
use crate::encoder::{PostureReport, ReportEncoder};
use crate::error::PostureError;
use crate::overlay::OverlayBuilder;
use crate::pose::Frame;
use crate::types::LineSegment;

/// Classify a single frame with a fresh processor.
///
/// # Arguments
/// * `frame_json` - Frame JSON (`{"index": .., "pose": {"keypoints": {..}}}`)
/// * `config_json` - Optional configuration JSON; defaults are used when `None`
///
/// # Returns
/// The report JSON, or `None` when the frame carries no usable pose
///
/// # Example
/// ```ignore
/// let report = frame_to_report(frame_json, None)?;
/// ```
pub fn frame_to_report(
    frame_json: String,
    config_json: Option<String>,
) -> Result<Option<String>, PostureError> {
    let config = match config_json {
        Some(json) => PostureConfig::from_json(&json)?,
        None => PostureConfig::default(),
    };
    let mut processor = PostureProcessor::new(&config)?;
    processor.process_frame_json(&frame_json)
}

/// Stateful processor for a stream of frames.
///
/// Holds the classifier, the alerter and the last seen eye line so that
/// recalibration can be requested at any point between frames.
pub struct PostureProcessor {
    classifier: PostureClassifier,
    alerter: Alerter,
    overlay: Option<OverlayBuilder>,
    encoder: ReportEncoder,
    last_eye_line: Option<LineSegment>,
    frames_classified: u64,
    frames_skipped: u64,
}

impl PostureProcessor {
    /// Create a processor that logs alerts and omits overlays
    pub fn new(config: &PostureConfig) -> Result<Self, PostureError> {
        Ok(Self {
            classifier: PostureClassifier::new(config)?,
            alerter: Alerter::new(config.audio_resource.clone(), Box::new(LogSink)),
            overlay: None,
            encoder: ReportEncoder::new(),
            last_eye_line: None,
            frames_classified: 0,
            frames_skipped: 0,
        })
    }

    pub fn with_policy(mut self, policy: Box<dyn RecalibrationPolicy>) -> Self {
        self.classifier = self.classifier.with_policy(policy);
        self
    }

    pub fn with_sink(mut self, sink: Box<dyn AlertSink>) -> Self {
        self.alerter = Alerter::new(self.alerter.resource().to_string(), sink);
        self
    }

    /// Attach an overlay description to every report
    pub fn with_overlay(mut self, config: &PostureConfig) -> Self {
        self.overlay = Some(OverlayBuilder::new(config));
        self
    }

    pub fn with_encoder(mut self, encoder: ReportEncoder) -> Self {
        self.encoder = encoder;
        self
    }

    pub fn classifier(&self) -> &PostureClassifier {
        &self.classifier
    }

    pub fn frames_classified(&self) -> u64 {
        self.frames_classified
    }

    pub fn frames_skipped(&self) -> u64 {
        self.frames_skipped
    }

    /// Classify one frame. Frames without a pose or without both eyes are
    /// skipped and yield `None`.
    pub fn process_frame(&mut self, frame: &Frame) -> Result<Option<PostureReport>, PostureError> {
        let Some(pose) = &frame.pose else {
            debug!("frame {}: no pose detected, skipping", frame.index);
            self.frames_skipped += 1;
            return Ok(None);
        };

        let (left_eye, right_eye) = match pose.eyes() {
            Ok(eyes) => eyes,
            Err(e) => {
                warn!("frame {}: {e}, skipping", frame.index);
                self.frames_skipped += 1;
                return Ok(None);
            }
        };

        let classification = self.classifier.classify(left_eye, right_eye)?;
        let alert = self.alerter.observe(classification.state);
        let overlay = self.overlay.as_ref().map(|builder| {
            builder.build(
                pose,
                self.classifier.calibration().reference_line(),
                &classification,
            )
        });

        self.last_eye_line = Some(classification.display_line);
        self.frames_classified += 1;

        Ok(Some(self.encoder.encode(
            frame.index,
            &classification,
            self.classifier.calibration().threshold_degrees(),
            alert,
            overlay,
        )))
    }

    /// Parse and classify one frame, returning the report JSON
    pub fn process_frame_json(&mut self, frame_json: &str) -> Result<Option<String>, PostureError> {
        let frame = Frame::from_json(frame_json)?;
        match self.process_frame(&frame)? {
            Some(report) => Ok(Some(self.encoder.to_json(&report)?)),
            None => Ok(None),
        }
    }

    /// Classify newline-delimited frames, returning one report per classified frame
    pub fn process_ndjson(&mut self, input: &str) -> Result<Vec<String>, PostureError> {
        let mut reports = Vec::new();

        for line in input.lines() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            if let Some(report) = self.process_frame_json(trimmed)? {
                reports.push(report);
            }
        }

        Ok(reports)
    }

    /// Recalibrate from the most recently classified eye line
    pub fn recalibrate(&mut self) -> Result<Calibration, PostureError> {
        let eye_line = self.last_eye_line.ok_or_else(|| {
            PostureError::InvalidInput("no frame has been classified yet".to_string())
        })?;
        self.classifier.recalibrate(&eye_line)
    }
}
