//! Alert dispatch
//!
//! The classifier never plays sounds itself. An [`Alerter`] watches the stream
//! of per-frame states and asks an [`AlertSink`] to play the configured audio
//! resource when the posture turns bad.

use log::info;

use crate::types::PostureState;

/// Audio playback collaborator
pub trait AlertSink {
    fn play(&mut self, resource: &str);
}

/// Sink that only logs the alert
#[derive(Debug, Default)]
pub struct LogSink;

impl AlertSink for LogSink {
    fn play(&mut self, resource: &str) {
        info!("posture alert: playing '{resource}'");
    }
}

/// Sink that records every requested resource
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub played: Vec<String>,
}

impl AlertSink for RecordingSink {
    fn play(&mut self, resource: &str) {
        self.played.push(resource.to_string());
    }
}

/// Edge-triggered alerter.
///
/// Fires when the state leaves `Neutral` or switches between two non-neutral
/// states; stays quiet while the state repeats and re-arms on `Neutral`.
pub struct Alerter {
    resource: String,
    last_state: PostureState,
    sink: Box<dyn AlertSink>,
}

impl Alerter {
    pub fn new(resource: impl Into<String>, sink: Box<dyn AlertSink>) -> Self {
        Self {
            resource: resource.into(),
            last_state: PostureState::Neutral,
            sink,
        }
    }

    pub fn resource(&self) -> &str {
        &self.resource
    }

    /// Feed the latest state; returns true if an alert was played
    pub fn observe(&mut self, state: PostureState) -> bool {
        let fire = !state.is_neutral() && state != self.last_state;
        self.last_state = state;
        if fire {
            self.sink.play(&self.resource);
        }
        fire
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    struct SharedSink(Rc<RefCell<Vec<String>>>);

    impl AlertSink for SharedSink {
        fn play(&mut self, resource: &str) {
            self.0.borrow_mut().push(resource.to_string());
        }
    }

    fn alerter() -> (Alerter, Rc<RefCell<Vec<String>>>) {
        let played = Rc::new(RefCell::new(Vec::new()));
        let alerter = Alerter::new("alarm_sound.wav", Box::new(SharedSink(played.clone())));
        (alerter, played)
    }

    #[test]
    fn test_neutral_never_alerts() {
        let (mut alerter, played) = alerter();
        for _ in 0..5 {
            assert!(!alerter.observe(PostureState::Neutral));
        }
        assert!(played.borrow().is_empty());
    }

    #[test]
    fn test_alerts_once_per_episode() {
        let (mut alerter, played) = alerter();
        assert!(alerter.observe(PostureState::SlouchedLow));
        assert!(!alerter.observe(PostureState::SlouchedLow));
        assert!(!alerter.observe(PostureState::SlouchedLow));
        assert!(!alerter.observe(PostureState::Neutral));
        assert!(alerter.observe(PostureState::SlouchedLow));
        assert_eq!(*played.borrow(), vec!["alarm_sound.wav", "alarm_sound.wav"]);
    }

    #[test]
    fn test_state_change_realerts() {
        let (mut alerter, _) = alerter();
        assert!(alerter.observe(PostureState::TiltForward));
        assert!(alerter.observe(PostureState::TiltBackward));
        assert!(!alerter.observe(PostureState::TiltBackward));
    }

    #[test]
    fn test_recording_sink() {
        let mut sink = RecordingSink::default();
        sink.play("beep.wav");
        assert_eq!(sink.played, vec!["beep.wav".to_string()]);
    }
}
