// Hand landmark messages
// JSON frames produced by the landmark bridge, reduced to fingertip samples

use serde::{Deserialize, Serialize};

use crate::gesture::FingertipSample;

/// MediaPipe hand model landmark count
pub const LANDMARK_COUNT: usize = 21;

/// Index finger tip in the MediaPipe hand model
pub const INDEX_FINGER_TIP: usize = 8;

/// A single landmark, normalized to the image (0.0 - 1.0)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    #[serde(default)]
    pub z: f32,
}

/// One detected hand
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HandObservation {
    /// "Left" or "Right"
    pub handedness: String,

    #[serde(default = "full_confidence")]
    pub score: f32,

    pub landmarks: Vec<Landmark>,
}

fn full_confidence() -> f32 {
    1.0
}

/// One line of bridge output
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FrameMessage {
    /// Seconds since the bridge started capturing
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<f64>,

    #[serde(default)]
    pub hands: Vec<HandObservation>,

    /// Set when the user asked to stop
    #[serde(default)]
    pub quit: bool,

    /// Detector error for this frame; the frame carries no hands
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Camera frame size and how to map landmarks into it
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameGeometry {
    pub width: u32,
    pub height: u32,

    /// Flip x so the view behaves like a mirror
    pub mirror: bool,

    /// Hands scored below this are ignored
    pub min_confidence: f32,
}

impl Default for FrameGeometry {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            mirror: false,
            min_confidence: 0.7,
        }
    }
}

impl FrameGeometry {
    /// Index fingertip of a hand in whole pixels, if the hand is usable
    pub fn fingertip(&self, hand: &HandObservation) -> Option<FingertipSample> {
        if hand.score < self.min_confidence {
            log::debug!(
                "Skipping {} hand (confidence={:.2})",
                hand.handedness,
                hand.score
            );
            return None;
        }
        if hand.landmarks.len() != LANDMARK_COUNT {
            log::warn!(
                "Expected {} landmarks, got {}",
                LANDMARK_COUNT,
                hand.landmarks.len()
            );
            return None;
        }

        let tip = hand.landmarks[INDEX_FINGER_TIP];
        let nx = if self.mirror { 1.0 - tip.x } else { tip.x };
        let x = (nx * self.width as f32).trunc();
        let y = (tip.y * self.height as f32).trunc();
        Some(FingertipSample::new(hand.handedness.clone(), x, y))
    }
}

/// A frame reduced to what the dispatcher consumes
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrackedFrame {
    pub timestamp: Option<f64>,
    pub samples: Vec<FingertipSample>,
    pub quit: bool,
}

impl FrameMessage {
    pub fn into_frame(self, geometry: &FrameGeometry) -> TrackedFrame {
        if let Some(error) = &self.error {
            log::warn!("Landmark detector error: {}", error);
        }

        let samples = self
            .hands
            .iter()
            .filter_map(|hand| geometry.fingertip(hand))
            .collect();

        TrackedFrame {
            timestamp: self.timestamp,
            samples,
            quit: self.quit,
        }
    }
}

/// Parse one JSON frame line
pub fn parse_frame(
    line: &str,
    geometry: &FrameGeometry,
) -> Result<TrackedFrame, serde_json::Error> {
    let message: FrameMessage = serde_json::from_str(line)?;
    Ok(message.into_frame(geometry))
}
