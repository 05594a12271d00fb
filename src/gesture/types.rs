// Gesture types
// Hit zones, fingertip samples and accepted hit events

use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// How long a zone renders as "struck" after an accepted hit
pub const FLASH_WINDOW: Duration = Duration::from_millis(150);

/// A named rectangular trigger region (one drum pad or piano key)
/// Coordinates are frame pixels with the origin at the top-left corner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    /// Zone name, also the key used to look up its sound (e.g., "SNARE", "C#4")
    pub name: String,

    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,

    /// MIDI note played for this zone (GM drum note or piano key)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub midi_note: Option<u8>,

    /// Time of the last accepted hit, used only for flash rendering
    #[serde(skip)]
    pub last_hit: Option<Instant>,
}

impl Zone {
    /// Create a zone from its corner coordinates
    pub fn new(name: impl Into<String>, x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Zone {
            name: name.into(),
            x1,
            y1,
            x2,
            y2,
            midi_note: None,
            last_hit: None,
        }
    }

    /// Attach a MIDI note to the zone
    pub fn with_midi_note(mut self, note: u8) -> Self {
        self.midi_note = Some(note.min(127));
        self
    }

    pub fn width(&self) -> f32 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> f32 {
        self.y2 - self.y1
    }

    /// Interior test against the rectangle shrunk by `margin` on every side.
    /// Points on the shrunk edge count as inside.
    pub fn contains(&self, x: f32, y: f32, margin: f32) -> bool {
        self.x1 + margin <= x
            && x <= self.x2 - margin
            && self.y1 + margin <= y
            && y <= self.y2 - margin
    }

    /// Record an accepted hit for flash feedback
    pub fn mark_hit(&mut self, now: Instant) {
        self.last_hit = Some(now);
    }

    /// Whether the zone was struck within the last [`FLASH_WINDOW`]
    pub fn is_flashing(&self, now: Instant) -> bool {
        match self.last_hit {
            Some(hit) => now.saturating_duration_since(hit) < FLASH_WINDOW,
            None => false,
        }
    }
}

/// One fingertip observation for one hand in one frame
#[derive(Debug, Clone, PartialEq)]
pub struct FingertipSample {
    /// Hand label from the tracker ("Left" / "Right")
    pub label: String,

    /// Fingertip x in frame pixels
    pub x: f32,

    /// Fingertip y in frame pixels (grows downward)
    pub y: f32,
}

impl FingertipSample {
    pub fn new(label: impl Into<String>, x: f32, y: f32) -> Self {
        FingertipSample {
            label: label.into(),
            x,
            y,
        }
    }
}

/// An accepted strike on a zone, handed to the action sink
#[derive(Debug, Clone, PartialEq)]
pub struct HitEvent {
    /// Hand label that produced the strike
    pub hand: String,

    /// Name of the struck zone
    pub zone: String,

    /// MIDI note of the struck zone, if it has one
    pub midi_note: Option<u8>,

    /// Downward velocity (pixels over the history window) that triggered the hit
    pub velocity: f32,

    /// Time the hit was accepted
    pub at: Instant,
}
