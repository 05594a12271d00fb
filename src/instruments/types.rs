// Instrument Type Definitions
// An instrument is a zone layout plus how its hits should sound

use serde::{Deserialize, Serialize};

use crate::gesture::Zone;

/// Family of synthesized fallback voice used when a zone has no sample
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VoiceKind {
    /// Short pitched thump mixed with a noise burst
    Drum,
    /// Decaying harmonic tone
    Piano,
}

/// Complete instrument definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instrument {
    /// Lookup name (e.g., "DRUMS")
    pub name: String,

    /// Window title / display name
    pub title: String,

    /// Fallback voice family
    pub voice: VoiceKind,

    /// Default zone inset for this layout, in pixels
    pub zone_margin: f32,

    /// MIDI channel used when exporting a performance (0-indexed)
    pub midi_channel: u8,

    /// Zones in hit-test order
    pub zones: Vec<Zone>,
}

/// Lightweight instrument description for listings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstrumentSummary {
    pub name: String,
    pub title: String,
    pub description: String,
    pub zone_count: usize,
}

impl Instrument {
    /// Create a summary with a description
    pub fn summary(&self, description: &str) -> InstrumentSummary {
        InstrumentSummary {
            name: self.name.clone(),
            title: self.title.clone(),
            description: description.to_string(),
            zone_count: self.zones.len(),
        }
    }

    /// Find a zone by name
    pub fn zone(&self, name: &str) -> Option<&Zone> {
        self.zones.iter().find(|z| z.name == name)
    }

    /// Names of all zones in hit-test order
    pub fn zone_names(&self) -> Vec<&str> {
        self.zones.iter().map(|z| z.name.as_str()).collect()
    }

    /// Check the layout for empty, inverted or duplicate zones
    pub fn validate(&self) -> Result<(), String> {
        if self.zones.is_empty() {
            return Err(format!("Instrument {} has no zones", self.name));
        }

        for (i, zone) in self.zones.iter().enumerate() {
            if zone.name.is_empty() {
                return Err(format!("Zone #{} has an empty name", i));
            }
            if zone.x2 <= zone.x1 || zone.y2 <= zone.y1 {
                return Err(format!(
                    "Zone {} has inverted or empty bounds ({}, {}) - ({}, {})",
                    zone.name, zone.x1, zone.y1, zone.x2, zone.y2
                ));
            }
            if self.zones[..i].iter().any(|other| other.name == zone.name) {
                return Err(format!("Duplicate zone name: {}", zone.name));
            }
        }

        if self.midi_channel > 15 {
            return Err(format!("MIDI channel {} out of range 0-15", self.midi_channel));
        }

        Ok(())
    }

    /// Serialize the layout to JSON bytes
    pub fn to_json_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec_pretty(self)
    }

    /// Deserialize a layout from JSON bytes
    pub fn from_json_bytes(data: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(data)
    }
}

/// Parse a note name such as "C4" or "F#5" into a MIDI note number (C4 = 60)
pub fn note_number(name: &str) -> Option<u8> {
    let mut chars = name.chars();
    let letter = chars.next()?;
    let base: i32 = match letter.to_ascii_uppercase() {
        'C' => 0,
        'D' => 2,
        'E' => 4,
        'F' => 5,
        'G' => 7,
        'A' => 9,
        'B' => 11,
        _ => return None,
    };

    let rest = chars.as_str();
    let (offset, octave_str) = if let Some(stripped) = rest.strip_prefix('#') {
        (1, stripped)
    } else if let Some(stripped) = rest.strip_prefix('b') {
        (-1, stripped)
    } else {
        (0, rest)
    };

    let octave: i32 = octave_str.parse().ok()?;
    let number = (octave + 1) * 12 + base + offset;
    u8::try_from(number).ok().filter(|n| *n <= 127)
}
