// Drum kit layout
// Five pads arranged in three rows across the camera frame

use super::types::{Instrument, VoiceKind};
use crate::gesture::Zone;

/// General MIDI percussion note numbers
pub const MIDI_KICK: u8 = 36; // C1
pub const MIDI_SNARE: u8 = 38; // D1
pub const MIDI_CLOSED_HIHAT: u8 = 42; // F#1
pub const MIDI_LOW_TOM: u8 = 45; // A1
pub const MIDI_CRASH: u8 = 49; // C#2

const PAD_HALF_WIDTH: i64 = 75;
const KICK_HALF_WIDTH: i64 = 100;

/// Build the drum kit for a frame of the given width.
///
/// Rows (y ranges) are fixed; pad centres follow the frame width:
/// HIHAT at 1/6 and SNARE at 4/6 on top, TOM at 1/4 and JOKE at 3/4 in the
/// middle, KICK centred at the bottom.
pub fn drum_kit(frame_width: u32) -> Instrument {
    let w = i64::from(frame_width);

    let pad = |name: &str, centre: i64, half: i64, y1: i64, y2: i64, note: u8| {
        Zone::new(
            name,
            (centre - half) as f32,
            y1 as f32,
            (centre + half) as f32,
            y2 as f32,
        )
        .with_midi_note(note)
    };

    let zones = vec![
        pad("HIHAT", w / 6, PAD_HALF_WIDTH, 150, 250, MIDI_CLOSED_HIHAT),
        pad("SNARE", w * 4 / 6, PAD_HALF_WIDTH, 150, 250, MIDI_SNARE),
        pad("TOM", w / 4, PAD_HALF_WIDTH, 300, 400, MIDI_LOW_TOM),
        pad("JOKE", w * 3 / 4, PAD_HALF_WIDTH, 300, 400, MIDI_CRASH),
        pad("KICK", w / 2, KICK_HALF_WIDTH, 450, 550, MIDI_KICK),
    ];

    Instrument {
        name: "DRUMS".to_string(),
        title: "AR Drum Kit".to_string(),
        voice: VoiceKind::Drum,
        zone_margin: 10.0,
        midi_channel: 9, // Channel 10 (0-indexed = 9) is drums
        zones,
    }
}
