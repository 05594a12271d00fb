// Piano layout
// Two octaves (C4-B5) centred in the camera frame

use super::types::{note_number, Instrument, VoiceKind};
use crate::gesture::Zone;

const WHITE_KEY_WIDTH: i64 = 80;
const WHITE_KEY_HEIGHT: i64 = 180;
const BLACK_KEY_WIDTH: i64 = 40;
const BLACK_KEY_HEIGHT: i64 = 100;

const WHITE_NOTES: [&str; 14] = [
    "C4", "D4", "E4", "F4", "G4", "A4", "B4", "C5", "D5", "E5", "F5", "G5", "A5", "B5",
];

/// Black key centres, measured in white-key widths from the left edge
const BLACK_KEYS: [(&str, f32); 10] = [
    ("C#4", 0.75),
    ("D#4", 1.75),
    ("F#4", 3.75),
    ("G#4", 4.75),
    ("A#4", 5.75),
    ("C#5", 7.75),
    ("D#5", 8.75),
    ("F#5", 10.75),
    ("G#5", 11.75),
    ("A#5", 12.75),
];

/// Build the piano keyboard for a frame of the given size.
///
/// Black keys sit on top of the white keys and are listed first so the
/// first-match rule resolves a fingertip over a black key to that key.
pub fn piano(frame_width: u32, frame_height: u32) -> Instrument {
    let start_x = (i64::from(frame_width) - WHITE_NOTES.len() as i64 * WHITE_KEY_WIDTH) / 2;
    let base_y = (i64::from(frame_height) - WHITE_KEY_HEIGHT) / 2;

    let mut zones = Vec::with_capacity(BLACK_KEYS.len() + WHITE_NOTES.len());

    for (note, position) in BLACK_KEYS.iter() {
        let centre = start_x + (position * WHITE_KEY_WIDTH as f32) as i64;
        zones.push(key_zone(
            note,
            centre - BLACK_KEY_WIDTH / 2,
            base_y,
            centre + BLACK_KEY_WIDTH / 2,
            base_y + BLACK_KEY_HEIGHT,
        ));
    }

    for (i, note) in WHITE_NOTES.iter().enumerate() {
        let i = i as i64;
        zones.push(key_zone(
            note,
            start_x + i * WHITE_KEY_WIDTH,
            base_y,
            start_x + (i + 1) * WHITE_KEY_WIDTH,
            base_y + WHITE_KEY_HEIGHT,
        ));
    }

    Instrument {
        name: "PIANO".to_string(),
        title: "AR Piano".to_string(),
        voice: VoiceKind::Piano,
        zone_margin: 5.0,
        midi_channel: 0,
        zones,
    }
}

fn key_zone(note: &str, x1: i64, y1: i64, x2: i64, y2: i64) -> Zone {
    let zone = Zone::new(note, x1 as f32, y1 as f32, x2 as f32, y2 as f32);
    match note_number(note) {
        Some(midi) => zone.with_midi_note(midi),
        None => zone,
    }
}

/// Whether a key name is a black (sharp) key
pub fn is_black_key(name: &str) -> bool {
    name.contains('#')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_piano_key_count() {
        let piano = piano(1280, 720);
        assert_eq!(piano.zones.len(), 24);
        assert!(piano.validate().is_ok());
        assert_eq!(piano.zone_margin, 5.0);
    }

    #[test]
    fn test_black_keys_listed_first() {
        let piano = piano(1280, 720);
        assert!(piano.zones[..10].iter().all(|z| is_black_key(&z.name)));
        assert!(piano.zones[10..].iter().all(|z| !is_black_key(&z.name)));
    }

    #[test]
    fn test_white_key_geometry() {
        let piano = piano(1280, 720);
        // start_x = (1280 - 1120) / 2 = 80, base_y = (720 - 180) / 2 = 270
        let c4 = piano.zone("C4").unwrap();
        assert_eq!((c4.x1, c4.y1, c4.x2, c4.y2), (80.0, 270.0, 160.0, 450.0));

        let b5 = piano.zone("B5").unwrap();
        assert_eq!((b5.x1, b5.x2), (1120.0, 1200.0));
    }

    #[test]
    fn test_black_key_geometry() {
        let piano = piano(1280, 720);
        // centre = 80 + 0.75 * 80 = 140
        let cs4 = piano.zone("C#4").unwrap();
        assert_eq!((cs4.x1, cs4.y1, cs4.x2, cs4.y2), (120.0, 270.0, 160.0, 370.0));
    }

    #[test]
    fn test_piano_very_large_frame() {
        let piano = piano(u32::MAX, u32::MAX);
        assert_eq!(piano.zones.len(), 24);
        let c4 = piano.zone("C4").unwrap();
        assert!(c4.x1 > 0.0 && c4.y1 > 0.0);
    }

    #[test]
    fn test_piano_midi_notes() {
        let piano = piano(1280, 720);
        assert_eq!(piano.zone("C4").unwrap().midi_note, Some(60));
        assert_eq!(piano.zone("A#4").unwrap().midi_note, Some(70));
        assert_eq!(piano.zone("B5").unwrap().midi_note, Some(83));
        assert!(piano.zones.iter().all(|z| z.midi_note.is_some()));
    }

    #[test]
    fn test_every_black_key_overlaps_a_white_key() {
        let piano = piano(1280, 720);
        for black in piano.zones.iter().filter(|z| is_black_key(&z.name)) {
            let cx = (black.x1 + black.x2) / 2.0;
            let cy = (black.y1 + black.y2) / 2.0;
            let first = piano
                .zones
                .iter()
                .find(|z| z.contains(cx, cy, piano.zone_margin))
                .unwrap();
            assert_eq!(first.name, black.name);
        }
    }
}
