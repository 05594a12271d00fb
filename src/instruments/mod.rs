// Instruments Module
// Built-in zone layouts for the gesture instruments

mod drums;
mod piano;
pub mod types;

/// Get an instrument by name, laid out for a frame of the given size
pub fn get_instrument(
    name: &str,
    frame_width: u32,
    frame_height: u32,
) -> Option<types::Instrument> {
    match name.to_uppercase().as_str() {
        "DRUMS" | "DRUM KIT" => Some(drums::drum_kit(frame_width)),
        "PIANO" => Some(piano::piano(frame_width, frame_height)),
        _ => None,
    }
}

/// List all available instruments with summaries
pub fn list_instruments(frame_width: u32, frame_height: u32) -> Vec<types::InstrumentSummary> {
    vec![
        drums::drum_kit(frame_width).summary(
            "Hi-hat, snare, tom, joke and kick pads. Strike downward through a pad to play it.",
        ),
        piano::piano(frame_width, frame_height).summary(
            "Two octaves, C4 to B5, centred in the frame. Tap keys with a downward stroke.",
        ),
    ]
}

/// Get all instrument names
pub fn list_instrument_names() -> Vec<String> {
    vec!["DRUMS".to_string(), "PIANO".to_string()]
}

// Re-export main types
pub use drums::{MIDI_CLOSED_HIHAT, MIDI_CRASH, MIDI_KICK, MIDI_LOW_TOM, MIDI_SNARE};
pub use piano::is_black_key;
pub use types::{note_number, Instrument, InstrumentSummary, VoiceKind};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_instrument() {
        let drums = get_instrument("drums", 1280, 720);
        assert!(drums.is_some());
        assert_eq!(drums.unwrap().name, "DRUMS");

        let piano = get_instrument("Piano", 1280, 720);
        assert!(piano.is_some());
        assert_eq!(piano.unwrap().voice, VoiceKind::Piano);

        assert!(get_instrument("TABLA", 1280, 720).is_none());
    }

    #[test]
    fn test_list_instruments() {
        let instruments = list_instruments(1280, 720);
        assert_eq!(instruments.len(), 2);
        assert!(instruments.iter().any(|i| i.name == "DRUMS" && i.zone_count == 5));
        assert!(instruments.iter().any(|i| i.name == "PIANO" && i.zone_count == 24));
    }

    #[test]
    fn test_list_instrument_names() {
        let names = list_instrument_names();
        assert_eq!(names.len(), 2);
        for name in names {
            assert!(get_instrument(&name, 1280, 720).is_some());
        }
    }
}
