// MIDI export of a recorded performance
// Writes accepted hits as a single-track standard MIDI file using midly

use midly::{
    Format, Header, MetaMessage, MidiMessage, Smf, Timing, Track, TrackEvent, TrackEventKind,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Instant;
use thiserror::Error;

use crate::gesture::HitEvent;

#[derive(Debug, Error)]
pub enum MidiError {
    #[error("Failed to write MIDI: {0}")]
    Write(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid MIDI channel {0} (expected 0-15)")]
    InvalidChannel(u8),
}

/// MIDI export options
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MidiExportOptions {
    /// Pulses per quarter note
    pub ppq: u16,

    /// Nominal tempo; only fixes the tick length, hits keep their real timing
    pub bpm: f64,

    /// How long each note is held
    pub note_duration_ms: f64,

    /// MIDI velocity per pixel of strike velocity
    pub velocity_scale: f32,

    pub track_name: Option<String>,
}

impl Default for MidiExportOptions {
    fn default() -> Self {
        MidiExportOptions {
            ppq: 480,
            bpm: 120.0,
            note_duration_ms: 100.0,
            velocity_scale: 4.0,
            track_name: None,
        }
    }
}

/// Map strike velocity (pixels over the history window) to MIDI velocity 1..=127
pub fn midi_velocity(velocity: f32, scale: f32) -> u8 {
    (velocity * scale).round().clamp(1.0, 127.0) as u8
}

/// Export hits to MIDI file bytes. Times are measured from `start`;
/// hits without a MIDI note are skipped.
pub fn export_midi(
    hits: &[HitEvent],
    start: Instant,
    channel: u8,
    options: &MidiExportOptions,
) -> Result<Vec<u8>, MidiError> {
    if channel > 15 {
        return Err(MidiError::InvalidChannel(channel));
    }

    let header = Header {
        format: Format::SingleTrack,
        timing: Timing::Metrical(options.ppq.into()),
    };
    let ticks_per_ms = calculate_ticks_per_ms(options.bpm, options.ppq);

    let mut events: Vec<(u32, TrackEventKind)> = Vec::new();

    if let Some(name) = &options.track_name {
        events.push((0, TrackEventKind::Meta(MetaMessage::TrackName(name.as_bytes()))));
    }
    events.push((0, TrackEventKind::Meta(MetaMessage::Tempo(tempo_micros(options.bpm).into()))));

    for hit in hits {
        let Some(key) = hit.midi_note else {
            continue;
        };
        let key = key.min(127);
        let offset_ms = hit.at.saturating_duration_since(start).as_secs_f64() * 1000.0;
        let tick_on = (offset_ms * ticks_per_ms) as u32;
        let tick_off = ((offset_ms + options.note_duration_ms) * ticks_per_ms) as u32;

        events.push((
            tick_on,
            TrackEventKind::Midi {
                channel: channel.into(),
                message: MidiMessage::NoteOn {
                    key: key.into(),
                    vel: midi_velocity(hit.velocity, options.velocity_scale).into(),
                },
            },
        ));
        events.push((
            tick_off,
            TrackEventKind::Midi {
                channel: channel.into(),
                message: MidiMessage::NoteOff {
                    key: key.into(),
                    vel: 0.into(),
                },
            },
        ));
    }

    // Stable sort keeps a note-off ahead of a later note-on at the same tick
    events.sort_by_key(|(tick, _)| *tick);

    let mut track = Track::new();
    let mut last_tick = 0;
    for (tick, kind) in events {
        track.push(TrackEvent {
            delta: tick.saturating_sub(last_tick).into(),
            kind,
        });
        last_tick = tick;
    }
    track.push(TrackEvent {
        delta: 0.into(),
        kind: TrackEventKind::Meta(MetaMessage::EndOfTrack),
    });

    let smf = Smf {
        header,
        tracks: vec![track],
    };

    let mut bytes = Vec::new();
    smf.write(&mut bytes)
        .map_err(|e| MidiError::Write(e.to_string()))?;

    Ok(bytes)
}

/// Export hits straight to a `.mid` file
pub fn write_midi_file(
    path: &Path,
    hits: &[HitEvent],
    start: Instant,
    channel: u8,
    options: &MidiExportOptions,
) -> Result<(), MidiError> {
    let bytes = export_midi(hits, start, channel, options)?;
    std::fs::write(path, bytes)?;
    log::info!("Wrote {} hits to {}", hits.len(), path.display());
    Ok(())
}

fn calculate_ticks_per_ms(bpm: f64, ppq: u16) -> f64 {
    let ms_per_quarter = 60_000.0 / bpm;
    ppq as f64 / ms_per_quarter
}

/// Microseconds per quarter note, limited to the 24-bit tempo field
fn tempo_micros(bpm: f64) -> u32 {
    ((60_000_000.0 / bpm) as u32).min(0x00FF_FFFF)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::TempDir;

    fn hit_at(
        start: Instant,
        offset_ms: u64,
        zone: &str,
        note: Option<u8>,
        velocity: f32,
    ) -> HitEvent {
        HitEvent {
            hand: "Right".to_string(),
            zone: zone.to_string(),
            midi_note: note,
            velocity,
            at: start + Duration::from_millis(offset_ms),
        }
    }

    fn note_ons(bytes: &[u8]) -> Vec<(u32, u8, u8, u8)> {
        let smf = Smf::parse(bytes).unwrap();
        let mut tick = 0u32;
        let mut notes = Vec::new();
        for event in &smf.tracks[0] {
            tick += u32::from(event.delta);
            if let TrackEventKind::Midi {
                channel,
                message: MidiMessage::NoteOn { key, vel },
            } = event.kind
            {
                notes.push((tick, u8::from(channel), u8::from(key), u8::from(vel)));
            }
        }
        notes
    }

    #[test]
    fn test_calculate_ticks_per_ms() {
        // At 120 BPM a quarter note is 500ms: 480 / 500 = 0.96
        assert!((calculate_ticks_per_ms(120.0, 480) - 0.96).abs() < 1e-9);
        assert_eq!(tempo_micros(120.0), 500_000);
    }

    #[test]
    fn test_midi_velocity() {
        assert_eq!(midi_velocity(12.0, 4.0), 48);
        assert_eq!(midi_velocity(100.0, 4.0), 127);
        assert_eq!(midi_velocity(0.0, 4.0), 1);
    }

    #[test]
    fn test_export_empty_performance() {
        let bytes = export_midi(&[], Instant::now(), 9, &MidiExportOptions::default()).unwrap();
        let smf = Smf::parse(&bytes).unwrap();
        assert_eq!(smf.header.format, Format::SingleTrack);
        assert_eq!(smf.tracks.len(), 1);
        assert!(note_ons(&bytes).is_empty());
    }

    #[test]
    fn test_export_drum_hits() {
        let start = Instant::now();
        let hits = vec![
            hit_at(start, 0, "KICK", Some(36), 20.0),
            hit_at(start, 500, "SNARE", Some(38), 12.0),
            hit_at(start, 750, "JOKE", None, 30.0),
        ];

        let bytes = export_midi(&hits, start, 9, &MidiExportOptions::default()).unwrap();
        let notes = note_ons(&bytes);
        assert_eq!(notes, vec![(0, 9, 36, 80), (480, 9, 38, 48)]);
    }

    #[test]
    fn test_export_piano_track_name() {
        let start = Instant::now();
        let hits = vec![hit_at(start, 250, "C4", Some(60), 10.0)];
        let options = MidiExportOptions {
            track_name: Some("AR Piano".to_string()),
            ..MidiExportOptions::default()
        };

        let bytes = export_midi(&hits, start, 0, &options).unwrap();
        let smf = Smf::parse(&bytes).unwrap();
        assert!(smf.tracks[0].iter().any(|e| matches!(
            e.kind,
            TrackEventKind::Meta(MetaMessage::TrackName(name)) if name == b"AR Piano"
        )));
        assert_eq!(note_ons(&bytes), vec![(240, 0, 60, 40)]);
    }

    #[test]
    fn test_invalid_channel() {
        let result = export_midi(&[], Instant::now(), 16, &MidiExportOptions::default());
        assert!(matches!(result, Err(MidiError::InvalidChannel(16))));
    }

    #[test]
    fn test_write_midi_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("take.mid");
        let start = Instant::now();
        let hits = vec![hit_at(start, 100, "SNARE", Some(38), 15.0)];

        write_midi_file(&path, &hits, start, 9, &MidiExportOptions::default()).unwrap();
        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(note_ons(&bytes).len(), 1);
    }
}
