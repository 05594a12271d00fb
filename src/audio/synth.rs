// Fallback synthesis
// Renders short percussive and piano tones so a kit is playable without sample files

use serde::{Deserialize, Serialize};
use std::f32::consts::PI;
use std::path::{Path, PathBuf};

use crate::instruments::{Instrument, VoiceKind};

/// Settings for synthesized voices
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthSettings {
    pub sample_rate: u32,
    pub duration_secs: f32,
    pub gain: f32,
}

impl Default for SynthSettings {
    fn default() -> Self {
        Self {
            sample_rate: 44100,
            duration_secs: 0.6,
            gain: 0.8,
        }
    }
}

impl SynthSettings {
    pub fn sample_count(&self) -> usize {
        (self.sample_rate as f32 * self.duration_secs.max(0.0)) as usize
    }
}

/// Convert MIDI note number to frequency in Hz
pub fn midi_to_freq(midi_note: u8) -> f64 {
    // A4 = 440 Hz = MIDI note 69
    440.0 * 2.0_f64.powf((midi_note as f64 - 69.0) / 12.0)
}

/// Soft-knee limiter, keeps peaks below 1.0 without hard clipping
pub fn soft_limit(sample: f32, threshold: f32) -> f32 {
    if sample.abs() <= threshold {
        sample
    } else {
        let sign = sample.signum();
        sign * (threshold + (sample.abs() - threshold).tanh() * (1.0 - threshold))
    }
}

/// Deterministic xorshift noise in [-1, 1]
struct Noise(u32);

impl Noise {
    fn next(&mut self) -> f32 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.0 = x;
        (x as f32 / u32::MAX as f32) * 2.0 - 1.0
    }
}

/// Drum character for a General MIDI percussion note: (noise mix, body decay, noise decay)
fn drum_character(midi_note: u8) -> (f32, f32, f32) {
    match midi_note {
        42 | 44 | 46 => (0.9, 60.0, 40.0), // hi-hats
        49 | 51 | 52 | 55 | 57 => (0.8, 20.0, 6.0), // cymbals
        37..=40 => (0.5, 25.0, 20.0),      // snares
        _ => (0.1, 12.0, 30.0),            // kicks, toms
    }
}

/// Render a mono voice for a note
pub fn render_voice(voice: VoiceKind, midi_note: u8, settings: &SynthSettings) -> Vec<f32> {
    match voice {
        VoiceKind::Drum => render_drum(midi_note, settings),
        VoiceKind::Piano => render_piano(midi_note, settings),
    }
}

fn render_drum(midi_note: u8, settings: &SynthSettings) -> Vec<f32> {
    let sr = settings.sample_rate as f32;
    let freq = midi_to_freq(midi_note) as f32;
    let (noise_mix, body_decay, noise_decay) = drum_character(midi_note);
    let mut noise = Noise(0x9E37_79B9 ^ midi_note as u32);
    let mut phase = 0.0f32;

    (0..settings.sample_count())
        .map(|i| {
            let t = i as f32 / sr;
            // Pitch drops from 2.5x to the base frequency over the first 40ms
            let sweep = 1.0 + 1.5 * (-t / 0.04).exp();
            phase += 2.0 * PI * freq * sweep / sr;
            let body = phase.sin() * (-t * body_decay).exp();
            let hiss = noise.next() * (-t * noise_decay).exp();
            let sample = (1.0 - noise_mix) * body + noise_mix * hiss;
            soft_limit(sample * settings.gain, 0.9)
        })
        .collect()
}

fn render_piano(midi_note: u8, settings: &SynthSettings) -> Vec<f32> {
    let sr = settings.sample_rate as f32;
    let freq = midi_to_freq(midi_note) as f32;
    let harmonics = [(1.0f32, 1.0f32), (2.0, 0.5), (3.0, 0.25)];
    let norm: f32 = harmonics.iter().map(|(_, amp)| amp).sum();
    let attack = 0.005;

    (0..settings.sample_count())
        .map(|i| {
            let t = i as f32 / sr;
            let envelope = if t < attack {
                t / attack
            } else {
                (-(t - attack) * 3.0).exp()
            };
            let tone: f32 = harmonics
                .iter()
                .map(|(mult, amp)| amp * (2.0 * PI * freq * mult * t).sin())
                .sum();
            soft_limit(tone / norm * envelope * settings.gain, 0.9)
        })
        .collect()
}

/// Encode mono samples as 16-bit WAV bytes
pub fn encode_wav(samples: &[f32], sample_rate: u32) -> Result<Vec<u8>, hound::Error> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = std::io::Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec)?;
        for &sample in samples {
            // Convert f32 (-1.0 to 1.0) to i16
            let int_sample = (sample * 32767.0).clamp(-32768.0, 32767.0) as i16;
            writer.write_sample(int_sample)?;
        }
        writer.finalize()?;
    }

    Ok(cursor.into_inner())
}

/// Write one `<zone>.wav` per zone with a MIDI note into `dir`
pub fn render_instrument_samples(
    instrument: &Instrument,
    dir: &Path,
    settings: &SynthSettings,
) -> Result<Vec<PathBuf>, hound::Error> {
    std::fs::create_dir_all(dir)?;

    let mut written = Vec::new();
    for zone in &instrument.zones {
        let Some(note) = zone.midi_note else {
            log::warn!("Zone {} has no MIDI note, skipping", zone.name);
            continue;
        };

        let samples = render_voice(instrument.voice, note, settings);
        let path = dir.join(format!("{}.wav", zone.name));
        std::fs::write(&path, encode_wav(&samples, settings.sample_rate)?)?;
        log::debug!("Rendered {} ({} samples)", path.display(), samples.len());
        written.push(path);
    }

    Ok(written)
}
