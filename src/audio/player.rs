// Sample playback
// Turns hits into rodio sources and plays them on the default output device

use rodio::buffer::SamplesBuffer;
use rodio::{Decoder, OutputStream, OutputStreamHandle, Source};
use serde::{Deserialize, Serialize};
use std::io::Cursor;

use super::assets::{AssetError, AssetResolver};
use super::synth::{render_voice, SynthSettings};
use crate::gesture::{ActionSink, HitEvent, SinkError};
use crate::instruments::VoiceKind;

pub type BoxedSource = Box<dyn Source<Item = f32> + Send>;

/// Playback settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerSettings {
    /// Linear gain applied to every sound (0.0 - 2.0)
    pub volume: f32,

    /// Synthesize a tone when a zone has no sound file
    pub synth_fallback: bool,

    pub synth: SynthSettings,
}

impl Default for PlayerSettings {
    fn default() -> Self {
        Self {
            volume: 1.0,
            synth_fallback: true,
            synth: SynthSettings::default(),
        }
    }
}

/// Resolves the sound for a hit and builds a playable source
pub struct SoundBank<R: AssetResolver> {
    resolver: R,
    voice: VoiceKind,
    settings: PlayerSettings,
}

impl<R: AssetResolver> SoundBank<R> {
    pub fn new(resolver: R, voice: VoiceKind, settings: PlayerSettings) -> Self {
        let settings = PlayerSettings {
            volume: settings.volume.clamp(0.0, 2.0),
            ..settings
        };
        Self {
            resolver,
            voice,
            settings,
        }
    }

    pub fn settings(&self) -> &PlayerSettings {
        &self.settings
    }

    /// Resolve every name up front, returning the ones without a sound file
    pub fn preload<'a>(&mut self, names: impl IntoIterator<Item = &'a str>) -> Vec<String> {
        let mut missing = Vec::new();
        for name in names {
            match self.resolver.resolve(name) {
                Ok(_) => {}
                Err(AssetError::NotFound(_)) => missing.push(name.to_string()),
                Err(e) => {
                    log::warn!("Failed to load sound {}: {}", name, e);
                    missing.push(name.to_string());
                }
            }
        }
        missing
    }

    /// Source for a hit: the zone's sound file, else a synthesized voice
    pub fn source_for(&mut self, hit: &HitEvent) -> Result<BoxedSource, SinkError> {
        let volume = self.settings.volume;

        match self.resolver.resolve(&hit.zone) {
            Ok(bytes) => {
                let decoder = Decoder::new(Cursor::new(bytes)).map_err(|e| {
                    SinkError::Playback(format!("Failed to decode sound for {}: {}", hit.zone, e))
                })?;
                Ok(Box::new(decoder.convert_samples::<f32>().amplify(volume)))
            }
            Err(AssetError::NotFound(name)) if self.settings.synth_fallback => {
                let note = hit.midi_note.ok_or(SinkError::MissingSound(name))?;
                let synth = &self.settings.synth;
                let samples = render_voice(self.voice, note, synth);
                Ok(Box::new(
                    SamplesBuffer::new(1, synth.sample_rate, samples).amplify(volume),
                ))
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// Action sink that plays each hit on the default audio output
pub struct SamplePlayer<R: AssetResolver> {
    bank: SoundBank<R>,
    // Dropping the stream stops playback
    _stream: OutputStream,
    handle: OutputStreamHandle,
}

impl<R: AssetResolver> SamplePlayer<R> {
    /// Open the default output device
    pub fn open(bank: SoundBank<R>) -> Result<Self, SinkError> {
        let (stream, handle) = OutputStream::try_default()
            .map_err(|e| SinkError::Playback(format!("No audio output: {}", e)))?;
        log::info!("Audio output opened");
        Ok(Self {
            bank,
            _stream: stream,
            handle,
        })
    }
}

impl<R: AssetResolver> ActionSink for SamplePlayer<R> {
    fn trigger(&mut self, hit: &HitEvent) -> Result<(), SinkError> {
        let source = self.bank.source_for(hit)?;
        self.handle
            .play_raw(source)
            .map_err(|e| SinkError::Playback(e.to_string()))
    }
}
