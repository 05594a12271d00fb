// Kit configuration
// JSON file describing which instrument to play and how to detect strikes

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::audio::{default_asset_dir, AssetError, DirectoryResolver, PlayerSettings};
use crate::gesture::DispatcherConfig;
use crate::instruments::{get_instrument, list_instrument_names, Instrument};
use crate::session::MidiExportOptions;
use crate::tracking::FrameGeometry;

/// Largest accepted frame width or height, in pixels
pub const MAX_FRAME_DIMENSION: u32 = 16384;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Unknown instrument '{name}' (available: {available})")]
    UnknownInstrument { name: String, available: String },

    #[error("Invalid layout: {0}")]
    InvalidLayout(String),

    #[error("Invalid tunables: {0}")]
    InvalidTunables(String),

    #[error(transparent)]
    Asset(#[from] AssetError),
}

/// Everything needed to start a session
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KitConfig {
    /// Built-in instrument name ("DRUMS" or "PIANO")
    pub instrument: String,

    /// Zone layout JSON to use instead of the built-in instrument
    pub layout_path: Option<PathBuf>,

    pub frame: FrameGeometry,

    pub velocity_threshold: f32,
    pub cooldown_secs: f64,
    pub history_length: usize,
    pub reset_on_absence: bool,

    /// Overrides the instrument's own zone margin
    pub zone_margin: Option<f32>,

    /// Sound files; defaults to the per-instrument app data directory
    pub asset_dir: Option<PathBuf>,

    /// Name -> file manifest, relative to the asset directory
    pub manifest: Option<PathBuf>,

    pub player: PlayerSettings,

    /// Append every hit to this JSONL file
    pub trace_path: Option<PathBuf>,

    /// Write the performance to this MIDI file when the session ends
    pub midi_out: Option<PathBuf>,

    pub midi: MidiExportOptions,

    /// Landmark bridge command line; frames are read from stdin when empty
    pub bridge_command: Vec<String>,
}

impl Default for KitConfig {
    fn default() -> Self {
        let dispatcher = DispatcherConfig::default();
        Self {
            instrument: "DRUMS".to_string(),
            layout_path: None,
            frame: FrameGeometry::default(),
            velocity_threshold: dispatcher.velocity_threshold,
            cooldown_secs: dispatcher.cooldown_secs,
            history_length: dispatcher.history_length,
            reset_on_absence: dispatcher.reset_on_absence,
            zone_margin: None,
            asset_dir: None,
            manifest: None,
            player: PlayerSettings::default(),
            trace_path: None,
            midi_out: None,
            midi: MidiExportOptions::default(),
            bridge_command: Vec::new(),
        }
    }
}

impl KitConfig {
    pub fn from_json_bytes(data: &[u8]) -> Result<Self, ConfigError> {
        let config: KitConfig = serde_json::from_slice(data)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let data = std::fs::read(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_json_bytes(&data)?;
        log::info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn to_json_bytes(&self) -> Result<Vec<u8>, ConfigError> {
        Ok(serde_json::to_vec_pretty(self)?)
    }

    /// Check the tunables without resolving the instrument
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.frame.width == 0 || self.frame.height == 0 {
            return Err(ConfigError::InvalidTunables(format!(
                "frame size must be non-zero, got {}x{}",
                self.frame.width, self.frame.height
            )));
        }
        if self.frame.width > MAX_FRAME_DIMENSION || self.frame.height > MAX_FRAME_DIMENSION {
            return Err(ConfigError::InvalidTunables(format!(
                "frame size must be at most {}x{}, got {}x{}",
                MAX_FRAME_DIMENSION, MAX_FRAME_DIMENSION, self.frame.width, self.frame.height
            )));
        }
        if !(0.0..=1.0).contains(&self.frame.min_confidence) {
            return Err(ConfigError::InvalidTunables(format!(
                "min_confidence must be within 0-1, got {}",
                self.frame.min_confidence
            )));
        }
        self.tunables(0.0)
            .validate()
            .map_err(ConfigError::InvalidTunables)
    }

    /// The instrument to play: the layout file if given, else the built-in
    pub fn instrument(&self) -> Result<Instrument, ConfigError> {
        let instrument = match &self.layout_path {
            Some(path) => {
                let data = std::fs::read(path).map_err(|source| ConfigError::Io {
                    path: path.clone(),
                    source,
                })?;
                Instrument::from_json_bytes(&data)?
            }
            None => get_instrument(&self.instrument, self.frame.width, self.frame.height)
                .ok_or_else(|| ConfigError::UnknownInstrument {
                    name: self.instrument.clone(),
                    available: list_instrument_names().join(", "),
                })?,
        };

        instrument.validate().map_err(ConfigError::InvalidLayout)?;
        Ok(instrument)
    }

    /// Dispatcher tunables for an instrument
    pub fn dispatcher_config(
        &self,
        instrument: &Instrument,
    ) -> Result<DispatcherConfig, ConfigError> {
        let config = self.tunables(instrument.zone_margin);
        config.validate().map_err(ConfigError::InvalidTunables)?;
        Ok(config)
    }

    fn tunables(&self, default_margin: f32) -> DispatcherConfig {
        DispatcherConfig {
            velocity_threshold: self.velocity_threshold,
            cooldown_secs: self.cooldown_secs,
            zone_margin: self.zone_margin.unwrap_or(default_margin),
            history_length: self.history_length,
            reset_on_absence: self.reset_on_absence,
        }
    }

    /// Sound directory for an instrument
    pub fn asset_dir(&self, instrument: &Instrument) -> Result<PathBuf, ConfigError> {
        match &self.asset_dir {
            Some(dir) => Ok(dir.clone()),
            None => Ok(default_asset_dir(&instrument.name)?),
        }
    }

    /// Resolver over the configured asset directory and manifest
    pub fn resolver(&self, instrument: &Instrument) -> Result<DirectoryResolver, ConfigError> {
        let root = self.asset_dir(instrument)?;
        match &self.manifest {
            Some(path) => {
                let path = if path.is_absolute() {
                    path.clone()
                } else {
                    root.join(path)
                };
                let manifest = DirectoryResolver::load_manifest(&path)?;
                Ok(DirectoryResolver::with_manifest(root, manifest))
            }
            None => Ok(DirectoryResolver::new(root)),
        }
    }
}
