// Sound asset resolution
// Maps zone names to playable sample bytes without hard-coding any storage layout

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

use crate::gesture::SinkError;

/// File extensions tried when no manifest entry exists, in order
pub const SUPPORTED_EXTENSIONS: [&str; 4] = ["wav", "mp3", "ogg", "flac"];

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("No sound asset for {0}")]
    NotFound(String),

    #[error("Failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid asset manifest: {0}")]
    Manifest(#[from] serde_json::Error),

    #[error("Failed to get app data directory")]
    NoAppDataDir,
}

impl From<AssetError> for SinkError {
    fn from(error: AssetError) -> Self {
        match error {
            AssetError::NotFound(name) => SinkError::MissingSound(name),
            other => SinkError::Playback(other.to_string()),
        }
    }
}

/// Capability to turn a sound name into encoded audio bytes
pub trait AssetResolver {
    fn resolve(&mut self, name: &str) -> Result<Arc<[u8]>, AssetError>;
}

/// Resolves sounds from files under a root directory.
///
/// A manifest entry (name -> path, relative to the root unless absolute)
/// takes precedence; otherwise `<name>.<ext>` and `<lowercase name>.<ext>`
/// are tried for each supported extension. Loaded files are cached.
#[derive(Debug, Clone)]
pub struct DirectoryResolver {
    root: PathBuf,
    manifest: HashMap<String, PathBuf>,
    cache: HashMap<String, Arc<[u8]>>,
}

impl DirectoryResolver {
    /// Resolve by probing file names under `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        DirectoryResolver {
            root: root.into(),
            manifest: HashMap::new(),
            cache: HashMap::new(),
        }
    }

    /// Resolve with explicit name -> file mappings
    pub fn with_manifest(root: impl Into<PathBuf>, manifest: HashMap<String, PathBuf>) -> Self {
        DirectoryResolver {
            root: root.into(),
            manifest,
            cache: HashMap::new(),
        }
    }

    /// Load a JSON manifest (`{"SNARE": "snare.mp3", ...}`) from disk
    pub fn load_manifest(path: &Path) -> Result<HashMap<String, PathBuf>, AssetError> {
        let data = fs::read(path).map_err(|source| AssetError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_slice(&data)?)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path a name resolves to, if a matching file exists
    pub fn locate(&self, name: &str) -> Option<PathBuf> {
        if let Some(entry) = self.manifest.get(name) {
            let path = if entry.is_absolute() {
                entry.clone()
            } else {
                self.root.join(entry)
            };
            return path.is_file().then_some(path);
        }

        let lower = name.to_lowercase();
        for ext in SUPPORTED_EXTENSIONS.iter() {
            for stem in [name, lower.as_str()] {
                let candidate = self.root.join(format!("{}.{}", stem, ext));
                if candidate.is_file() {
                    return Some(candidate);
                }
            }
        }
        None
    }
}

impl AssetResolver for DirectoryResolver {
    fn resolve(&mut self, name: &str) -> Result<Arc<[u8]>, AssetError> {
        if let Some(bytes) = self.cache.get(name) {
            return Ok(Arc::clone(bytes));
        }

        let path = self
            .locate(name)
            .ok_or_else(|| AssetError::NotFound(name.to_string()))?;
        let data = fs::read(&path).map_err(|source| AssetError::Io {
            path: path.clone(),
            source,
        })?;

        log::debug!("Loaded sound {} from {}", name, path.display());
        let bytes: Arc<[u8]> = Arc::from(data);
        self.cache.insert(name.to_string(), Arc::clone(&bytes));
        Ok(bytes)
    }
}

/// In-memory resolver, mostly for tests and embedded kits
#[derive(Debug, Clone, Default)]
pub struct MemoryResolver {
    assets: HashMap<String, Arc<[u8]>>,
}

impl MemoryResolver {
    pub fn new() -> Self {
        MemoryResolver::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, data: Vec<u8>) {
        self.assets.insert(name.into(), Arc::from(data));
    }
}

impl AssetResolver for MemoryResolver {
    fn resolve(&mut self, name: &str) -> Result<Arc<[u8]>, AssetError> {
        self.assets
            .get(name)
            .cloned()
            .ok_or_else(|| AssetError::NotFound(name.to_string()))
    }
}

/// Default asset directory for an instrument, created if missing
pub fn default_asset_dir(instrument: &str) -> Result<PathBuf, AssetError> {
    let data_dir = dirs::data_dir().ok_or(AssetError::NoAppDataDir)?;
    let dir = data_dir
        .join("air-instruments")
        .join("assets")
        .join(instrument.to_lowercase());
    fs::create_dir_all(&dir).map_err(|source| AssetError::Io {
        path: dir.clone(),
        source,
    })?;
    Ok(dir)
}
