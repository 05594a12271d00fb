// Audio module
// Sound lookup, fallback synthesis and playback for struck zones

pub mod assets;
pub mod player;
pub mod synth;

pub use assets::{default_asset_dir, AssetError, AssetResolver, DirectoryResolver, MemoryResolver};
pub use player::{PlayerSettings, SamplePlayer, SoundBank};
pub use synth::{encode_wav, midi_to_freq, render_instrument_samples, render_voice, SynthSettings};
