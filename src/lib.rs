// Air Instruments - gesture-controlled drums and piano
// Module declarations

pub mod audio;
pub mod config;
pub mod gesture;
pub mod instruments;
pub mod session;
pub mod tracking;

pub use config::{ConfigError, KitConfig};
pub use gesture::{
    ActionSink, DispatcherConfig, FingertipSample, HitEvent, HitRecorder, SinkChain, SinkError,
    Zone, ZoneDispatcher,
};
pub use instruments::{get_instrument, list_instruments, Instrument, VoiceKind};
pub use session::{Session, SessionError, SessionSummary};
pub use tracking::{FrameGeometry, ObservationSource, TrackedFrame};
