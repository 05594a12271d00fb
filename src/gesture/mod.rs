// Gesture module
// Fingertip strike detection, hit zones, cooldowns and action dispatch

pub mod cooldown;
pub mod dispatcher;
pub mod history;
pub mod sink;
pub mod types;

pub use cooldown::CooldownTable;
pub use dispatcher::{DispatcherConfig, HandPhase, ZoneDispatcher};
pub use history::HandHistory;
pub use sink::{ActionSink, HitRecorder, SinkChain, SinkError};
pub use types::{FingertipSample, HitEvent, Zone, FLASH_WINDOW};
