// Tracking module
// Hand landmark input for the dispatcher

pub mod landmarks;
pub mod source;

pub use landmarks::{
    parse_frame, FrameGeometry, FrameMessage, HandObservation, Landmark, TrackedFrame,
    INDEX_FINGER_TIP, LANDMARK_COUNT,
};
pub use source::{BridgeSource, JsonLinesSource, ObservationSource, TrackingError};
