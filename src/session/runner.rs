// Session loop
// Pulls frames from an observation source and feeds them to the dispatcher

use std::time::{Duration, Instant};
use thiserror::Error;

use crate::audio::AssetError;
use crate::config::ConfigError;
use crate::gesture::{ActionSink, HitEvent, HitRecorder, SinkError, ZoneDispatcher};
use crate::tracking::{ObservationSource, TrackedFrame, TrackingError};

use super::midi::MidiError;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Tracking error: {0}")]
    Tracking(#[from] TrackingError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Asset error: {0}")]
    Asset(#[from] AssetError),

    #[error("Audio error: {0}")]
    Sink(#[from] SinkError),

    #[error("MIDI export error: {0}")]
    Midi(#[from] MidiError),

    #[error("Sample rendering error: {0}")]
    Render(#[from] hound::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Counters reported when a session ends
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionSummary {
    /// Frames handed to the dispatcher
    pub frames: u64,

    /// Fingertip observations across those frames
    pub observations: u64,

    /// Hits accepted by the dispatcher
    pub hits: u64,
}

/// Records every hit before passing it on
struct Tee<'a> {
    sink: &'a mut dyn ActionSink,
    recorder: Option<&'a mut HitRecorder>,
}

impl ActionSink for Tee<'_> {
    fn trigger(&mut self, hit: &HitEvent) -> Result<(), SinkError> {
        if let Some(recorder) = self.recorder.as_deref_mut() {
            recorder.trigger(hit)?;
        }
        self.sink.trigger(hit)
    }
}

/// One performance: a frame source, a dispatcher and the sink it drives
pub struct Session<S: ObservationSource> {
    source: S,
    dispatcher: ZoneDispatcher,
    sink: Box<dyn ActionSink>,
    recorder: Option<HitRecorder>,
    started: Instant,
    first_timestamp: Option<f64>,
    last_now: Option<Instant>,
}

impl<S: ObservationSource> Session<S> {
    pub fn new(source: S, dispatcher: ZoneDispatcher, sink: Box<dyn ActionSink>) -> Self {
        Self {
            source,
            dispatcher,
            sink,
            recorder: None,
            started: Instant::now(),
            first_timestamp: None,
            last_now: None,
        }
    }

    /// Measure hit times from `started` instead of construction time
    pub fn started_at(mut self, started: Instant) -> Self {
        self.started = started;
        self
    }

    /// Keep every accepted hit for later export
    pub fn with_recording(mut self) -> Self {
        self.recorder = Some(HitRecorder::new());
        self
    }

    /// Instant all hit times are measured from
    pub fn started(&self) -> Instant {
        self.started
    }

    pub fn dispatcher(&self) -> &ZoneDispatcher {
        &self.dispatcher
    }

    /// Hits recorded so far (empty unless recording)
    pub fn recorded_hits(&self) -> &[HitEvent] {
        self.recorder.as_ref().map(|r| r.hits()).unwrap_or(&[])
    }

    /// Run until the source is exhausted or a frame asks to quit
    pub fn run(&mut self) -> Result<SessionSummary, SessionError> {
        let mut summary = SessionSummary::default();
        let hits_before = self.dispatcher.hit_count();
        log::info!(
            "Session started with {} zones",
            self.dispatcher.zones().len()
        );

        while let Some(frame) = self.source.next_frame()? {
            if frame.quit {
                log::info!("Quit requested");
                break;
            }

            let now = self.frame_instant(&frame);
            summary.frames += 1;
            summary.observations += frame.samples.len() as u64;

            let mut tee = Tee {
                sink: self.sink.as_mut(),
                recorder: self.recorder.as_mut(),
            };
            self.dispatcher.process_frame(&frame.samples, now, &mut tee);
        }

        summary.hits = self.dispatcher.hit_count() - hits_before;
        log::info!(
            "Session ended: {} frames, {} observations, {} hits",
            summary.frames,
            summary.observations,
            summary.hits
        );
        Ok(summary)
    }

    /// Frame time: the session start plus the timestamp offset from the first
    /// stamped frame, or the wall clock for unstamped frames. Never goes backwards.
    /// An offset too large to represent keeps the previous frame time.
    fn frame_instant(&mut self, frame: &TrackedFrame) -> Instant {
        let now = match frame.timestamp {
            Some(ts) if ts.is_finite() => {
                let first = *self.first_timestamp.get_or_insert(ts);
                Duration::try_from_secs_f64((ts - first).max(0.0))
                    .ok()
                    .and_then(|offset| self.started.checked_add(offset))
                    .unwrap_or_else(|| {
                        log::warn!("Frame timestamp {} out of range, ignoring it", ts);
                        self.last_now.unwrap_or(self.started)
                    })
            }
            _ => Instant::now(),
        };

        let now = match self.last_now {
            Some(last) if now < last => last,
            _ => now,
        };
        self.last_now = Some(now);
        now
    }
}
