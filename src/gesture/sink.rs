// Action sinks
// Side-effect targets invoked for every accepted hit

use thiserror::Error;

use super::types::HitEvent;

/// Errors an action sink may report. The dispatcher logs them and keeps going.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("No sound available for zone: {0}")]
    MissingSound(String),

    #[error("Playback failed: {0}")]
    Playback(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Fire-and-forget target for accepted hits (sound playback, trace, recording)
pub trait ActionSink {
    fn trigger(&mut self, hit: &HitEvent) -> Result<(), SinkError>;
}

impl<F> ActionSink for F
where
    F: FnMut(&HitEvent) -> Result<(), SinkError>,
{
    fn trigger(&mut self, hit: &HitEvent) -> Result<(), SinkError> {
        self(hit)
    }
}

/// Fans one hit out to several sinks.
/// Every sink is invoked even if an earlier one fails; the first error is returned.
#[derive(Default)]
pub struct SinkChain {
    sinks: Vec<Box<dyn ActionSink>>,
}

impl SinkChain {
    pub fn new() -> Self {
        SinkChain { sinks: Vec::new() }
    }

    /// Append a sink to the chain
    pub fn push(&mut self, sink: Box<dyn ActionSink>) {
        self.sinks.push(sink);
    }

    /// Builder-style append
    pub fn with(mut self, sink: Box<dyn ActionSink>) -> Self {
        self.push(sink);
        self
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl ActionSink for SinkChain {
    fn trigger(&mut self, hit: &HitEvent) -> Result<(), SinkError> {
        let mut first_error = None;
        for sink in self.sinks.iter_mut() {
            if let Err(e) = sink.trigger(hit) {
                if first_error.is_none() {
                    first_error = Some(e);
                } else {
                    log::warn!("Additional sink failure for {}: {}", hit.zone, e);
                }
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

/// In-memory log of accepted hits, in acceptance order
#[derive(Debug, Clone, Default)]
pub struct HitRecorder {
    hits: Vec<HitEvent>,
}

impl HitRecorder {
    pub fn new() -> Self {
        HitRecorder { hits: Vec::new() }
    }

    pub fn hits(&self) -> &[HitEvent] {
        &self.hits
    }

    pub fn len(&self) -> usize {
        self.hits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }

    /// Number of recorded hits on a zone
    pub fn count_for(&self, zone: &str) -> usize {
        self.hits.iter().filter(|h| h.zone == zone).count()
    }

    pub fn clear(&mut self) {
        self.hits.clear();
    }

    /// Consume the recorder and return its hits
    pub fn into_hits(self) -> Vec<HitEvent> {
        self.hits
    }
}

impl ActionSink for HitRecorder {
    fn trigger(&mut self, hit: &HitEvent) -> Result<(), SinkError> {
        self.hits.push(hit.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::time::Instant;

    fn create_test_hit(zone: &str) -> HitEvent {
        HitEvent {
            hand: "Left".to_string(),
            zone: zone.to_string(),
            midi_note: None,
            velocity: 12.0,
            at: Instant::now(),
        }
    }

    #[test]
    fn test_recorder_collects_hits() {
        let mut recorder = HitRecorder::new();
        recorder.trigger(&create_test_hit("SNARE")).unwrap();
        recorder.trigger(&create_test_hit("KICK")).unwrap();
        recorder.trigger(&create_test_hit("SNARE")).unwrap();

        assert_eq!(recorder.len(), 3);
        assert_eq!(recorder.count_for("SNARE"), 2);
        assert_eq!(recorder.hits()[1].zone, "KICK");
    }

    #[test]
    fn test_closure_sink() {
        let mut seen = Vec::new();
        {
            let mut sink = |hit: &HitEvent| -> Result<(), SinkError> {
                seen.push(hit.zone.clone());
                Ok(())
            };
            sink.trigger(&create_test_hit("TOM")).unwrap();
        }
        assert_eq!(seen, vec!["TOM".to_string()]);
    }

    #[test]
    fn test_chain_invokes_all_sinks_after_failure() {
        let calls = Rc::new(RefCell::new(Vec::new()));

        let failing_calls = Rc::clone(&calls);
        let failing = move |_: &HitEvent| -> Result<(), SinkError> {
            failing_calls.borrow_mut().push("failing");
            Err(SinkError::MissingSound("SNARE".to_string()))
        };

        let ok_calls = Rc::clone(&calls);
        let ok = move |_: &HitEvent| -> Result<(), SinkError> {
            ok_calls.borrow_mut().push("ok");
            Ok(())
        };

        let mut chain = SinkChain::new().with(Box::new(failing)).with(Box::new(ok));
        assert_eq!(chain.len(), 2);

        let result = chain.trigger(&create_test_hit("SNARE"));
        assert!(matches!(result, Err(SinkError::MissingSound(_))));
        assert_eq!(*calls.borrow(), vec!["failing", "ok"]);
    }

    #[test]
    fn test_empty_chain_succeeds() {
        let mut chain = SinkChain::new();
        assert!(chain.is_empty());
        assert!(chain.trigger(&create_test_hit("KICK")).is_ok());
    }
}
