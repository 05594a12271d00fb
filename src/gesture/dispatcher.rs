// Gesture-to-Zone Dispatcher
// Turns per-frame fingertip samples into debounced zone hits
//
// Per observation:
// 1. Append y to the hand's bounded history
// 2. Once the history is full, velocity = newest - oldest
// 3. If velocity > threshold, find the first zone containing the fingertip
// 4. If that (hand, zone) pair is out of cooldown, fire the action sink

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::{Duration, Instant};

use super::cooldown::CooldownTable;
use super::history::HandHistory;
use super::sink::ActionSink;
use super::types::{FingertipSample, HitEvent, Zone};

/// Tunables for strike detection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatcherConfig {
    /// Minimum downward motion (pixels over the history window) for a strike.
    /// The comparison is strict: a velocity equal to the threshold does not trigger.
    pub velocity_threshold: f32,

    /// Minimum time between two accepted hits of the same (hand, zone) pair, in seconds
    pub cooldown_secs: f64,

    /// Inset applied to every zone before the containment test, in pixels
    pub zone_margin: f32,

    /// Number of y samples in the velocity window
    pub history_length: usize,

    /// Discard a hand's history as soon as a frame arrives without it.
    /// When false, stale samples stay until evicted by new ones.
    pub reset_on_absence: bool,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        DispatcherConfig {
            velocity_threshold: 8.0,
            cooldown_secs: 0.1,
            zone_margin: 10.0,
            history_length: 5,
            reset_on_absence: true,
        }
    }
}

impl DispatcherConfig {
    /// Cooldown as a Duration (negative values clamp to zero)
    pub fn cooldown(&self) -> Duration {
        Duration::from_secs_f64(self.cooldown_secs.max(0.0))
    }

    /// Validate the tunables
    pub fn validate(&self) -> Result<(), String> {
        if !self.velocity_threshold.is_finite() {
            return Err("velocity_threshold must be a finite number".to_string());
        }
        if !self.cooldown_secs.is_finite() || self.cooldown_secs < 0.0 {
            return Err(format!(
                "cooldown_secs must be a non-negative number, got {}",
                self.cooldown_secs
            ));
        }
        if !self.zone_margin.is_finite() || self.zone_margin < 0.0 {
            return Err(format!(
                "zone_margin must be a non-negative number, got {}",
                self.zone_margin
            ));
        }
        if self.history_length < 2 {
            return Err(format!(
                "history_length must be at least 2 to measure velocity, got {}",
                self.history_length
            ));
        }
        Ok(())
    }
}

/// Where a hand is in its detection lifecycle
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HandPhase {
    /// Missing from the latest frame (history may be retained)
    Absent,

    /// History still filling; no hit tests yet
    Warming { samples: usize },

    /// Velocity computed on every frame
    Active { velocity: f32 },
}

#[derive(Debug, Clone)]
struct HandState {
    history: HandHistory,
    velocity: Option<f32>,
    /// Seen in the latest frame
    present: bool,
}

impl HandState {
    fn new(capacity: usize) -> Self {
        HandState {
            history: HandHistory::new(capacity),
            velocity: None,
            present: true,
        }
    }
}

/// One instrument's strike detector: a zone list plus per-hand and per-pair state.
/// Instances are independent; nothing is shared between them.
pub struct ZoneDispatcher {
    config: DispatcherConfig,
    zones: Vec<Zone>,
    hands: HashMap<String, HandState>,
    cooldowns: CooldownTable,
    hit_count: u64,
}

impl ZoneDispatcher {
    /// Create a dispatcher over `zones`, tested in the given order
    pub fn new(zones: Vec<Zone>, config: DispatcherConfig) -> Self {
        let cooldowns = CooldownTable::new(config.cooldown());
        ZoneDispatcher {
            config,
            zones,
            hands: HashMap::new(),
            cooldowns,
            hit_count: 0,
        }
    }

    /// Create a dispatcher with default tunables
    pub fn with_defaults(zones: Vec<Zone>) -> Self {
        Self::new(zones, DispatcherConfig::default())
    }

    pub fn config(&self) -> &DispatcherConfig {
        &self.config
    }

    /// Zones in enumeration order, including their last hit times
    pub fn zones(&self) -> &[Zone] {
        &self.zones
    }

    pub fn cooldowns(&self) -> &CooldownTable {
        &self.cooldowns
    }

    /// Total hits accepted since creation or the last reset
    pub fn hit_count(&self) -> u64 {
        self.hit_count
    }

    /// Last computed velocity for a hand (None while warming or absent)
    pub fn velocity(&self, label: &str) -> Option<f32> {
        self.hands
            .get(label)
            .filter(|state| state.present)
            .and_then(|state| state.velocity)
    }

    pub fn hand_phase(&self, label: &str) -> HandPhase {
        match self.hands.get(label) {
            Some(state) if !state.present => HandPhase::Absent,
            None => HandPhase::Absent,
            Some(state) => match state.velocity {
                Some(velocity) => HandPhase::Active { velocity },
                None => HandPhase::Warming {
                    samples: state.history.len(),
                },
            },
        }
    }

    /// Labels of the hands holding history, present or not
    pub fn tracked_hands(&self) -> Vec<&str> {
        let mut labels: Vec<&str> = self.hands.keys().map(|s| s.as_str()).collect();
        labels.sort_unstable();
        labels
    }

    /// Forget all hands, cooldowns and flash times
    pub fn reset(&mut self) {
        self.hands.clear();
        self.cooldowns.clear();
        self.hit_count = 0;
        for zone in self.zones.iter_mut() {
            zone.last_hit = None;
        }
    }

    /// Process one frame of observations.
    ///
    /// Each observation yields at most one hit. Sink failures are logged and
    /// do not interrupt the frame.
    pub fn process_frame(
        &mut self,
        observations: &[FingertipSample],
        now: Instant,
        sink: &mut dyn ActionSink,
    ) {
        if self.config.reset_on_absence {
            self.drop_absent_hands(observations);
        } else {
            for state in self.hands.values_mut() {
                state.present = false;
            }
        }

        for observation in observations {
            self.process_observation(observation, now, sink);
        }
    }

    fn drop_absent_hands(&mut self, observations: &[FingertipSample]) {
        self.hands.retain(|label, _| {
            let present = observations.iter().any(|o| &o.label == label);
            if !present {
                log::debug!("Hand {} lost, discarding its history", label);
            }
            present
        });
    }

    fn process_observation(
        &mut self,
        observation: &FingertipSample,
        now: Instant,
        sink: &mut dyn ActionSink,
    ) {
        let capacity = self.config.history_length;
        let state = self
            .hands
            .entry(observation.label.clone())
            .or_insert_with(|| {
                log::debug!("Hand {} appeared", observation.label);
                HandState::new(capacity)
            });

        state.present = true;
        state.history.push(observation.y);
        state.velocity = state.history.velocity();

        // Warm-up, or not moving down fast enough
        let velocity = match state.velocity {
            Some(v) if v > self.config.velocity_threshold => v,
            _ => return,
        };

        // First match wins
        let margin = self.config.zone_margin;
        let zone = match self
            .zones
            .iter_mut()
            .find(|zone| zone.contains(observation.x, observation.y, margin))
        {
            Some(zone) => zone,
            None => return,
        };

        if !self.cooldowns.try_fire(&observation.label, &zone.name, now) {
            log::debug!(
                "{} on {} suppressed by cooldown",
                observation.label,
                zone.name
            );
            return;
        }

        zone.mark_hit(now);
        self.hit_count += 1;

        let hit = HitEvent {
            hand: observation.label.clone(),
            zone: zone.name.clone(),
            midi_note: zone.midi_note,
            velocity,
            at: now,
        };

        log::debug!(
            "Hit: {} struck {} (velocity {:.1})",
            hit.hand,
            hit.zone,
            hit.velocity
        );

        if let Err(e) = sink.trigger(&hit) {
            log::warn!("Action for {} failed: {}", hit.zone, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gesture::sink::{HitRecorder, SinkError};

    const SNARE_X: f32 = 150.0;

    fn create_test_zones() -> Vec<Zone> {
        vec![
            Zone::new("HIHAT", 0.0, 0.0, 100.0, 100.0),
            Zone::new("SNARE", 100.0, 100.0, 200.0, 300.0),
        ]
    }

    fn create_test_dispatcher() -> ZoneDispatcher {
        ZoneDispatcher::with_defaults(create_test_zones())
    }

    /// Feed a run of y samples for one hand, one frame each, 10ms apart
    fn feed(
        dispatcher: &mut ZoneDispatcher,
        label: &str,
        x: f32,
        ys: &[f32],
        start: Instant,
        recorder: &mut HitRecorder,
    ) -> Instant {
        let mut now = start;
        for &y in ys {
            dispatcher.process_frame(&[FingertipSample::new(label, x, y)], now, recorder);
            now += Duration::from_millis(10);
        }
        now
    }

    #[test]
    fn test_default_config() {
        let config = DispatcherConfig::default();
        assert_eq!(config.velocity_threshold, 8.0);
        assert_eq!(config.cooldown(), Duration::from_millis(100));
        assert_eq!(config.history_length, 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = DispatcherConfig::default();
        config.history_length = 1;
        assert!(config.validate().is_err());

        let mut config = DispatcherConfig::default();
        config.zone_margin = -1.0;
        assert!(config.validate().is_err());

        let mut config = DispatcherConfig::default();
        config.cooldown_secs = f64::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_strike_fires_once() {
        // Left hand moves 100 -> 120 inside SNARE: velocity 20 > 8
        let mut dispatcher = create_test_dispatcher();
        let mut recorder = HitRecorder::new();
        let start = Instant::now();

        feed(
            &mut dispatcher,
            "Left",
            SNARE_X,
            &[100.0, 102.0, 105.0, 110.0, 120.0],
            start,
            &mut recorder,
        );

        assert_eq!(recorder.len(), 1);
        let hit = &recorder.hits()[0];
        assert_eq!(hit.zone, "SNARE");
        assert_eq!(hit.hand, "Left");
        assert_eq!(hit.velocity, 20.0);

        let hit_time = start + Duration::from_millis(40);
        assert_eq!(dispatcher.cooldowns().last_fire("Left", "SNARE"), Some(hit_time));
        assert_eq!(dispatcher.zones()[1].last_hit, Some(hit_time));
        assert_eq!(dispatcher.hit_count(), 1);
    }

    #[test]
    fn test_follow_up_within_cooldown_suppressed() {
        let mut dispatcher = create_test_dispatcher();
        let mut recorder = HitRecorder::new();
        let t0 = Instant::now();

        for (i, y) in [100.0, 102.0, 105.0, 110.0].iter().enumerate() {
            let at = t0 - Duration::from_millis(10 * (4 - i as u64));
            dispatcher.process_frame(
                &[FingertipSample::new("Left", SNARE_X, *y)],
                at,
                &mut recorder,
            );
        }
        dispatcher.process_frame(
            &[FingertipSample::new("Left", SNARE_X, 120.0)],
            t0,
            &mut recorder,
        );
        assert_eq!(recorder.len(), 1);

        // 0.05s later, still inside SNARE, window [105,110,120,...] still moving down fast
        dispatcher.process_frame(
            &[FingertipSample::new("Left", SNARE_X, 135.0)],
            t0 + Duration::from_millis(50),
            &mut recorder,
        );
        assert!(dispatcher.velocity("Left").unwrap() > 8.0);
        assert_eq!(recorder.len(), 1);
    }

    #[test]
    fn test_hit_accepted_after_cooldown() {
        let mut dispatcher = create_test_dispatcher();
        let mut recorder = HitRecorder::new();
        let t0 = Instant::now();

        feed(
            &mut dispatcher,
            "Left",
            SNARE_X,
            &[100.0, 102.0, 105.0, 110.0, 120.0],
            t0,
            &mut recorder,
        );
        assert_eq!(recorder.len(), 1);

        // Last sample at t0+40ms fired; t0+150ms is 110ms later
        dispatcher.process_frame(
            &[FingertipSample::new("Left", SNARE_X, 140.0)],
            t0 + Duration::from_millis(150),
            &mut recorder,
        );
        assert_eq!(recorder.len(), 2);
    }

    #[test]
    fn test_warm_up_never_hits() {
        let mut dispatcher = create_test_dispatcher();
        let mut recorder = HitRecorder::new();
        let start = Instant::now();

        // Huge jumps, but only four samples
        feed(&mut dispatcher, "Right", SNARE_X, &[0.0, 200.0, 0.0, 250.0], start, &mut recorder);

        assert!(recorder.is_empty());
        assert_eq!(dispatcher.hand_phase("Right"), HandPhase::Warming { samples: 4 });
        assert_eq!(dispatcher.velocity("Right"), None);
    }

    #[test]
    fn test_velocity_equal_to_threshold_does_not_fire() {
        let mut dispatcher = create_test_dispatcher();
        let mut recorder = HitRecorder::new();

        feed(
            &mut dispatcher,
            "Left",
            SNARE_X,
            &[150.0, 152.0, 154.0, 156.0, 158.0],
            Instant::now(),
            &mut recorder,
        );

        assert_eq!(dispatcher.velocity("Left"), Some(8.0));
        assert!(recorder.is_empty());
    }

    #[test]
    fn test_velocity_above_threshold_fires() {
        let mut dispatcher = create_test_dispatcher();
        let mut recorder = HitRecorder::new();

        feed(
            &mut dispatcher,
            "Left",
            SNARE_X,
            &[150.0, 152.0, 154.0, 156.0, 159.0],
            Instant::now(),
            &mut recorder,
        );

        assert_eq!(dispatcher.velocity("Left"), Some(9.0));
        assert_eq!(recorder.len(), 1);
    }

    #[test]
    fn test_upward_motion_ignored() {
        let mut dispatcher = create_test_dispatcher();
        let mut recorder = HitRecorder::new();

        feed(
            &mut dispatcher,
            "Left",
            SNARE_X,
            &[250.0, 220.0, 200.0, 180.0, 150.0],
            Instant::now(),
            &mut recorder,
        );

        assert!(recorder.is_empty());
        assert_eq!(dispatcher.hand_phase("Left"), HandPhase::Active { velocity: -100.0 });
    }

    #[test]
    fn test_margin_excludes_border_point() {
        let mut dispatcher = create_test_dispatcher();
        let mut recorder = HitRecorder::new();

        // x = 200 is SNARE's right border
        feed(
            &mut dispatcher,
            "Left",
            200.0,
            &[150.0, 160.0, 170.0, 180.0, 190.0],
            Instant::now(),
            &mut recorder,
        );
        assert!(recorder.is_empty());
    }

    #[test]
    fn test_margin_plus_one_inside_fires() {
        let mut dispatcher = create_test_dispatcher();
        let mut recorder = HitRecorder::new();

        // SNARE x2 = 200, margin = 10 -> 189 is margin + 1 inside
        feed(
            &mut dispatcher,
            "Left",
            189.0,
            &[150.0, 160.0, 170.0, 180.0, 190.0],
            Instant::now(),
            &mut recorder,
        );
        assert_eq!(recorder.len(), 1);
    }

    #[test]
    fn test_first_matching_zone_wins() {
        let zones = vec![
            Zone::new("WHITE", 0.0, 0.0, 200.0, 200.0),
            Zone::new("BLACK", 50.0, 0.0, 150.0, 200.0),
        ];

        for _ in 0..3 {
            let mut dispatcher = ZoneDispatcher::with_defaults(zones.clone());
            let mut recorder = HitRecorder::new();
            feed(
                &mut dispatcher,
                "Right",
                100.0,
                &[100.0, 110.0, 120.0, 130.0, 140.0],
                Instant::now(),
                &mut recorder,
            );

            assert_eq!(recorder.len(), 1);
            assert_eq!(recorder.hits()[0].zone, "WHITE");
        }
    }

    #[test]
    fn test_cooling_zone_does_not_fall_through() {
        let zones = vec![
            Zone::new("A", 0.0, 0.0, 200.0, 400.0),
            Zone::new("B", 0.0, 0.0, 200.0, 400.0),
        ];
        let mut dispatcher = ZoneDispatcher::with_defaults(zones);
        let mut recorder = HitRecorder::new();
        let t0 = Instant::now();

        feed(
            &mut dispatcher,
            "Left",
            100.0,
            &[100.0, 110.0, 120.0, 130.0, 140.0],
            t0,
            &mut recorder,
        );
        dispatcher.process_frame(
            &[FingertipSample::new("Left", 100.0, 150.0)],
            t0 + Duration::from_millis(60),
            &mut recorder,
        );

        assert_eq!(recorder.len(), 1);
        assert_eq!(recorder.count_for("B"), 0);
    }

    #[test]
    fn test_hands_have_independent_cooldowns() {
        let mut dispatcher = create_test_dispatcher();
        let mut recorder = HitRecorder::new();
        let mut now = Instant::now();

        for y in [100.0, 110.0, 120.0, 130.0, 140.0] {
            dispatcher.process_frame(
                &[
                    FingertipSample::new("Left", 120.0, y),
                    FingertipSample::new("Right", 180.0, y),
                ],
                now,
                &mut recorder,
            );
            now += Duration::from_millis(10);
        }

        assert_eq!(recorder.len(), 2);
        assert_eq!(recorder.count_for("SNARE"), 2);
    }

    #[test]
    fn test_absent_hand_history_discarded() {
        let mut dispatcher = create_test_dispatcher();
        let mut recorder = HitRecorder::new();
        let start = Instant::now();

        let now = feed(
            &mut dispatcher,
            "Left",
            SNARE_X,
            &[100.0, 101.0, 102.0],
            start,
            &mut recorder,
        );
        assert_eq!(dispatcher.hand_phase("Left"), HandPhase::Warming { samples: 3 });

        // A frame with no hands
        dispatcher.process_frame(&[], now, &mut recorder);
        assert_eq!(dispatcher.hand_phase("Left"), HandPhase::Absent);

        // Returning hand warms up from scratch
        feed(&mut dispatcher, "Left", SNARE_X, &[103.0, 150.0, 200.0, 250.0], now, &mut recorder);
        assert!(recorder.is_empty());
        assert_eq!(dispatcher.hand_phase("Left"), HandPhase::Warming { samples: 4 });
    }

    #[test]
    fn test_absent_hand_history_kept_when_configured() {
        let config = DispatcherConfig {
            reset_on_absence: false,
            ..DispatcherConfig::default()
        };
        let mut dispatcher = ZoneDispatcher::new(create_test_zones(), config);
        let mut recorder = HitRecorder::new();
        let start = Instant::now();

        let now = feed(
            &mut dispatcher,
            "Left",
            SNARE_X,
            &[100.0, 102.0, 104.0, 106.0],
            start,
            &mut recorder,
        );
        dispatcher.process_frame(&[], now, &mut recorder);
        assert_eq!(dispatcher.hand_phase("Left"), HandPhase::Absent);
        assert_eq!(dispatcher.velocity("Left"), None);
        assert_eq!(dispatcher.tracked_hands(), vec!["Left"]);

        // The fifth sample completes the stale window immediately
        feed(&mut dispatcher, "Left", SNARE_X, &[130.0], now, &mut recorder);
        assert_eq!(recorder.len(), 1);
        assert_eq!(dispatcher.hand_phase("Left"), HandPhase::Active { velocity: 30.0 });
    }

    #[test]
    fn test_hand_phase_follows_presence_without_reset() {
        let config = DispatcherConfig {
            reset_on_absence: false,
            ..DispatcherConfig::default()
        };
        let mut dispatcher = ZoneDispatcher::new(create_test_zones(), config);
        let mut recorder = HitRecorder::new();

        let ys = [250.0, 240.0, 230.0, 220.0, 210.0];
        let now = feed(&mut dispatcher, "Right", 900.0, &ys, Instant::now(), &mut recorder);
        assert_eq!(dispatcher.hand_phase("Right"), HandPhase::Active { velocity: -40.0 });

        // Only the left hand in this frame
        let left = FingertipSample::new("Left", 900.0, 100.0);
        dispatcher.process_frame(&[left], now, &mut recorder);
        assert_eq!(dispatcher.hand_phase("Right"), HandPhase::Absent);
        assert_eq!(dispatcher.hand_phase("Left"), HandPhase::Warming { samples: 1 });

        // Back again with its retained window
        feed(&mut dispatcher, "Right", 900.0, &[200.0], now, &mut recorder);
        assert_eq!(dispatcher.hand_phase("Right"), HandPhase::Active { velocity: -40.0 });
        assert!(recorder.is_empty());
    }

    #[test]
    fn test_sink_failure_does_not_stop_processing() {
        let mut dispatcher = create_test_dispatcher();
        let mut failures = 0;
        let mut failing = |_: &HitEvent| -> Result<(), SinkError> {
            failures += 1;
            Err(SinkError::Playback("audio device unavailable".to_string()))
        };

        let mut now = Instant::now();
        for y in [100.0, 110.0, 120.0, 130.0, 140.0] {
            dispatcher.process_frame(
                &[FingertipSample::new("Left", SNARE_X, y)],
                now,
                &mut failing,
            );
            now += Duration::from_millis(10);
        }
        now += Duration::from_millis(200);
        dispatcher.process_frame(
            &[FingertipSample::new("Left", SNARE_X, 160.0)],
            now,
            &mut failing,
        );

        assert_eq!(failures, 2);
        assert_eq!(dispatcher.hit_count(), 2);
        assert!(dispatcher.zones()[1].last_hit.is_some());
    }

    #[test]
    fn test_outside_all_zones_is_not_an_event() {
        let mut dispatcher = create_test_dispatcher();
        let mut recorder = HitRecorder::new();

        feed(
            &mut dispatcher,
            "Left",
            900.0,
            &[100.0, 120.0, 140.0, 160.0, 180.0],
            Instant::now(),
            &mut recorder,
        );
        assert!(recorder.is_empty());
        assert_eq!(dispatcher.hand_phase("Left"), HandPhase::Active { velocity: 80.0 });
    }

    #[test]
    fn test_reset_clears_state() {
        let mut dispatcher = create_test_dispatcher();
        let mut recorder = HitRecorder::new();
        feed(
            &mut dispatcher,
            "Left",
            SNARE_X,
            &[100.0, 110.0, 120.0, 130.0, 140.0],
            Instant::now(),
            &mut recorder,
        );
        assert_eq!(dispatcher.hit_count(), 1);

        dispatcher.reset();
        assert_eq!(dispatcher.hit_count(), 0);
        assert!(dispatcher.tracked_hands().is_empty());
        assert!(dispatcher.zones().iter().all(|z| z.last_hit.is_none()));
        assert!(dispatcher.cooldowns().last_fire("Left", "SNARE").is_none());
    }

    #[test]
    fn test_independent_instances() {
        let mut a = create_test_dispatcher();
        let b = create_test_dispatcher();
        let mut recorder = HitRecorder::new();
        feed(
            &mut a,
            "Left",
            SNARE_X,
            &[100.0, 110.0, 120.0, 130.0, 140.0],
            Instant::now(),
            &mut recorder,
        );

        assert_eq!(a.hit_count(), 1);
        assert_eq!(b.hit_count(), 0);
        assert_eq!(b.hand_phase("Left"), HandPhase::Absent);
    }
}
