// Cooldown table
// Last accepted trigger time per (hand, zone) pair

use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Debounce state: a (hand, zone) pair may fire again only once
/// strictly more than `cooldown` has elapsed since its last accepted fire.
#[derive(Debug, Clone)]
pub struct CooldownTable {
    /// hand label -> zone name -> last fire time
    last_fire: HashMap<String, HashMap<String, Instant>>,
    cooldown: Duration,
}

impl CooldownTable {
    pub fn new(cooldown: Duration) -> Self {
        CooldownTable {
            last_fire: HashMap::new(),
            cooldown,
        }
    }

    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    /// Time of the last accepted fire for a pair, if any
    pub fn last_fire(&self, hand: &str, zone: &str) -> Option<Instant> {
        self.last_fire
            .get(hand)
            .and_then(|zones| zones.get(zone))
            .copied()
    }

    /// Whether the pair is allowed to fire at `now`.
    /// A pair that never fired is always ready.
    pub fn is_ready(&self, hand: &str, zone: &str, now: Instant) -> bool {
        match self.last_fire(hand, zone) {
            Some(last) => now.saturating_duration_since(last) > self.cooldown,
            None => true,
        }
    }

    /// Record a fire for the pair at `now`
    pub fn record(&mut self, hand: &str, zone: &str, now: Instant) {
        self.last_fire
            .entry(hand.to_string())
            .or_default()
            .insert(zone.to_string(), now);
    }

    /// Check and record in one step. Returns true if the fire was accepted.
    pub fn try_fire(&mut self, hand: &str, zone: &str, now: Instant) -> bool {
        if !self.is_ready(hand, zone, now) {
            return false;
        }
        self.record(hand, zone, now);
        true
    }

    pub fn clear(&mut self) {
        self.last_fire.clear();
    }
}
