// Hand history
// Bounded buffer of recent fingertip y positions for one hand

use std::collections::VecDeque;

/// The most recent fingertip y-coordinates of one hand, oldest first.
/// Pushing onto a full buffer evicts the oldest sample.
#[derive(Debug, Clone)]
pub struct HandHistory {
    samples: VecDeque<f32>,
    capacity: usize,
}

impl HandHistory {
    /// Create an empty history holding at most `capacity` samples
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        HandHistory {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a sample, evicting the oldest one on overflow
    pub fn push(&mut self, y: f32) {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(y);
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_full(&self) -> bool {
        self.samples.len() == self.capacity
    }

    /// Newest minus oldest sample, once the window is full.
    /// Positive values mean the fingertip moved down the frame.
    pub fn velocity(&self) -> Option<f32> {
        if !self.is_full() {
            return None;
        }
        let newest = self.samples.back()?;
        let oldest = self.samples.front()?;
        Some(newest - oldest)
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_velocity_undefined_until_full() {
        let mut history = HandHistory::new(5);
        for y in [100.0, 102.0, 105.0, 110.0] {
            history.push(y);
            assert_eq!(history.velocity(), None);
        }

        history.push(120.0);
        assert!(history.is_full());
        assert_eq!(history.velocity(), Some(20.0));
    }

    #[test]
    fn test_oldest_sample_evicted() {
        let mut history = HandHistory::new(3);
        for y in [10.0, 20.0, 30.0, 40.0] {
            history.push(y);
        }

        assert_eq!(history.len(), 3);
        // Window is now [20, 30, 40]
        assert_eq!(history.velocity(), Some(20.0));
    }

    #[test]
    fn test_upward_motion_is_negative() {
        let mut history = HandHistory::new(2);
        history.push(300.0);
        history.push(250.0);
        assert_eq!(history.velocity(), Some(-50.0));
    }

    #[test]
    fn test_clear_restarts_warm_up() {
        let mut history = HandHistory::new(2);
        history.push(1.0);
        history.push(2.0);
        assert!(history.velocity().is_some());

        history.clear();
        assert!(history.is_empty());
        assert_eq!(history.velocity(), None);
    }

    #[test]
    fn test_zero_capacity_is_raised_to_one() {
        let history = HandHistory::new(0);
        assert_eq!(history.capacity(), 1);
    }
}
