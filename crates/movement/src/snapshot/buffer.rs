use std::collections::BTreeMap;

use crate::state::{ExtraMovementState, MotionState};

const DEFAULT_TICK_HISTORY: usize = 30;
const DEFAULT_SWITCH_POINT: f32 = 0.75;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TickState {
    pub motion: MotionState,
    pub extra: ExtraMovementState,
}

impl TickState {
    pub fn new(motion: MotionState, extra: ExtraMovementState) -> Self {
        Self { motion, extra }
    }
}

#[derive(Debug, Clone)]
pub struct TickStateBuffer {
    entries: BTreeMap<u32, TickState>,
    capacity: usize,
    switch_point: f32,
}

impl Default for TickStateBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_TICK_HISTORY, DEFAULT_SWITCH_POINT)
    }
}

impl TickStateBuffer {
    pub fn new(capacity: usize, switch_point: f32) -> Self {
        Self {
            entries: BTreeMap::new(),
            capacity: capacity.max(1),
            switch_point,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn record(&mut self, tick: u32, state: TickState) {
        self.entries.insert(tick, state);
        while self.entries.len() > self.capacity {
            self.entries.pop_first();
        }
    }

    pub fn get(&self, tick: u32) -> Option<TickState> {
        self.entries.get(&tick).copied()
    }

    /// Discrete state to show between two ticks. Switches to the arrival tick
    /// past the switch point; a miss on the chosen tick yields `None` and the
    /// caller keeps whatever it showed last.
    pub fn interpolate(&self, from_tick: u32, to_tick: u32, time_fraction: f32) -> Option<TickState> {
        if time_fraction <= self.switch_point {
            self.get(from_tick)
        } else {
            self.get(to_tick)
        }
    }

    pub fn oldest_tick(&self) -> Option<u32> {
        self.entries.keys().next().copied()
    }

    pub fn latest(&self) -> Option<(u32, TickState)> {
        self.entries.iter().next_back().map(|(tick, state)| (*tick, *state))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn state(motion: MotionState) -> TickState {
        TickState::new(motion, ExtraMovementState::None)
    }

    #[test]
    fn evicts_smallest_tick() {
        let mut buffer = TickStateBuffer::default();
        for tick in (0..40u32).rev() {
            buffer.record(tick, state(MotionState::NONE));
        }

        assert_eq!(buffer.len(), 30);
        // inserted newest-first, so the survivors are the 30 largest ticks
        assert_eq!(buffer.oldest_tick(), Some(10));
        assert!(buffer.get(9).is_none());
    }

    #[test]
    fn interpolation_switches_past_threshold() {
        let mut buffer = TickStateBuffer::default();
        buffer.record(10, state(MotionState::IS_GROUNDED));
        buffer.record(11, state(MotionState::IS_GROUNDED | MotionState::IS_DASH));

        assert_eq!(buffer.interpolate(10, 11, 0.0).unwrap().motion, MotionState::IS_GROUNDED);
        assert_eq!(buffer.interpolate(10, 11, 0.75).unwrap().motion, MotionState::IS_GROUNDED);
        assert!(buffer.interpolate(10, 11, 0.76).unwrap().motion.has(MotionState::IS_DASH));
    }

    #[test]
    fn missing_tick_is_not_an_error() {
        let mut buffer = TickStateBuffer::default();
        buffer.record(5, state(MotionState::FORWARD));

        assert!(buffer.interpolate(4, 5, 0.2).is_none());
        assert!(buffer.interpolate(5, 6, 0.9).is_none());
    }

    #[test]
    fn rerecording_a_tick_overwrites() {
        let mut buffer = TickStateBuffer::default();
        buffer.record(3, state(MotionState::NONE));
        buffer.record(3, state(MotionState::FORWARD));
        assert_eq!(buffer.len(), 1);
        assert_eq!(buffer.get(3).unwrap().motion, MotionState::FORWARD);
    }

    proptest! {
        #[test]
        fn never_exceeds_capacity(ticks in prop::collection::vec(any::<u32>(), 0..200)) {
            let mut buffer = TickStateBuffer::default();
            for tick in ticks {
                let smallest = buffer.oldest_tick();
                let was_full = buffer.len() == buffer.capacity() && buffer.get(tick).is_none();

                buffer.record(tick, state(MotionState::NONE));
                prop_assert!(buffer.len() <= 30);

                if was_full {
                    let evicted = match smallest {
                        Some(s) if s < tick => s,
                        _ => tick,
                    };
                    prop_assert!(buffer.get(evicted).is_none());
                }
            }
        }

        #[test]
        fn threshold_picks_side(t in 0.0f32..=1.0) {
            let mut buffer = TickStateBuffer::default();
            buffer.record(1, state(MotionState::IS_GROUNDED));
            buffer.record(2, state(MotionState::FORWARD));

            let picked = buffer.interpolate(1, 2, t).unwrap().motion;
            if t <= 0.75 {
                prop_assert_eq!(picked, MotionState::IS_GROUNDED);
            } else {
                prop_assert_eq!(picked, MotionState::FORWARD);
            }
        }
    }
}
