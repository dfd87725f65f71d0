//! Per-key debounce logic.
//!
//! Each key has a signed integrator counter. A raw reading that disagrees
//! with the debounced state pushes the counter toward the threshold in the
//! direction of the new state (up for press, down for release), a reading
//! that agrees relaxes it one step back toward zero. When the counter
//! magnitude reaches the threshold, the debounced state flips and the
//! counter resets to zero.

use crate::config::DEBOUNCE_THRESHOLD;

/// Debounced key states: false = released, true = pressed.
pub type KeyStates<const ROW: usize, const COL: usize> = [[bool; COL]; ROW];

pub struct Debouncer<const ROW: usize, const COL: usize> {
    /// Debounced key states.
    state: KeyStates<ROW, COL>,
    /// Per-key counters, bounded to `[-threshold, threshold]`.
    counters: [[i8; COL]; ROW],
    threshold: i8,
}

impl<const ROW: usize, const COL: usize> Default for Debouncer<ROW, COL> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const ROW: usize, const COL: usize> Debouncer<ROW, COL> {
    pub const fn new() -> Self {
        Self::with_threshold(DEBOUNCE_THRESHOLD)
    }

    /// Create a debouncer confirming a change after `threshold` consistent
    /// readings. The threshold is clamped to `1..=127`.
    pub const fn with_threshold(threshold: u8) -> Self {
        let threshold = if threshold == 0 {
            1
        } else if threshold > i8::MAX as u8 {
            i8::MAX
        } else {
            threshold as i8
        };
        Self {
            state: [[false; COL]; ROW],
            counters: [[0; COL]; ROW],
            threshold,
        }
    }

    /// Feed one raw reading for a key. `pressed` is the logical reading
    /// (true = switch closed).
    ///
    /// Returns true when the debounced state flipped.
    pub fn update(&mut self, row: usize, col: usize, pressed: bool) -> bool {
        let stable = &mut self.state[row][col];
        let counter = &mut self.counters[row][col];

        match (pressed, *stable) {
            // Pending press
            (true, false) => *counter = (*counter + 1).min(self.threshold),
            // Pending release
            (false, true) => *counter = (*counter - 1).max(-self.threshold),
            // Raw agrees with debounced state, relax toward zero
            _ => *counter -= counter.signum(),
        }

        if counter.unsigned_abs() >= self.threshold.unsigned_abs() {
            *stable = pressed;
            *counter = 0;
            return true;
        }
        false
    }

    pub fn is_pressed(&self, row: usize, col: usize) -> bool {
        self.state[row][col]
    }

    pub fn counter(&self, row: usize, col: usize) -> i8 {
        self.counters[row][col]
    }

    pub fn threshold(&self) -> u8 {
        self.threshold as u8
    }

    pub fn state(&self) -> &KeyStates<ROW, COL> {
        &self.state
    }
}
