//! Consumer control (media key) report.
//!
//! Media keys live on the HID consumer page and travel in their own report,
//! a single 16-bit usage. The host keeps a usage active until it receives a
//! report without it, so the firmware only sends this report when the
//! usage changes.

use orion_keymap::{is_function_cell, lookup, resolve_layer, COLS, ROWS};

use crate::debounce::KeyStates;
use crate::report::FRAME_PREFIX;

/// Report ID of the consumer control input report.
pub const CONSUMER_REPORT_ID: u8 = 0x02;
/// Length of a transmitted consumer frame: prefix, report ID, usage.
pub const CONSUMER_FRAME_LEN: usize = 4;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ConsumerReport {
    usage: u16,
}

impl ConsumerReport {
    pub const fn new() -> Self {
        Self { usage: 0 }
    }

    pub fn usage(&self) -> u16 {
        self.usage
    }

    pub fn clear(&mut self) {
        self.usage = 0;
    }

    pub fn is_empty(&self) -> bool {
        self.usage == 0
    }

    /// Encode the wire frame, usage little-endian.
    pub fn frame(&self) -> [u8; CONSUMER_FRAME_LEN] {
        let [lo, hi] = self.usage.to_le_bytes();
        [FRAME_PREFIX, CONSUMER_REPORT_ID, lo, hi]
    }
}

/// Resolve the consumer usage from the debounced key state. The first
/// pressed media key in scan order wins.
pub fn assemble_consumer(keys: &KeyStates<ROWS, COLS>, report: &mut ConsumerReport) {
    report.clear();
    let layer = resolve_layer(keys);

    for (row, cols) in keys.iter().enumerate() {
        for (col, &pressed) in cols.iter().enumerate() {
            if !pressed || is_function_cell(row, col) {
                continue;
            }
            if let Some(usage) = lookup(layer, row, col).consumer_usage() {
                report.usage = usage;
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orion_keymap::{FN_COL, FN_ROW};

    fn pressed(cells: &[(usize, usize)]) -> KeyStates<ROWS, COLS> {
        let mut keys = [[false; COLS]; ROWS];
        for &(row, col) in cells {
            keys[row][col] = true;
        }
        keys
    }

    #[test]
    fn test_play_pause() {
        let mut report = ConsumerReport::new();
        assemble_consumer(&pressed(&[(1, 1), (1, 13)]), &mut report);
        assert_eq!(report.usage(), 0x00CD);
        assert_eq!(report.frame(), [0xA1, 0x02, 0xCD, 0x00]);
    }

    #[test]
    fn test_function_layer_media() {
        let mut report = ConsumerReport::new();
        // Fn + Up
        assemble_consumer(&pressed(&[(3, 13), (FN_ROW, FN_COL)]), &mut report);
        assert_eq!(report.usage(), 0x00E9);

        // Up alone is a keyboard key
        assemble_consumer(&pressed(&[(3, 13)]), &mut report);
        assert!(report.is_empty());
        assert_eq!(report.frame(), [0xA1, 0x02, 0x00, 0x00]);
    }

    #[test]
    fn test_first_media_key_wins() {
        let mut report = ConsumerReport::new();
        // Fn + Play (row 1) + Next (row 4)
        assemble_consumer(&pressed(&[(4, 13), (1, 13), (FN_ROW, FN_COL)]), &mut report);
        assert_eq!(report.usage(), 0x00CD);
    }
}
