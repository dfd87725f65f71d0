//! HID keyboard report assembly and wire format.
//!
//! Each reporting cycle builds a fresh report from the debounced key
//! states: modifier keys go into the modifier bitmask, every other pressed
//! key appends its keycode in scan order until the report is full. Keys
//! beyond capacity are silently dropped (rollover limit).

use heapless::Vec;
use log::trace;
use orion_keymap::{is_function_cell, lookup, resolve_layer, Keycode, COLS, ROWS};

use crate::config::KEY_ROLLOVER;
use crate::consumer::CONSUMER_REPORT_ID;
use crate::debounce::KeyStates;

/// Bluetooth HID transaction header: DATA | Input.
pub const FRAME_PREFIX: u8 = 0xA1;
/// Report ID of the keyboard input report.
pub const REPORT_ID: u8 = 0x01;
/// Prefix, report ID, modifiers and reserved byte.
pub const FRAME_HEADER_LEN: usize = 4;
/// Length of a transmitted report frame.
pub const FRAME_LEN: usize = 20;

/// Modifier bits that turn the grave-escape key into Grave.
const SHIFT_OR_GUI: u8 = 0x02 | 0x08 | 0x20 | 0x80;

/// HID report descriptor: the keyboard collection, then the consumer
/// control collection. The keycode array holds `KEY_ROLLOVER` entries.
pub static HID_REPORT_DESCRIPTOR: &[u8] = &[
    0x05, 0x01, // Usage Page (Generic Desktop)
    0x09, 0x06, // Usage (Keyboard)
    0xA1, 0x01, // Collection (Application)
    0x85, REPORT_ID, //   Report ID
    // Modifier keys (8 bits)
    0x05, 0x07, //   Usage Page (Key Codes)
    0x19, 0xE0, //   Usage Minimum (224) - LCtrl
    0x29, 0xE7, //   Usage Maximum (231) - RGui
    0x15, 0x00, //   Logical Minimum (0)
    0x25, 0x01, //   Logical Maximum (1)
    0x75, 0x01, //   Report Size (1)
    0x95, 0x08, //   Report Count (8)
    0x81, 0x02, //   Input (Data, Variable, Absolute)
    // Reserved byte
    0x95, 0x01, //   Report Count (1)
    0x75, 0x08, //   Report Size (8)
    0x81, 0x01, //   Input (Constant)
    // LEDs (5 bits)
    0x95, 0x05, //   Report Count (5)
    0x75, 0x01, //   Report Size (1)
    0x05, 0x08, //   Usage Page (LEDs)
    0x19, 0x01, //   Usage Minimum (1)
    0x29, 0x05, //   Usage Maximum (5)
    0x91, 0x02, //   Output (Data, Variable, Absolute)
    // LED padding (3 bits)
    0x95, 0x01, //   Report Count (1)
    0x75, 0x03, //   Report Size (3)
    0x91, 0x01, //   Output (Constant)
    // Keycodes
    0x95, KEY_ROLLOVER as u8, //   Report Count (N)
    0x75, 0x08, //   Report Size (8)
    0x15, 0x00, //   Logical Minimum (0)
    0x26, 0xFF, 0x00, // Logical Maximum (255)
    0x05, 0x07, //   Usage Page (Key Codes)
    0x19, 0x00, //   Usage Minimum (0)
    0x29, 0xFF, //   Usage Maximum (255)
    0x81, 0x00, //   Input (Data, Array)
    0xC0, // End Collection
    // Consumer control (one 16-bit usage)
    0x05, 0x0C, // Usage Page (Consumer)
    0x09, 0x01, // Usage (Consumer Control)
    0xA1, 0x01, // Collection (Application)
    0x85, CONSUMER_REPORT_ID, //   Report ID
    0x15, 0x00, //   Logical Minimum (0)
    0x26, 0xFF, 0x03, // Logical Maximum (1023)
    0x19, 0x00, //   Usage Minimum (0)
    0x2A, 0xFF, 0x03, // Usage Maximum (1023)
    0x75, 0x10, //   Report Size (16)
    0x95, 0x01, //   Report Count (1)
    0x81, 0x00, //   Input (Data, Array)
    0xC0, // End Collection
];

/// Pending keyboard report holding up to `N` keycodes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyboardReport<const N: usize = KEY_ROLLOVER> {
    modifiers: u8,
    keys: Vec<u8, N>,
}

impl<const N: usize> Default for KeyboardReport<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> KeyboardReport<N> {
    const FITS_FRAME: () = assert!(N <= FRAME_LEN - FRAME_HEADER_LEN, "rollover exceeds frame");

    pub const fn new() -> Self {
        #[allow(clippy::let_unit_value)]
        let () = Self::FITS_FRAME;
        Self {
            modifiers: 0,
            keys: Vec::new(),
        }
    }

    /// Append a keycode. Returns false, dropping the key, when the report
    /// is already full.
    pub fn push_key(&mut self, keycode: u8) -> bool {
        self.keys.push(keycode).is_ok()
    }

    pub fn add_modifier(&mut self, bits: u8) {
        self.modifiers |= bits;
    }

    pub fn clear(&mut self) {
        self.modifiers = 0;
        self.keys.clear();
    }

    pub fn modifiers(&self) -> u8 {
        self.modifiers
    }

    pub fn keys(&self) -> &[u8] {
        &self.keys
    }

    pub fn is_full(&self) -> bool {
        self.keys.is_full()
    }

    pub fn is_empty(&self) -> bool {
        self.modifiers == 0 && self.keys.is_empty()
    }

    /// Encode the wire frame: prefix, report ID, modifiers, reserved byte,
    /// then the keycodes zero-padded to the end of the frame.
    pub fn frame(&self) -> [u8; FRAME_LEN] {
        let mut frame = [0u8; FRAME_LEN];
        frame[0] = FRAME_PREFIX;
        frame[1] = REPORT_ID;
        frame[2] = self.modifiers;
        frame[3] = 0;
        frame[FRAME_HEADER_LEN..FRAME_HEADER_LEN + self.keys.len()].copy_from_slice(&self.keys);
        frame
    }
}

/// Build a report from the current debounced key state.
///
/// The function key selects the layer and never produces a keycode itself.
/// `report` is cleared first, so every cycle starts from scratch.
pub fn assemble<const N: usize>(keys: &KeyStates<ROWS, COLS>, report: &mut KeyboardReport<N>) {
    report.clear();
    let layer = resolve_layer(keys);

    // Modifiers first, so grave-escape can see Shift/GUI held later in scan order.
    for (row, cols) in keys.iter().enumerate() {
        for (col, &pressed) in cols.iter().enumerate() {
            if pressed {
                report.add_modifier(lookup(layer, row, col).modifier_bit());
            }
        }
    }

    for (row, cols) in keys.iter().enumerate() {
        for (col, &pressed) in cols.iter().enumerate() {
            if !pressed || is_function_cell(row, col) {
                continue;
            }

            let kc = match lookup(layer, row, col) {
                Keycode::GraveEscape if report.modifiers() & SHIFT_OR_GUI != 0 => Keycode::Grave,
                Keycode::GraveEscape => Keycode::Escape,
                kc => kc,
            };

            if kc.is_transparent() || kc.is_modifier() || kc.is_function() || kc.is_consumer() {
                continue;
            }

            if !report.push_key(kc as u8) {
                trace!("report full, dropping key ({}, {})", row, col);
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
    fn test_frame_layout() {
        let mut report = KeyboardReport::<KEY_ROLLOVER>::new();
        assemble(&pressed(&[(0, 0), (0, 1)]), &mut report);
        let frame = report.frame();
        assert_eq!(frame.len(), 20);
        assert_eq!(&frame[..6], &[0xA1, 0x01, 0x00, 0x00, 0x29, 0x1E]);
        assert!(frame[6..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_truncates_to_capacity() {
        let mut report = KeyboardReport::<4>::new();
        let cells = [(1, 1), (1, 2), (1, 3), (1, 4), (1, 5), (1, 6)];
        assemble(&pressed(&cells), &mut report);
        // Q W E R, in scan order
        assert_eq!(report.keys(), &[0x14, 0x1A, 0x08, 0x15]);
        assert!(report.is_full());
        assert_eq!(&report.frame()[4..10], &[0x14, 0x1A, 0x08, 0x15, 0, 0]);
    }

    #[test]
    fn test_function_layer() {
        let mut report = KeyboardReport::<KEY_ROLLOVER>::new();
        assemble(&pressed(&[(0, 1), (0, 2), (FN_ROW, FN_COL)]), &mut report);
        assert_eq!(report.keys(), &[Keycode::F1 as u8, Keycode::F2 as u8]);

        assemble(&pressed(&[(0, 1), (0, 2)]), &mut report);
        assert_eq!(report.keys(), &[Keycode::N1 as u8, Keycode::N2 as u8]);
    }

    #[test]
    fn test_function_key_alone_is_empty() {
        let mut report = KeyboardReport::<KEY_ROLLOVER>::new();
        assemble(&pressed(&[(FN_ROW, FN_COL)]), &mut report);
        assert!(report.is_empty());
        assert_eq!(&report.frame()[2..], &[0u8; 18]);
    }

    #[test]
    fn test_function_layer_transparent_keys() {
        let mut report = KeyboardReport::<KEY_ROLLOVER>::new();
        assemble(&pressed(&[(2, 1), (FN_ROW, FN_COL)]), &mut report);
        assert_eq!(report.keys(), &[Keycode::A as u8]);
    }

    #[test]
    fn test_modifiers_do_not_take_slots() {
        let mut report = KeyboardReport::<2>::new();
        assemble(&pressed(&[(3, 0), (4, 0), (2, 1), (2, 2), (2, 3)]), &mut report);
        assert_eq!(report.modifiers(), 0x02 | 0x01);
        assert_eq!(report.keys(), &[Keycode::A as u8, Keycode::S as u8]);
        assert_eq!(report.frame()[2], 0x03);
    }

    #[test]
    fn test_grave_escape() {
        let mut report = KeyboardReport::<KEY_ROLLOVER>::new();
        assemble(&pressed(&[(0, 0)]), &mut report);
        assert_eq!(report.keys(), &[Keycode::Escape as u8]);

        // LShift sits after (0, 0) in scan order
        assemble(&pressed(&[(0, 0), (3, 0)]), &mut report);
        assert_eq!(report.keys(), &[Keycode::Grave as u8]);

        assemble(&pressed(&[(0, 0), (4, 1)]), &mut report);
        assert_eq!(report.keys(), &[Keycode::Grave as u8]);

        // Ctrl does not count
        assemble(&pressed(&[(0, 0), (4, 0)]), &mut report);
        assert_eq!(report.keys(), &[Keycode::Escape as u8]);
    }

    #[test]
    fn test_empty_cells_ignored() {
        let mut report = KeyboardReport::<KEY_ROLLOVER>::new();
        assemble(&pressed(&[(4, 3), (4, 4)]), &mut report);
        assert!(report.is_empty());
    }

    #[test]
    fn test_media_keys_not_in_keyboard_report() {
        let mut report = KeyboardReport::<KEY_ROLLOVER>::new();
        assemble(&pressed(&[(1, 12), (1, 13)]), &mut report);
        assert_eq!(report.keys(), &[Keycode::RBracket as u8]);
    }

    #[test]
    fn test_descriptor_matches_rollover() {
        // Report Count item of the keycode array
        let array = HID_REPORT_DESCRIPTOR
            .windows(4)
            .position(|w| w[2] == 0x75 && w[3] == 0x08 && w[0] == 0x95 && w[1] != 0x01)
            .unwrap();
        assert_eq!(HID_REPORT_DESCRIPTOR[array + 1] as usize, KEY_ROLLOVER);
        assert_eq!(FRAME_HEADER_LEN + KEY_ROLLOVER, FRAME_LEN);
        assert_eq!(&HID_REPORT_DESCRIPTOR[6..8], &[0x85, REPORT_ID]);
        assert_eq!(HID_REPORT_DESCRIPTOR.last(), Some(&0xC0));
    }

    #[test]
    fn test_descriptor_has_consumer_collection() {
        let start = HID_REPORT_DESCRIPTOR
            .windows(2)
            .position(|w| w == [0x05, 0x0C])
            .unwrap();
        // Keyboard collection closes right before
        assert_eq!(HID_REPORT_DESCRIPTOR[start - 1], 0xC0);
        assert_eq!(&HID_REPORT_DESCRIPTOR[start + 6..start + 8], &[0x85, CONSUMER_REPORT_ID]);
        assert_ne!(CONSUMER_REPORT_ID, REPORT_ID);
    }

    #[test]
    fn test_clear() {
        let mut report = KeyboardReport::<4>::new();
        report.add_modifier(0x02);
        assert!(report.push_key(0x04));
        report.clear();
        assert!(report.is_empty());
        assert_eq!(report, KeyboardReport::new());
    }
}
