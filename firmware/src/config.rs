//! Compile-time configuration.

use core::time::Duration;

/// Number of consistent scan passes required to register a state change.
/// At ~1ms per scan pass, this gives ~5ms debounce time.
pub const DEBOUNCE_THRESHOLD: u8 = 5;

/// Period between two keyboard reports.
pub const REPORT_PERIOD: Duration = Duration::from_millis(1000);

/// Maximum number of simultaneous non-modifier keys per report.
/// The HID descriptor's keycode array is sized from this value.
pub const KEY_ROLLOVER: usize = 16;

/// Time for a driven column line to settle before the rows are sampled.
pub const SETTLE_DELAY_US: u32 = 1;

/// Capacity of the keyboard's event queue.
pub const EVENT_QUEUE_CAPACITY: usize = 8;
