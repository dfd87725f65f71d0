#![allow(dead_code)]

use core::cell::RefCell;
use core::time::Duration;

use orion_firmware::debounce::Debouncer;
use orion_firmware::matrix::Matrix;
use orion_firmware::sim::{NoDelay, RecordingTransport, SimColumn, SimRow, SwitchGrid};
use orion_firmware::{Event, Keyboard};
use orion_keymap::{COLS, ROWS};

pub const THRESHOLD: u8 = 5;
pub const PERIOD_MS: u64 = 1000;
pub const CID: u16 = 0x0041;

pub type Grid = RefCell<SwitchGrid<ROWS, COLS>>;
pub type SimKeyboard<'a, const N: usize> =
    Keyboard<SimRow<'a, ROWS, COLS>, SimColumn<'a, ROWS, COLS>, NoDelay, RecordingTransport, N>;

// Init logger for tests
pub fn init_log() {
    let _ = env_logger::builder()
        .filter_level(log::LevelFilter::Debug)
        .is_test(true)
        .try_init();
}

pub fn grid() -> Grid {
    RefCell::new(SwitchGrid::new())
}

/// A started keyboard over `grid`, not yet connected.
pub fn keyboard<const N: usize>(grid: &Grid) -> SimKeyboard<'_, N> {
    init_log();
    let (rows, cols) = SwitchGrid::pins(grid);
    let matrix = Matrix::new(rows, cols, NoDelay, Debouncer::with_threshold(THRESHOLD));
    let mut keyboard = Keyboard::with_period(
        matrix,
        RecordingTransport::new(),
        Duration::from_millis(PERIOD_MS),
    );
    keyboard.start(0);
    keyboard
}

pub fn connect<const N: usize>(keyboard: &mut SimKeyboard<'_, N>, now: u64) {
    keyboard
        .push_event(Event::ConnectionOpened { status: 0, cid: CID })
        .unwrap();
    keyboard.poll(now);
}

/// Poll once per millisecond over `from..=to`, delivering every send grant
/// on the following poll like the radio stack would.
pub fn run<const N: usize>(keyboard: &mut SimKeyboard<'_, N>, from: u64, to: u64) {
    for now in from..=to {
        keyboard.poll(now);
        if keyboard.transport_mut().take_grant() {
            keyboard.push_event(Event::CanSendNow).unwrap();
        }
    }
}

/// Poll once per millisecond over `from..=to`, never delivering grants.
pub fn run_without_grants<const N: usize>(keyboard: &mut SimKeyboard<'_, N>, from: u64, to: u64) {
    for now in from..=to {
        keyboard.poll(now);
    }
}

/// Keycode bytes of a frame, without trailing padding.
pub fn keycodes(frame: &[u8]) -> Vec<u8> {
    frame[4..].iter().copied().filter(|&b| b != 0).collect()
}
