//! Host-side simulation of the keyboard hardware.
//!
//! A [`SwitchGrid`] models the physical switches and which column lines are
//! driven. Its row and column pins implement the `embedded-hal` traits, so
//! the real [`Matrix`](crate::matrix::Matrix) scans it unchanged.

use core::cell::RefCell;
use core::convert::Infallible;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{ErrorType, InputPin, OutputPin};

use crate::consumer::CONSUMER_FRAME_LEN;
use crate::report::FRAME_LEN;
use crate::transport::HidTransport;

/// Switch states and column drive levels of a simulated matrix.
pub struct SwitchGrid<const ROW: usize, const COL: usize> {
    closed: [[bool; COL]; ROW],
    /// Columns currently driven active (low)
    driven: [bool; COL],
}

impl<const ROW: usize, const COL: usize> Default for SwitchGrid<ROW, COL> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const ROW: usize, const COL: usize> SwitchGrid<ROW, COL> {
    pub const fn new() -> Self {
        Self {
            closed: [[false; COL]; ROW],
            driven: [false; COL],
        }
    }

    /// Close or open the switch at (row, col).
    pub fn set(&mut self, row: usize, col: usize, closed: bool) {
        self.closed[row][col] = closed;
    }

    pub fn release_all(&mut self) {
        self.closed = [[false; COL]; ROW];
    }

    /// Number of column lines currently driven active.
    pub fn active_columns(&self) -> usize {
        self.driven.iter().filter(|&&d| d).count()
    }

    /// A row reads low while any closed switch connects it to an active column.
    fn row_low(&self, row: usize) -> bool {
        self.closed[row].iter().zip(self.driven.iter()).any(|(&c, &d)| c && d)
    }

    /// Row and column pins backed by `grid`.
    pub fn pins(grid: &RefCell<Self>) -> ([SimRow<'_, ROW, COL>; ROW], [SimColumn<'_, ROW, COL>; COL]) {
        (
            core::array::from_fn(|row| SimRow { grid, row }),
            core::array::from_fn(|col| SimColumn { grid, col }),
        )
    }
}

/// Simulated row input with pull-up.
pub struct SimRow<'a, const ROW: usize, const COL: usize> {
    grid: &'a RefCell<SwitchGrid<ROW, COL>>,
    row: usize,
}

impl<const ROW: usize, const COL: usize> ErrorType for SimRow<'_, ROW, COL> {
    type Error = Infallible;
}

impl<const ROW: usize, const COL: usize> InputPin for SimRow<'_, ROW, COL> {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.grid.borrow().row_low(self.row))
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(self.grid.borrow().row_low(self.row))
    }
}

/// Simulated column output, active low.
pub struct SimColumn<'a, const ROW: usize, const COL: usize> {
    grid: &'a RefCell<SwitchGrid<ROW, COL>>,
    col: usize,
}

impl<const ROW: usize, const COL: usize> ErrorType for SimColumn<'_, ROW, COL> {
    type Error = Infallible;
}

impl<const ROW: usize, const COL: usize> OutputPin for SimColumn<'_, ROW, COL> {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.grid.borrow_mut().driven[self.col] = true;
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.grid.borrow_mut().driven[self.col] = false;
        Ok(())
    }
}

/// Delay that returns immediately.
pub struct NoDelay;

impl DelayNs for NoDelay {
    fn delay_ns(&mut self, _ns: u32) {}
}

/// Error returned by [`RecordingTransport`] when told to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SendRejected;

/// Transport that records everything the firmware asks of it.
#[derive(Debug, Default)]
pub struct RecordingTransport {
    frames: std::vec::Vec<(u16, [u8; FRAME_LEN])>,
    consumer_frames: std::vec::Vec<(u16, [u8; CONSUMER_FRAME_LEN])>,
    /// Every frame in send order
    sent: std::vec::Vec<std::vec::Vec<u8>>,
    requests: usize,
    grant_pending: bool,
    discoverable: bool,
    reject_sends: bool,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keyboard frames sent so far, with their connection id.
    pub fn frames(&self) -> &[(u16, [u8; FRAME_LEN])] {
        &self.frames
    }

    /// Consumer control frames sent so far, with their connection id.
    pub fn consumer_frames(&self) -> &[(u16, [u8; CONSUMER_FRAME_LEN])] {
        &self.consumer_frames
    }

    /// All frames in the order they were sent.
    pub fn sent(&self) -> &[std::vec::Vec<u8>] {
        &self.sent
    }

    /// Number of "can send now" requests received.
    pub fn requests(&self) -> usize {
        self.requests
    }

    pub fn is_discoverable(&self) -> bool {
        self.discoverable
    }

    /// Make every following send fail.
    pub fn reject_sends(&mut self, reject: bool) {
        self.reject_sends = reject;
    }

    /// Returns true once per request, the moment a real transport would
    /// deliver its "can send now" event.
    pub fn take_grant(&mut self) -> bool {
        core::mem::take(&mut self.grant_pending)
    }
}

impl HidTransport for RecordingTransport {
    type Error = SendRejected;

    fn request_can_send_now(&mut self, _cid: u16) {
        self.requests += 1;
        self.grant_pending = true;
    }

    fn send_interrupt_message(&mut self, cid: u16, frame: &[u8]) -> Result<(), Self::Error> {
        if self.reject_sends {
            return Err(SendRejected);
        }
        if let Ok(keyboard) = <[u8; FRAME_LEN]>::try_from(frame) {
            self.frames.push((cid, keyboard));
        } else if let Ok(consumer) = <[u8; CONSUMER_FRAME_LEN]>::try_from(frame) {
            self.consumer_frames.push((cid, consumer));
        }
        self.sent.push(frame.to_vec());
        Ok(())
    }

    fn set_discoverable(&mut self, discoverable: bool) {
        self.discoverable = discoverable;
    }
}
