//! Firmware core for Orion's Hands, a split Bluetooth keyboard.
//!
//! - Matrix scanning with per-key integrator debouncing
//! - Base and function layer resolution
//! - Periodic HID keyboard reports, sent only when the transport grants it
//! - Consumer control reports for media keys, sent when they change
//!
//! Radio bring-up and pin initialization belong to the board crate; this
//! library is driven through `embedded-hal` pins and [`HidTransport`].

#![cfg_attr(not(any(test, feature = "std")), no_std)]

pub mod config;
pub mod consumer;
pub mod debounce;
pub mod event;
pub mod keyboard;
pub mod matrix;
pub mod report;
#[cfg(any(test, feature = "sim"))]
pub mod sim;
pub mod timer;
pub mod transport;

pub use consumer::{ConsumerReport, CONSUMER_FRAME_LEN};
pub use event::Event;
pub use keyboard::Keyboard;
pub use report::{KeyboardReport, FRAME_LEN, HID_REPORT_DESCRIPTOR};
pub use transport::{HidTransport, Session};
