//! HID transport seam and connection session.
//!
//! The radio stack is an external collaborator. The firmware sees it as a
//! [`HidTransport`] that accepts one report per "can send now" grant, and
//! tracks the connection with a [`Session`].

use core::fmt::Debug;

use log::{debug, info, warn};

/// Status code of a successful connection.
pub const STATUS_SUCCESS: u8 = 0x00;

/// An HID interrupt channel to the host.
pub trait HidTransport {
    type Error: Debug;

    /// Ask the transport for a "can send now" event on connection `cid`.
    /// Asynchronous: the grant arrives later as an event.
    fn request_can_send_now(&mut self, cid: u16);

    /// Transmit one report frame on connection `cid`.
    fn send_interrupt_message(&mut self, cid: u16, frame: &[u8]) -> Result<(), Self::Error>;

    /// Enable or disable discoverability.
    fn set_discoverable(&mut self, discoverable: bool);
}

/// Connection state as seen by the firmware.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Session {
    /// Connection identifier, 0 when not connected.
    cid: u16,
    /// A "can send now" request is in flight.
    send_requested: bool,
}

impl Session {
    pub const fn new() -> Self {
        Self {
            cid: 0,
            send_requested: false,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.cid != 0
    }

    pub fn cid(&self) -> u16 {
        self.cid
    }

    pub fn send_requested(&self) -> bool {
        self.send_requested
    }

    /// Handle a connection-opened event.
    pub fn connection_opened<T: HidTransport>(&mut self, transport: &mut T, status: u8, cid: u16) {
        self.send_requested = false;
        if status != STATUS_SUCCESS || cid == 0 {
            warn!("connection failed, status 0x{:02x}", status);
            self.cid = 0;
            transport.set_discoverable(true);
            return;
        }

        info!("connected, cid 0x{:04x}", cid);
        self.cid = cid;
        transport.set_discoverable(false);
    }

    /// Handle a connection-closed event. Cancels any outstanding send request.
    pub fn connection_closed<T: HidTransport>(&mut self, transport: &mut T) {
        info!("disconnected");
        self.cid = 0;
        self.send_requested = false;
        transport.set_discoverable(true);
    }

    /// Request a send opportunity. No-op while disconnected or while a
    /// previous request is still waiting for its grant.
    ///
    /// Returns true when a request was issued.
    pub fn request_send<T: HidTransport>(&mut self, transport: &mut T) -> bool {
        if !self.is_connected() {
            return false;
        }
        if self.send_requested {
            debug!("send request still pending");
            return false;
        }
        transport.request_can_send_now(self.cid);
        self.send_requested = true;
        true
    }

    /// Consume a "can send now" grant. Returns the connection to send on,
    /// or `None` when disconnected or when no request is outstanding.
    pub fn take_grant(&mut self) -> Option<u16> {
        if !core::mem::take(&mut self.send_requested) {
            return None;
        }
        if self.is_connected() {
            Some(self.cid)
        } else {
            None
        }
    }
}
