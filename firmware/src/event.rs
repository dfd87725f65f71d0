//! Events consumed by the keyboard loop.

use heapless::Deque;
use log::warn;

use crate::config::EVENT_QUEUE_CAPACITY;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Event {
    /// The report timer elapsed.
    ReportDue,
    /// The transport opened a connection, `status` 0 on success.
    ConnectionOpened { status: u8, cid: u16 },
    /// The transport lost the connection.
    ConnectionClosed,
    /// The transport can accept one report now.
    CanSendNow,
}

/// Bounded FIFO of pending events, drained in order by the keyboard loop.
pub struct EventQueue {
    events: Deque<Event, EVENT_QUEUE_CAPACITY>,
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl EventQueue {
    pub const fn new() -> Self {
        Self { events: Deque::new() }
    }

    /// Queue an event. A full queue hands the event back.
    pub fn push(&mut self, event: Event) -> Result<(), Event> {
        self.events.push_back(event).map_err(|event| {
            warn!("event queue full, dropping {:?}", event);
            event
        })
    }

    pub fn pop(&mut self) -> Option<Event> {
        self.events.pop_front()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
