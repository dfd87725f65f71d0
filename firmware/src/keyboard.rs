//! The cooperative keyboard loop.
//!
//! Every [`Keyboard::poll`] runs one scan pass, checks the report timer and
//! drains the event queue. Transport callbacks are queued with
//! [`Keyboard::push_event`] and handled in order by the same loop, so the
//! key states and the pending reports only ever have one writer.
//!
//! Each grant carries one frame. The keyboard report goes first; a changed
//! consumer report asks for another grant and goes out on that one.

use core::time::Duration;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};
use log::{debug, info, warn};
use orion_keymap::{COLS, ROWS};

use crate::config::{KEY_ROLLOVER, REPORT_PERIOD};
use crate::consumer::{assemble_consumer, ConsumerReport};
use crate::debounce::KeyStates;
use crate::event::{Event, EventQueue};
use crate::matrix::Matrix;
use crate::report::{assemble, KeyboardReport};
use crate::timer::ReportTimer;
use crate::transport::{HidTransport, Session};

pub struct Keyboard<In, Out, D, T, const N: usize = KEY_ROLLOVER> {
    matrix: Matrix<In, Out, D, ROWS, COLS>,
    transport: T,
    session: Session,
    timer: ReportTimer,
    events: EventQueue,
    report: KeyboardReport<N>,
    /// A keyboard report is waiting for a grant
    report_pending: bool,
    consumer: ConsumerReport,
    /// Last consumer report the host received
    consumer_sent: ConsumerReport,
}

impl<In, Out, D, T, const N: usize> Keyboard<In, Out, D, T, N>
where
    In: InputPin,
    Out: OutputPin,
    D: DelayNs,
    T: HidTransport,
{
    pub fn new(matrix: Matrix<In, Out, D, ROWS, COLS>, transport: T) -> Self {
        Self::with_period(matrix, transport, REPORT_PERIOD)
    }

    pub fn with_period(matrix: Matrix<In, Out, D, ROWS, COLS>, transport: T, period: Duration) -> Self {
        Self {
            matrix,
            transport,
            session: Session::new(),
            timer: ReportTimer::new(period),
            events: EventQueue::new(),
            report: KeyboardReport::new(),
            report_pending: false,
            consumer: ConsumerReport::new(),
            consumer_sent: ConsumerReport::new(),
        }
    }

    /// Arm the first reporting period.
    pub fn start(&mut self, now_ms: u64) {
        info!("keyboard started");
        self.transport.set_discoverable(true);
        self.timer.arm(now_ms);
    }

    /// Queue a transport event for the next poll.
    pub fn push_event(&mut self, event: Event) -> Result<(), Event> {
        self.events.push(event)
    }

    /// One loop iteration: scan, check the timer, handle queued events.
    pub fn poll(&mut self, now_ms: u64) {
        self.matrix.scan();

        if self.timer.fire(now_ms) {
            // The timer is the only source of ReportDue and is disarmed
            // until handled, so this cannot be lost to a full queue.
            if let Err(event) = self.events.push(Event::ReportDue) {
                self.handle_event(event, now_ms);
            }
        }

        while let Some(event) = self.events.pop() {
            self.handle_event(event, now_ms);
        }
    }

    pub fn handle_event(&mut self, event: Event, now_ms: u64) {
        match event {
            Event::ReportDue => {
                self.on_report_due();
                self.timer.arm(now_ms);
            }
            Event::ConnectionOpened { status, cid } => {
                self.session.connection_opened(&mut self.transport, status, cid);
                self.drop_reports();
            }
            Event::ConnectionClosed => {
                self.session.connection_closed(&mut self.transport);
                self.drop_reports();
            }
            Event::CanSendNow => self.on_can_send_now(),
        }
    }

    /// Forget everything built for the previous connection.
    fn drop_reports(&mut self) {
        self.report.clear();
        self.report_pending = false;
        self.consumer.clear();
        self.consumer_sent.clear();
    }

    fn consumer_changed(&self) -> bool {
        self.consumer != self.consumer_sent
    }

    fn on_report_due(&mut self) {
        let keys = self.matrix.key_states();
        assemble(keys, &mut self.report);
        assemble_consumer(keys, &mut self.consumer);
        debug!(
            "report: modifiers 0x{:02x}, keys {:02x?}, consumer 0x{:04x}",
            self.report.modifiers(),
            self.report.keys(),
            self.consumer.usage()
        );

        if !self.session.is_connected() {
            // No backlog across disconnects
            self.drop_reports();
            return;
        }
        self.report_pending = true;
        self.session.request_send(&mut self.transport);
    }

    fn on_can_send_now(&mut self) {
        let Some(cid) = self.session.take_grant() else {
            debug!("unrequested send grant, ignored");
            return;
        };

        if self.report_pending {
            let frame = self.report.frame();
            if let Err(e) = self.transport.send_interrupt_message(cid, &frame) {
                warn!("failed to send report: {:?}", e);
            }
            self.report.clear();
            self.report_pending = false;

            if self.consumer_changed() {
                self.session.request_send(&mut self.transport);
            }
        } else if self.consumer_changed() {
            let frame = self.consumer.frame();
            match self.transport.send_interrupt_message(cid, &frame) {
                // Retried after the next keyboard report
                Err(e) => warn!("failed to send consumer report: {:?}", e),
                Ok(()) => self.consumer_sent = self.consumer,
            }
        }
    }

    /// Debounced key states.
    pub fn key_states(&self) -> &KeyStates<ROWS, COLS> {
        self.matrix.key_states()
    }

    pub fn matrix(&self) -> &Matrix<In, Out, D, ROWS, COLS> {
        &self.matrix
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn timer(&self) -> &ReportTimer {
        &self.timer
    }

    /// The report waiting for a send grant.
    pub fn pending_report(&self) -> &KeyboardReport<N> {
        &self.report
    }

    /// The consumer report from the last reporting cycle.
    pub fn consumer_report(&self) -> &ConsumerReport {
        &self.consumer
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }
}
