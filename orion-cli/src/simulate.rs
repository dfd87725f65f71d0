//! Run the firmware against scripted key presses on the host.
//!
//! Script format, one step per line, `#` starts a comment:
//!
//! ```text
//! # time_ms  action   row col
//! 0          press    0   0
//! 1500       release  0   0
//! ```

use std::cell::RefCell;

use anyhow::{anyhow, bail, Context, Result};
use log::info;
use orion_firmware::debounce::Debouncer;
use orion_firmware::matrix::Matrix;
use orion_firmware::sim::{NoDelay, RecordingTransport, SwitchGrid};
use orion_firmware::{Event, Keyboard};
use orion_keymap::{COLS, ROWS};

/// Connection id handed out by the simulated host.
const SIM_CID: u16 = 0x0040;

/// A switch change at a point in time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    pub at_ms: u64,
    pub row: usize,
    pub col: usize,
    pub pressed: bool,
}

/// A frame the firmware transmitted, with the time it was sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentFrame {
    pub at_ms: u64,
    pub frame: Vec<u8>,
}

pub fn parse_script(input: &str) -> Result<Vec<Step>> {
    let mut steps: Vec<Step> = Vec::new();

    for (line_num, line) in input.lines().enumerate() {
        let line = line.split('#').next().unwrap_or("").trim();
        if line.is_empty() {
            continue;
        }

        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() != 4 {
            bail!("line {}: expected `<time_ms> press|release <row> <col>`", line_num + 1);
        }

        let at_ms: u64 = fields[0]
            .parse()
            .with_context(|| format!("line {}: invalid time", line_num + 1))?;
        let pressed = match fields[1] {
            "press" => true,
            "release" => false,
            other => bail!("line {}: unknown action `{}`", line_num + 1, other),
        };
        let row: usize = fields[2]
            .parse()
            .with_context(|| format!("line {}: invalid row", line_num + 1))?;
        let col: usize = fields[3]
            .parse()
            .with_context(|| format!("line {}: invalid column", line_num + 1))?;

        if row >= ROWS || col >= COLS {
            bail!("line {}: ({}, {}) is outside the {}x{} matrix", line_num + 1, row, col, ROWS, COLS);
        }
        if let Some(last) = steps.last() {
            if at_ms < last.at_ms {
                bail!("line {}: steps must be in time order", line_num + 1);
            }
        }

        steps.push(Step { at_ms, row, col, pressed });
    }

    Ok(steps)
}

/// Simulate `duration_ms` of 1ms scan passes. The simulated host connects
/// at time 0 and grants every send request on the next pass.
pub fn run(steps: &[Step], duration_ms: u64) -> Result<Vec<SentFrame>> {
    let grid = RefCell::new(SwitchGrid::<ROWS, COLS>::new());
    let (rows, cols) = SwitchGrid::pins(&grid);
    let matrix = Matrix::new(rows, cols, NoDelay, Debouncer::new());
    let mut keyboard: Keyboard<_, _, _, _> = Keyboard::new(matrix, RecordingTransport::new());

    keyboard.start(0);
    keyboard
        .push_event(Event::ConnectionOpened { status: 0, cid: SIM_CID })
        .map_err(|e| anyhow!("event queue full, dropped {:?}", e))?;

    let mut sent = Vec::new();
    let mut pending = steps.iter().peekable();

    for now in 0..=duration_ms {
        while let Some(step) = pending.next_if(|s| s.at_ms <= now) {
            grid.borrow_mut().set(step.row, step.col, step.pressed);
        }

        let before = keyboard.transport().sent().len();
        keyboard.poll(now);
        for frame in &keyboard.transport().sent()[before..] {
            sent.push(SentFrame { at_ms: now, frame: frame.clone() });
        }

        if keyboard.transport_mut().take_grant() {
            keyboard
                .push_event(Event::CanSendNow)
                .map_err(|e| anyhow!("event queue full, dropped {:?}", e))?;
        }
    }

    info!("simulated {} ms, {} reports sent", duration_ms, sent.len());
    Ok(sent)
}
