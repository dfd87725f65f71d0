//! Key matrix scanning.
//!
//! Column lines are outputs, held high (inactive) and driven low one at a
//! time. Row lines are inputs with pull-ups: a row reads low while a closed
//! switch connects it to the active column. Every raw sample goes through
//! the debouncer, which holds the debounced state table.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};
use log::debug;

use crate::config::SETTLE_DELAY_US;
use crate::debounce::{Debouncer, KeyStates};

pub struct Matrix<In, Out, D, const ROW: usize, const COL: usize> {
    /// Row lines (inputs w/ pull-up)
    rows: [In; ROW],
    /// Column lines (active-low outputs)
    cols: [Out; COL],
    /// Column settle delay
    delay: D,
    debouncer: Debouncer<ROW, COL>,
}

impl<In, Out, D, const ROW: usize, const COL: usize> Matrix<In, Out, D, ROW, COL>
where
    In: InputPin,
    Out: OutputPin,
    D: DelayNs,
{
    /// Create a matrix from row and column pins. All columns start inactive.
    pub fn new(rows: [In; ROW], mut cols: [Out; COL], delay: D, debouncer: Debouncer<ROW, COL>) -> Self {
        for col in cols.iter_mut() {
            col.set_high().ok();
        }
        Self {
            rows,
            cols,
            delay,
            debouncer,
        }
    }

    /// Run one full scan pass: drive every column active in turn and sample
    /// all rows for it. Never blocks beyond the column settle delay.
    ///
    /// A row that fails to read counts as released.
    pub fn scan(&mut self) {
        for (col, out) in self.cols.iter_mut().enumerate() {
            out.set_low().ok();
            self.delay.delay_us(SETTLE_DELAY_US);

            for (row, input) in self.rows.iter_mut().enumerate() {
                let pressed = input.is_low().unwrap_or(false);
                if self.debouncer.update(row, col, pressed) {
                    debug!(
                        "key ({}, {}) {}",
                        row,
                        col,
                        if pressed { "pressed" } else { "released" }
                    );
                }
            }

            out.set_high().ok();
        }
    }

    /// Debounced key states.
    pub fn key_states(&self) -> &KeyStates<ROW, COL> {
        self.debouncer.state()
    }

    pub fn is_pressed(&self, row: usize, col: usize) -> bool {
        self.debouncer.is_pressed(row, col)
    }

    pub fn debouncer(&self) -> &Debouncer<ROW, COL> {
        &self.debouncer
    }
}

#[cfg(test)]
mod tests {
    use core::cell::RefCell;

    use super::*;
    use crate::sim::{NoDelay, SwitchGrid};

    #[test]
    fn test_scan_debounces_press() {
        let grid = RefCell::new(SwitchGrid::<3, 4>::new());
        let (rows, cols) = SwitchGrid::pins(&grid);
        let mut matrix = Matrix::new(rows, cols, NoDelay, Debouncer::with_threshold(3));

        grid.borrow_mut().set(1, 2, true);
        matrix.scan();
        matrix.scan();
        assert!(!matrix.is_pressed(1, 2));
        matrix.scan();
        assert!(matrix.is_pressed(1, 2));
        assert!(!matrix.is_pressed(1, 1));
        assert!(!matrix.is_pressed(0, 2));
    }

    #[test]
    fn test_columns_inactive_between_scans() {
        let grid = RefCell::new(SwitchGrid::<2, 3>::new());
        let (rows, cols) = SwitchGrid::pins(&grid);
        let mut matrix = Matrix::new(rows, cols, NoDelay, Debouncer::with_threshold(1));
        assert_eq!(grid.borrow().active_columns(), 0);

        grid.borrow_mut().set(0, 0, true);
        matrix.scan();
        assert_eq!(grid.borrow().active_columns(), 0);
        assert_eq!(matrix.key_states(), &[[true, false, false], [false, false, false]]);
    }

    #[test]
    fn test_held_keys_in_same_row() {
        let grid = RefCell::new(SwitchGrid::<2, 3>::new());
        let (rows, cols) = SwitchGrid::pins(&grid);
        let mut matrix = Matrix::new(rows, cols, NoDelay, Debouncer::with_threshold(2));

        grid.borrow_mut().set(1, 0, true);
        grid.borrow_mut().set(1, 2, true);
        matrix.scan();
        matrix.scan();
        assert_eq!(matrix.key_states(), &[[false, false, false], [true, false, true]]);
    }
}
