//! Streaming Intel HEX reader.
//!
//! [`HexReader`] walks the file one record at a time and yields data runs at
//! their absolute address, so callers can place bytes straight into flash
//! pages without building an intermediate image.

use std::iter::Enumerate;
use std::str::Lines;

use anyhow::{bail, Context, Result};

/// One decoded record.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Record {
    Data { offset: u16, bytes: Vec<u8> },
    EndOfFile,
    /// Type 02, base = value << 4
    SegmentBase(u32),
    /// Type 04, base = value << 16
    LinearBase(u32),
    /// Types 03 and 05 carry an entry point, which UF2 has no use for.
    StartAddress,
}

/// A run of bytes at an absolute address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataRun {
    pub address: u32,
    pub bytes: Vec<u8>,
}

/// Iterator over the data runs of an Intel HEX file.
///
/// Ends after the end-of-file record; input that stops before one is an
/// error.
pub struct HexReader<'a> {
    lines: Enumerate<Lines<'a>>,
    base: u32,
    done: bool,
}

impl<'a> HexReader<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            lines: input.lines().enumerate(),
            base: 0,
            done: false,
        }
    }

    fn next_run(&mut self) -> Result<Option<DataRun>> {
        for (idx, line) in self.lines.by_ref() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let record = decode_record(line).with_context(|| format!("line {}", idx + 1))?;
            match record {
                Record::Data { offset, bytes } => {
                    // Bases stop at 0xFFFF_0000, so this cannot overflow
                    let address = self.base + u32::from(offset);
                    return Ok(Some(DataRun { address, bytes }));
                }
                Record::EndOfFile => {
                    self.done = true;
                    return Ok(None);
                }
                Record::SegmentBase(base) | Record::LinearBase(base) => self.base = base,
                Record::StartAddress => {}
            }
        }
        bail!("missing end-of-file record")
    }
}

impl Iterator for HexReader<'_> {
    type Item = Result<DataRun>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.next_run() {
            Ok(run) => run.map(Ok),
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

/// Decode one `:LLAAAATT<data>CC` line.
fn decode_record(line: &str) -> Result<Record> {
    let Some(digits) = line.strip_prefix(':') else {
        bail!("missing start code ':'");
    };
    if !digits.is_ascii() {
        bail!("non-ASCII characters");
    }
    if digits.len() % 2 != 0 {
        bail!("odd number of hex digits");
    }

    let raw = (0..digits.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&digits[i..i + 2], 16))
        .collect::<Result<Vec<u8>, _>>()
        .context("invalid hex digit")?;

    // Byte count, 2 address bytes, type, checksum
    if raw.len() < 5 {
        bail!("record too short");
    }
    let len = usize::from(raw[0]);
    if raw.len() != len + 5 {
        bail!("byte count {} does not match record length", len);
    }
    let sum = raw.iter().fold(0u8, |acc, &b| acc.wrapping_add(b));
    if sum != 0 {
        bail!("checksum mismatch");
    }

    let offset = u16::from_be_bytes([raw[1], raw[2]]);
    let payload = &raw[4..4 + len];
    let base_value = || -> Result<u32> {
        match payload {
            [hi, lo] => Ok(u32::from(u16::from_be_bytes([*hi, *lo]))),
            _ => bail!("address record needs 2 data bytes"),
        }
    };

    Ok(match raw[3] {
        0x00 => Record::Data {
            offset,
            bytes: payload.to_vec(),
        },
        0x01 => Record::EndOfFile,
        0x02 => Record::SegmentBase(base_value()? << 4),
        0x04 => Record::LinearBase(base_value()? << 16),
        0x03 | 0x05 => Record::StartAddress,
        other => bail!("unknown record type 0x{:02X}", other),
    })
}
