//! RP2040 BOOTSEL bootloader: USB detection and UF2 copy.
//!
//! In BOOTSEL mode the RP2040 shows up as a USB mass-storage drive
//! (`RPI-RP2`). Writing a UF2 file to it flashes and reboots the chip.

use anyhow::{bail, Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::uf2::BLOCK_SIZE;

/// RP2040 BOOTSEL bootloader USB identifiers.
const BOOTSEL_VID: u16 = 0x2E8A;
const BOOTSEL_PID: u16 = 0x0003;

/// Marker file present at the root of the BOOTSEL drive.
const INFO_FILE: &str = "INFO_UF2.TXT";

/// File name the image is written as.
const TARGET_FILE: &str = "FIRMWARE.UF2";

/// Blocks written per progress step.
const BLOCKS_PER_WRITE: usize = 16;

/// Detect whether an RP2040 in BOOTSEL mode is connected.
pub fn detect() -> Result<bool> {
    let devices = rusb::devices().context("failed to enumerate USB devices")?;
    for device in devices.iter() {
        let desc = device
            .device_descriptor()
            .context("failed to read device descriptor")?;
        if desc.vendor_id() == BOOTSEL_VID && desc.product_id() == BOOTSEL_PID {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Copy a UF2 image onto the mounted BOOTSEL drive at `mount`.
///
/// The bootloader flashes and reboots as soon as the last block lands.
pub fn flash(mount: &Path, image: &[u8]) -> Result<()> {
    if !mount.join(INFO_FILE).is_file() {
        bail!(
            "{} does not look like an RP2040 BOOTSEL drive (no {}). Hold BOOTSEL while plugging in the keyboard.",
            mount.display(),
            INFO_FILE
        );
    }
    if image.len() % BLOCK_SIZE != 0 {
        bail!("UF2 image is {} bytes, not a multiple of {}", image.len(), BLOCK_SIZE);
    }

    let target = mount.join(TARGET_FILE);
    let mut file =
        File::create(&target).with_context(|| format!("failed to create {}", target.display()))?;

    let total_blocks = image.len() / BLOCK_SIZE;
    let pb = ProgressBar::new(total_blocks as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{msg} [{bar:40.cyan/blue}] {pos}/{len} blocks")
            .context("invalid progress bar template")?
            .progress_chars("=> "),
    );
    pb.set_message("Flashing");

    for chunk in image.chunks(BLOCK_SIZE * BLOCKS_PER_WRITE) {
        file.write_all(chunk)
            .with_context(|| format!("failed to write {}", target.display()))?;
        pb.inc((chunk.len() / BLOCK_SIZE) as u64);
    }

    // The drive vanishes once the bootloader reboots, so a failed sync is expected
    let _ = file.sync_all();
    pb.finish_with_message("Flashed");
    println!("Image copied. The keyboard reboots into the new firmware.");

    Ok(())
}
