//! UF2 encoding for the RP2040 BOOTSEL mass-storage bootloader.
//!
//! Every 512-byte block carries 256 bytes of payload for one flash address.

use std::collections::BTreeMap;

use anyhow::{bail, Result};

use crate::hex::HexReader;

/// RP2040 family ID.
pub const FAMILY_RP2040: u32 = 0xE48B_FF56;

/// Start of XIP flash on the RP2040.
pub const FLASH_BASE: u32 = 0x1000_0000;

/// Size of one UF2 block.
pub const BLOCK_SIZE: usize = 512;

/// Payload bytes per block.
pub const PAYLOAD_SIZE: usize = 256;

const MAGIC_START0: u32 = 0x0A32_4655;
const MAGIC_START1: u32 = 0x9E5D_5157;
const MAGIC_END: u32 = 0x0AB1_6F30;
const FLAG_FAMILY_ID_PRESENT: u32 = 0x0000_2000;

/// Data area of a block, payload included.
const DATA_AREA: usize = 476;

/// Flash contents keyed by page address, filled from HEX data runs.
///
/// Bytes never written read as erased (0xFF). Pages that stay fully erased
/// are left out of the UF2 output.
#[derive(Debug, Default)]
pub struct Uf2Image {
    pages: BTreeMap<u32, [u8; PAYLOAD_SIZE]>,
}

impl Uf2Image {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read every data run of an Intel HEX file into flash pages.
    pub fn from_hex(input: &str) -> Result<Self> {
        let mut image = Self::new();
        for run in HexReader::new(input) {
            let run = run?;
            image.write(run.address, &run.bytes)?;
        }
        Ok(image)
    }

    /// Place `bytes` at `address`, splitting across page boundaries.
    pub fn write(&mut self, address: u32, bytes: &[u8]) -> Result<()> {
        if address < FLASH_BASE {
            bail!(
                "data at 0x{:08X} lies below flash base 0x{:08X}",
                address,
                FLASH_BASE
            );
        }

        if u64::from(address) + bytes.len() as u64 > 1 << 32 {
            bail!("data at 0x{:08X} runs past the end of the address space", address);
        }

        let mut address = address;
        let mut rest = bytes;
        while !rest.is_empty() {
            let page_addr = address & !(PAYLOAD_SIZE as u32 - 1);
            let offset = (address - page_addr) as usize;
            let take = rest.len().min(PAYLOAD_SIZE - offset);

            let page = self.pages.entry(page_addr).or_insert([0xFF; PAYLOAD_SIZE]);
            page[offset..offset + take].copy_from_slice(&rest[..take]);

            rest = &rest[take..];
            address = address.wrapping_add(take as u32);
        }
        Ok(())
    }

    /// Number of pages that will be written.
    pub fn page_count(&self) -> usize {
        self.programmed().count()
    }

    fn programmed(&self) -> impl Iterator<Item = (&u32, &[u8; PAYLOAD_SIZE])> {
        self.pages.iter().filter(|(_, page)| page.iter().any(|&b| b != 0xFF))
    }

    /// Encode the programmed pages as UF2 blocks, in address order.
    pub fn encode(&self, family_id: u32) -> Result<Vec<u8>> {
        let total = self.page_count();
        if total == 0 {
            bail!("image contains no programmed bytes");
        }

        let mut out = Vec::with_capacity(total * BLOCK_SIZE);
        for (block_no, (&address, page)) in self.programmed().enumerate() {
            out.extend_from_slice(&encode_block(address, page, block_no as u32, total as u32, family_id));
        }
        Ok(out)
    }
}

fn encode_block(
    address: u32,
    page: &[u8; PAYLOAD_SIZE],
    block_no: u32,
    total: u32,
    family_id: u32,
) -> [u8; BLOCK_SIZE] {
    let mut block = [0u8; BLOCK_SIZE];
    let header = [
        MAGIC_START0,
        MAGIC_START1,
        FLAG_FAMILY_ID_PRESENT,
        address,
        PAYLOAD_SIZE as u32,
        block_no,
        total,
        family_id,
    ];
    for (i, word) in header.iter().enumerate() {
        block[i * 4..i * 4 + 4].copy_from_slice(&word.to_le_bytes());
    }

    block[32..32 + PAYLOAD_SIZE].copy_from_slice(page);

    block[32 + DATA_AREA..].copy_from_slice(&MAGIC_END.to_le_bytes());
    block
}

#[cfg(test)]
mod tests {
    use super::*;

    fn word(block: &[u8], offset: usize) -> u32 {
        u32::from_le_bytes(block[offset..offset + 4].try_into().unwrap())
    }

    #[test]
    fn test_single_block() {
        let mut image = Uf2Image::new();
        image.write(FLASH_BASE, &[0x00, 0x20, 0x04, 0x20]).unwrap();
        let out = image.encode(FAMILY_RP2040).unwrap();

        assert_eq!(out.len(), BLOCK_SIZE);
        assert_eq!(word(&out, 0), MAGIC_START0);
        assert_eq!(word(&out, 4), MAGIC_START1);
        assert_eq!(word(&out, 8), FLAG_FAMILY_ID_PRESENT);
        assert_eq!(word(&out, 12), FLASH_BASE);
        assert_eq!(word(&out, 16), 256);
        assert_eq!(word(&out, 20), 0);
        assert_eq!(word(&out, 24), 1);
        assert_eq!(word(&out, 28), FAMILY_RP2040);
        assert_eq!(&out[32..36], &[0x00, 0x20, 0x04, 0x20]);
        assert_eq!(out[36], 0xFF);
        assert_eq!(word(&out, 508), MAGIC_END);
    }

    #[test]
    fn test_run_across_page_boundary() {
        let mut image = Uf2Image::new();
        image.write(FLASH_BASE + 0xF0, &[0xAA; 0x20]).unwrap();
        // Out of order, lands in page 3
        image.write(FLASH_BASE + 0x300, &[0xBB]).unwrap();
        assert_eq!(image.page_count(), 3);

        let out = image.encode(FAMILY_RP2040).unwrap();
        assert_eq!(out.len(), 3 * BLOCK_SIZE);
        assert_eq!(out[32 + 0xEF], 0xFF);
        assert_eq!(out[32 + 0xF0], 0xAA);
        assert_eq!(out[32 + 0xFF], 0xAA);

        let second = &out[BLOCK_SIZE..];
        assert_eq!(word(second, 12), FLASH_BASE + 0x100);
        assert_eq!(&second[32..32 + 0x10], &[0xAA; 0x10]);
        assert_eq!(second[32 + 0x10], 0xFF);

        let third = &out[2 * BLOCK_SIZE..];
        assert_eq!(word(third, 12), FLASH_BASE + 0x300);
        assert_eq!(word(third, 20), 2);
        assert_eq!(word(third, 24), 3);
        assert_eq!(third[32], 0xBB);
    }

    #[test]
    fn test_erased_pages_skipped() {
        let mut image = Uf2Image::new();
        image.write(FLASH_BASE, &[0xFF; PAYLOAD_SIZE]).unwrap();
        image.write(FLASH_BASE + 0x100, &[0x01]).unwrap();
        let out = image.encode(FAMILY_RP2040).unwrap();
        assert_eq!(out.len(), BLOCK_SIZE);
        assert_eq!(word(&out, 12), FLASH_BASE + 0x100);
    }

    #[test]
    fn test_from_hex() {
        let input = ":020000041000EA\n\
                     :0400000000200420B8\n\
                     :00000001FF\n";
        let image = Uf2Image::from_hex(input).unwrap();
        let out = image.encode(FAMILY_RP2040).unwrap();
        assert_eq!(word(&out, 12), FLASH_BASE);
        assert_eq!(&out[32..36], &[0x00, 0x20, 0x04, 0x20]);
    }

    #[test]
    fn test_below_flash_rejected() {
        assert!(Uf2Image::new().write(FLASH_BASE - 1, &[1]).is_err());
        assert!(Uf2Image::from_hex(":0100000042BD\n:00000001FF\n").is_err());

        let mut erased = Uf2Image::new();
        erased.write(FLASH_BASE, &[0xFF; 16]).unwrap();
        assert!(erased.encode(FAMILY_RP2040).is_err());
    }
}
