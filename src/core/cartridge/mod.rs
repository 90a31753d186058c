mod mapper;
pub use mapper::{mapper_for_id, Mapper};
pub mod mappers;

use std::path::Path;

use log::*;

use crate::core::Error;

/// How the two nametables are mirrored into the four logical screens.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mirroring {
    Horizontal,
    Vertical,
    OneScreenLo,
    OneScreenHi,
}

const INES_MAGIC: [u8; 4] = [b'N', b'E', b'S', 0x1A];
const HEADER_LEN: usize = 16;
const TRAINER_LEN: usize = 512;
/// PRG ROM comes in 16 KiB chunks.
pub const PRG_BANK_LEN: usize = 0x4000;
/// CHR ROM comes in 8 KiB chunks.
pub const CHR_BANK_LEN: usize = 0x2000;

/// An NES cartridge.
///
/// Holds the PRG and CHR images and the [Mapper] that translates bus and
/// PPU addresses into them. Constructed from an iNES image with
/// [`Cartridge::from_ines`] or straight from disk with [`Cartridge::load`].
pub struct Cartridge {
    prg: Vec<u8>,
    chr: Vec<u8>,
    prg_banks: u8,
    chr_banks: u8,
    /// Nametable mirroring declared by the header.
    pub mirroring: Mirroring,
    mapper: Box<dyn Mapper>,
}

impl Cartridge {
    /// Read an iNES file from disk and parse it.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Cartridge, Error> {
        let bytes = std::fs::read(path)?;
        Self::from_ines(&bytes)
    }

    /// Parse the contents of an iNES (.nes) image.
    ///
    /// The 16-byte header carries the magic number, the PRG and CHR chunk
    /// counts, and two flag bytes holding the split mapper ID, the
    /// mirroring bit and the trainer bit. A set trainer bit means 512 bytes
    /// to skip before the PRG image. Zero CHR chunks means the cartridge
    /// carries 8 KiB of CHR-RAM instead of ROM.
    pub fn from_ines(bytes: &[u8]) -> Result<Cartridge, Error> {
        if bytes.len() < HEADER_LEN {
            return Err(Error::InvalidCartridge("image shorter than the header"));
        }
        if bytes[0..4] != INES_MAGIC {
            return Err(Error::InvalidCartridge("bad magic number"));
        }
        let prg_banks = bytes[4];
        let chr_banks = bytes[5];
        let flags_1 = bytes[6];
        let flags_2 = bytes[7];
        if prg_banks == 0 {
            return Err(Error::InvalidCartridge("no PRG banks"));
        }

        let mapper_id = (flags_1 >> 4) | (flags_2 & 0xF0);
        let mirroring = if flags_1 & 0x01 != 0 {
            Mirroring::Vertical
        } else {
            Mirroring::Horizontal
        };
        let has_trainer = flags_1 & 0x04 != 0;
        debug!("cartridge header: {:02X?}", &bytes[0..HEADER_LEN]);
        debug!(
            "{} PRG bank(s), {} CHR bank(s), mapper {:03}, {:?} mirroring, trainer: {}",
            prg_banks, chr_banks, mapper_id, mirroring, has_trainer
        );

        let prg_len = prg_banks as usize * PRG_BANK_LEN;
        let chr_len = chr_banks as usize * CHR_BANK_LEN;
        let prg_start = HEADER_LEN + if has_trainer { TRAINER_LEN } else { 0 };
        if bytes.len() < prg_start + prg_len + chr_len {
            return Err(Error::InvalidCartridge("image smaller than header claims"));
        }

        let prg = bytes[prg_start..prg_start + prg_len].to_vec();
        let chr = if chr_banks == 0 {
            // No CHR image at all: the cartridge provides CHR-RAM.
            vec![0; CHR_BANK_LEN]
        } else {
            bytes[prg_start + prg_len..prg_start + prg_len + chr_len].to_vec()
        };
        let mapper = mapper_for_id(mapper_id, prg_banks, chr_banks)?;
        info!(
            "loaded cartridge: mapper {:03}, {} KiB PRG, {} KiB {}",
            mapper_id,
            prg.len() / 1024,
            chr.len() / 1024,
            if chr_banks == 0 { "CHR-RAM" } else { "CHR-ROM" }
        );

        Ok(Cartridge {
            prg,
            chr,
            prg_banks,
            chr_banks,
            mirroring,
            mapper,
        })
    }

    /// Read from CPU address space. `None` means the cartridge does not
    /// claim the address and the bus should route it elsewhere.
    pub fn bus_read(&self, addr: u16) -> Option<u8> {
        self.mapper
            .map_bus_read(addr)
            .map(|offset| self.prg[offset % self.prg.len()])
    }

    /// Write to CPU address space. Returns the claim flag.
    pub fn bus_write(&mut self, addr: u16, value: u8) -> bool {
        match self.mapper.map_bus_write(addr) {
            Some(offset) => {
                let len = self.prg.len();
                self.prg[offset % len] = value;
                true
            }
            None => false,
        }
    }

    /// Read from PPU address space (pattern tables).
    pub fn ppu_read(&self, addr: u16) -> Option<u8> {
        self.mapper
            .map_ppu_read(addr)
            .map(|offset| self.chr[offset % self.chr.len()])
    }

    /// Write to PPU address space. Lands only in CHR-RAM; the claim flag is
    /// returned either way the mapper decides.
    pub fn ppu_write(&mut self, addr: u16, value: u8) -> bool {
        match self.mapper.map_ppu_write(addr) {
            Some(offset) => {
                let len = self.chr.len();
                self.chr[offset % len] = value;
                true
            }
            None => false,
        }
    }

    pub fn prg_banks(&self) -> u8 {
        self.prg_banks
    }

    pub fn chr_banks(&self) -> u8 {
        self.chr_banks
    }
}
