use crate::core::Error;

use super::mappers::Nrom;

/// Address translation for a cartridge.
///
/// Each predicate answers whether the cartridge claims the given address,
/// and if so where in PRG or CHR storage it lands. `None` means "not
/// handled": the bus routes the access to its own devices instead.
pub trait Mapper {
    fn map_bus_read(&self, addr: u16) -> Option<usize>;
    fn map_bus_write(&self, addr: u16) -> Option<usize>;
    fn map_ppu_read(&self, addr: u16) -> Option<usize>;
    fn map_ppu_write(&self, addr: u16) -> Option<usize>;
}

/// Build the mapper a cartridge header asks for.
pub fn mapper_for_id(id: u8, prg_banks: u8, chr_banks: u8) -> Result<Box<dyn Mapper>, Error> {
    match id {
        0 => Ok(Box::new(Nrom::new(prg_banks, chr_banks))),
        _ => Err(Error::UnsupportedMapper(id)),
    }
}
