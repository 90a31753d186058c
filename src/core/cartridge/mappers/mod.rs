//! Implementations of the cartridge mappers this crate supports.
//! See [Mapper][super::Mapper].
mod nrom;
pub use nrom::Nrom;
