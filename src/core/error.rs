use thiserror::Error;

/// Everything that can go wrong while constructing the core.
///
/// The running core has no recoverable errors: bus misses are silently
/// ignored just like on hardware, and impossible internal states (an unknown
/// opcode reaching dispatch, the always-set status bit reading as zero) are
/// programming bugs that abort with a diagnostic dump rather than surface
/// here.
#[derive(Debug, Error)]
pub enum Error {
    /// The cartridge image has a bad magic number or is smaller than its
    /// header claims.
    #[error("invalid cartridge image: {0}")]
    InvalidCartridge(&'static str),
    /// The cartridge needs a mapper this crate does not implement.
    #[error("unsupported mapper {0:03}")]
    UnsupportedMapper(u8),
    /// The cartridge image could not be read at all.
    #[error("failed to read cartridge image")]
    Io(#[from] std::io::Error),
}
