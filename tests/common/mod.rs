use famicore::core::{Cartridge, Nes};
use simplelog::{Config, LevelFilter, SimpleLogger};

/// Route `log` output to stderr for debugging test failures. Safe to call
/// more than once; later calls lose the race and are ignored.
pub fn init_logging() {
    let _ = SimpleLogger::init(LevelFilter::Debug, Config::default());
}

/// Build an iNES image: 32 KiB of PRG mapped at `$8000..=$FFFF` plus one
/// CHR bank (`chr_banks = 0` for CHR-RAM).
pub fn ines_image(prg: &[(u16, u8)], chr_banks: u8) -> Vec<u8> {
    let mut bytes = vec![b'N', b'E', b'S', 0x1A, 0x02, chr_banks, 0x00, 0x00];
    bytes.resize(16, 0x00);
    bytes.resize(16 + 2 * 0x4000 + chr_banks as usize * 0x2000, 0x00);
    for &(addr, value) in prg {
        assert!(addr >= 0x8000);
        bytes[16 + (addr - 0x8000) as usize] = value;
    }
    bytes
}

/// Power on a console whose PRG holds the given bytes.
pub fn nes_with_prg(prg: &[(u16, u8)]) -> Nes {
    init_logging();
    Nes::new(Cartridge::from_ines(&ines_image(prg, 0)).unwrap())
}

/// A program that parks the CPU in a tight loop at `$8000`, with the reset
/// vector pointing there.
pub fn idle_loop_prg() -> Vec<(u16, u8)> {
    vec![
        (0x8000, 0x4C), // JMP $8000
        (0x8001, 0x00),
        (0x8002, 0x80),
        (0xFFFC, 0x00),
        (0xFFFD, 0x80),
    ]
}
