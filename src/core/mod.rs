//! The emulation core, provided as an out-of-the-box library.
//!
//! Models the entire console as one [`Nes`] value: a [`Cpu`], [`Ppu`] and
//! [`Apu`] clocked by a [`Bus`], with a [`Cartridge`] inserted and one
//! [`Controller`] plugged in. The external driver advances the machine one
//! master tick at a time and reads the published buffers in between.
//! ```
//! use famicore::core::{Button, Cartridge, Nes};
//! # let mut image = vec![0x4E, 0x45, 0x53, 0x1A, 0x02, 0x01, 0x00, 0x00];
//! # image.resize(16, 0x00);
//! # image.extend_from_slice(&[0u8; 2 * 0x4000 + 0x2000]);
//! let mut nes = Nes::new(Cartridge::from_ines(&image).unwrap());
//! // Advance the NES by one master tick
//! nes.tick();
//! // Advance the NES until the PPU finishes the current frame
//! nes.advance_frame();
//! // Press the A button on the controller
//! nes.set_button(Button::A, true);
//! // Read the screen output
//! let frame = nes.frame();
//! # assert_eq!(frame.len(), 256 * 240);
//! ```
mod error;
pub use error::Error;
mod nes;
pub use nes::Nes;
mod bus;
pub use bus::Bus;
mod cpu;
pub use cpu::{Cpu, CpuBus};
pub mod opcodes;
mod status_register;
pub use status_register::StatusRegister;
mod ppu;
pub use ppu::{OamEntry, Ppu, SCREEN_HEIGHT, SCREEN_WIDTH};
mod apu;
pub use apu::Apu;
mod dsp;
pub use dsp::{FilterChain, HighPass, LowPass};
mod cartridge;
pub use cartridge::*;
mod controller;
pub use controller::{Button, Controller};

/// The master (PPU) clock rate in Hz. The CPU and APU run at a third of it.
pub const MASTER_CLOCK_HZ: u64 = 5_369_318;
/// The CPU clock rate in Hz.
pub const CPU_CLOCK_HZ: u64 = MASTER_CLOCK_HZ / 3;
/// Audio output sample rate in Hz.
pub const SAMPLE_RATE_HZ: u64 = 44_100;
/// Number of slots in the APU's output sample ring.
pub const AUDIO_RING_LEN: usize = 512;

/// Address of the NMI vector.
pub const NMI_VECTOR: u16 = 0xFFFA;
/// Address of the reset vector.
pub const RESET_VECTOR: u16 = 0xFFFC;
/// Address of the IRQ/BRK vector.
pub const IRQ_VECTOR: u16 = 0xFFFE;
