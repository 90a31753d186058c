use std::path::Path;

use log::*;

use crate::core::{Bus, Button, Cartridge, Cpu, CpuBus, Error, SCREEN_HEIGHT, SCREEN_WIDTH};

/// The console.
///
/// Couples the [`Cpu`] to the [`Bus`] that owns everything else and drives
/// the master clock: the PPU runs on every tick, the APU and the CPU on
/// every third. The CPU sits beside the bus rather than on it so an
/// instruction can borrow the bus mutably while it executes.
pub struct Nes {
    pub cpu: Cpu,
    pub bus: Bus,
}

impl Nes {
    /// Power on a console with the given cartridge inserted.
    ///
    /// The CPU comes up already reset: the PC holds the reset vector and
    /// the 8-cycle reset sequence is pending.
    pub fn new(cartridge: Cartridge) -> Nes {
        let mut bus = Bus::new(cartridge);
        let mut cpu = Cpu::new();
        cpu.rst(&mut bus);
        info!("powered on, PC = {:#06X}", cpu.pc);
        Nes { cpu, bus }
    }

    /// Parse an iNES image and power on with it.
    pub fn from_ines(bytes: &[u8]) -> Result<Nes, Error> {
        Ok(Nes::new(Cartridge::from_ines(bytes)?))
    }

    /// Read an iNES file from disk and power on with it.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Nes, Error> {
        Ok(Nes::new(Cartridge::load(path)?))
    }

    /// Advance the console by one master tick.
    ///
    /// Order within a tick is fixed: the PPU first, then on every third
    /// tick the APU followed by the CPU (or the DMA engine while a
    /// transfer is in flight), then NMI delivery.
    pub fn tick(&mut self) {
        self.bus.ppu.tick(&mut self.bus.cartridge);

        if self.bus.elapsed_cycles % 3 == 0 {
            self.bus.apu.tick(&mut self.bus.cartridge);
            if self.bus.oam_dma {
                self.bus.dma_tick();
            } else {
                self.cpu.tick(&mut self.bus);
            }
        }

        if self.bus.ppu.nmi {
            self.bus.ppu.nmi = false;
            self.cpu.nmi(&mut self.bus);
        }

        self.bus.elapsed_cycles += 1;
    }

    /// Advance the console until the PPU finishes the current frame.
    pub fn advance_frame(&mut self) {
        while !self.bus.ppu.frame_complete {
            self.tick();
        }
        self.bus.ppu.frame_complete = false;
    }

    /// Advance the console until the APU has produced `count` more audio
    /// samples.
    pub fn advance_samples(&mut self, count: u64) {
        let target = self.bus.apu.samples_produced() + count;
        while self.bus.apu.samples_produced() < target {
            self.tick();
        }
    }

    /// Press the reset button.
    pub fn reset(&mut self) {
        self.cpu.rst(&mut self.bus);
    }

    /// Update one button of the controller in port 1.
    pub fn set_button(&mut self, button: Button, pressed: bool) {
        self.bus.controller.set_button(button, pressed);
    }

    /// The finished front framebuffer.
    pub fn frame(&self) -> &[u32; SCREEN_WIDTH * SCREEN_HEIGHT] {
        self.bus.ppu.frame()
    }

    /// Read a byte through the CPU's view of the bus.
    ///
    /// Not side-effect free: reading some registers changes state, exactly
    /// as it would for the CPU.
    /// ```
    /// # let mut image = vec![0x4E, 0x45, 0x53, 0x1A, 0x01, 0x01, 0x00, 0x00];
    /// # image.resize(16, 0x00);
    /// # image.resize(16 + 0x4000 + 0x2000, 0x00);
    /// let mut nes = famicore::core::Nes::from_ines(&image).unwrap();
    /// nes.write_byte(0x0123, 0x45);
    /// assert_eq!(nes.read_byte(0x0123), 0x45);
    /// ```
    pub fn read_byte(&mut self, addr: u16) -> u8 {
        self.bus.read(addr)
    }

    /// Write a byte through the CPU's view of the bus.
    pub fn write_byte(&mut self, addr: u16, value: u8) {
        self.bus.write(addr, value)
    }
}
