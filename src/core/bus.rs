use log::*;

use crate::core::{Apu, Cartridge, Controller, CpuBus, Ppu};

const WRAM_LEN: usize = 0x0800;

/// The system bus.
///
/// Owns WRAM and the peripherals, and dispatches every CPU memory access by
/// address range; anything the cartridge claims takes precedence. Also runs
/// the OAM DMA engine, which steals the CPU's cycle slots while active.
pub struct Bus {
    /// 2 KiB of work RAM, mirrored four times over `$0000..=$1FFF`
    pub wram: [u8; WRAM_LEN],
    /// The cartridge inserted in the console
    pub cartridge: Cartridge,
    pub ppu: Ppu,
    pub apu: Apu,
    /// The controller in port 1
    pub controller: Controller,
    // Controller state captured by the strobe, shifted out MSB first
    captured_controller: u8,
    // OAM DMA state machine
    pub(crate) oam_dma: bool,
    dma_wait: bool,
    oam_page: u8,
    oam_addr: u8,
    dma_data: u8,
    /// Master ticks since power-on
    pub elapsed_cycles: u64,
}

impl Bus {
    pub fn new(cartridge: Cartridge) -> Bus {
        trace!("creating a new bus with {} bytes of WRAM", WRAM_LEN);
        Bus {
            wram: [0; WRAM_LEN],
            cartridge,
            ppu: Ppu::new(),
            apu: Apu::new(),
            controller: Controller::new(),
            captured_controller: 0,
            oam_dma: false,
            dma_wait: true,
            oam_page: 0,
            oam_addr: 0,
            dma_data: 0,
            elapsed_cycles: 0,
        }
    }

    /// `true` while an OAM DMA transfer is stealing the CPU's cycles.
    pub fn dma_active(&self) -> bool {
        self.oam_dma
    }

    /// Advance the DMA engine by one CPU cycle slot.
    ///
    /// The engine first waits for an odd master tick to align itself, then
    /// alternates read and write cycles until the whole page has been
    /// copied: 513 or 514 CPU cycles depending on where it started.
    pub(crate) fn dma_tick(&mut self) {
        if self.dma_wait {
            if self.elapsed_cycles % 2 == 1 {
                self.dma_wait = false;
            }
        } else if self.elapsed_cycles % 2 == 0 {
            self.dma_data = self.read(((self.oam_page as u16) << 8) | self.oam_addr as u16);
        } else {
            self.ppu.oam_write(self.oam_addr, self.dma_data);
            self.oam_addr = self.oam_addr.wrapping_add(1);
            if self.oam_addr == 0 {
                debug!("OAM DMA from page {:#04X} finished", self.oam_page);
                self.dma_data = 0;
                self.dma_wait = true;
                self.oam_dma = false;
            }
        }
    }
}

impl CpuBus for Bus {
    fn read(&mut self, addr: u16) -> u8 {
        if let Some(value) = self.cartridge.bus_read(addr) {
            return value;
        }
        match addr {
            0x0000..=0x1FFF => self.wram[(addr & 0x07FF) as usize],
            0x2000..=0x3FFF => self.ppu.read_register(addr, &mut self.cartridge),
            0x4015 => self.apu.read_status(),
            // Serial controller port: pop the most significant bit.
            0x4016..=0x4017 => {
                let bit = (self.captured_controller & 0x80 != 0) as u8;
                self.captured_controller <<= 1;
                bit
            }
            _ => {
                trace!("ignoring read from {:#06X}", addr);
                0
            }
        }
    }

    fn write(&mut self, addr: u16, value: u8) {
        if self.cartridge.bus_write(addr, value) {
            return;
        }
        match addr {
            0x0000..=0x1FFF => self.wram[(addr & 0x07FF) as usize] = value,
            0x2000..=0x3FFF => self.ppu.write_register(addr, value, &mut self.cartridge),
            0x4014 => {
                debug!("starting OAM DMA on page {:#04X}", value);
                self.oam_page = value;
                self.oam_addr = 0;
                self.oam_dma = true;
                self.dma_wait = true;
            }
            // Strobe: latch the live controller state for serial readout.
            0x4016 => self.captured_controller = self.controller.state(),
            0x4000..=0x4013 | 0x4015 | 0x4017 => self.apu.write_register(addr, value),
            _ => trace!("ignoring write to {:#06X}", addr),
        }
    }
}
