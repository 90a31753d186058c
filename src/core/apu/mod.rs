mod dmc;
mod envelope;
mod length_counter;
mod noise;
mod pulse;
mod sweep;
mod triangle;

use log::*;

use crate::core::{
    dsp::FilterChain, Cartridge, AUDIO_RING_LEN, CPU_CLOCK_HZ, SAMPLE_RATE_HZ,
};
use dmc::Dmc;
use noise::Noise;
use pulse::Pulse;
use triangle::Triangle;

// The frame sequencer fires at 240 Hz.
const FRAME_SEQUENCER_INTERVAL: u64 = CPU_CLOCK_HZ / 240;

/// The audio processing unit.
///
/// Two pulse channels, a triangle, a noise channel and the DMC, all paced
/// by a frame sequencer and mixed through the hardware's lookup-table
/// approximation into a ring of 44.1 kHz samples. [`Apu::tick`] advances
/// one CPU cycle; the cartridge is borrowed so the DMC can fetch sample
/// bytes from PRG space.
pub struct Apu {
    pulse: [Pulse; 2],
    triangle: Triangle,
    noise: Noise,
    dmc: Dmc,
    // CPU cycles elapsed since power-on
    ticks: u64,
    sequencer_step: u8,
    five_step_mode: bool,
    irq_inhibit: bool,
    // Frame IRQ flag; the line to the CPU is TODO (nothing ships that needs it)
    frame_irq: bool,
    // Fractional accumulator deciding when to emit a sample
    sample_acc: u64,
    samples_produced: u64,
    pulse_lut: [f32; 31],
    tnd_lut: [f32; 203],
    filters: FilterChain,
    ring: [f32; AUDIO_RING_LEN],
    ring_head: usize,
}

impl Apu {
    pub fn new() -> Apu {
        // LUT-based mixing, matching the hardware's nonlinear DAC.
        let mut pulse_lut = [0.0; 31];
        for (i, entry) in pulse_lut.iter_mut().enumerate().skip(1) {
            *entry = 95.52 / (8128.0 / i as f32 + 100.0);
        }
        let mut tnd_lut = [0.0; 203];
        for (i, entry) in tnd_lut.iter_mut().enumerate().skip(1) {
            *entry = 163.67 / (24329.0 / i as f32 + 100.0);
        }
        Apu {
            pulse: [Pulse::default(); 2],
            triangle: Triangle::default(),
            noise: Noise::default(),
            dmc: Dmc::default(),
            ticks: 0,
            sequencer_step: 0,
            five_step_mode: false,
            irq_inhibit: false,
            frame_irq: false,
            sample_acc: 0,
            samples_produced: 0,
            pulse_lut,
            tnd_lut,
            filters: FilterChain::new(SAMPLE_RATE_HZ as u32),
            ring: [0.0; AUDIO_RING_LEN],
            ring_head: 0,
        }
    }

    /// Write an APU register (`$4000..=$4013`, `$4015` or `$4017`).
    pub fn write_register(&mut self, addr: u16, value: u8) {
        match addr {
            0x4000..=0x4003 => self.pulse[0].write_register(addr, value),
            0x4004..=0x4007 => self.pulse[1].write_register(addr, value),
            0x4008..=0x400B => self.triangle.write_register(addr, value),
            0x400C..=0x400F => self.noise.write_register(addr, value),
            0x4010..=0x4013 => self.dmc.write_register(addr, value),
            0x4015 => {
                self.pulse[0].set_enabled(value & 0x01 != 0);
                self.pulse[1].set_enabled(value & 0x02 != 0);
                self.triangle.set_enabled(value & 0x04 != 0);
                self.noise.set_enabled(value & 0x08 != 0);
                self.dmc.set_enabled(value & 0x10 != 0);
            }
            0x4017 => {
                self.five_step_mode = value & 0x80 != 0;
                self.irq_inhibit = value & 0x40 != 0;
                if self.irq_inhibit {
                    self.frame_irq = false;
                }
                self.sequencer_step = 0;
                // Entering five-step mode clocks both units immediately.
                if self.five_step_mode {
                    self.clock_quarter_frame();
                    self.clock_half_frame();
                }
            }
            _ => trace!("ignoring APU write to {:#06X}", addr),
        }
    }

    /// Read the channel status register (`$4015`). Clears the frame IRQ
    /// flag.
    pub fn read_status(&mut self) -> u8 {
        let mut value = 0;
        if self.pulse[0].length_counter.active() {
            value |= 0x01;
        }
        if self.pulse[1].length_counter.active() {
            value |= 0x02;
        }
        if self.triangle.length_counter.active() {
            value |= 0x04;
        }
        if self.noise.length_counter.active() {
            value |= 0x08;
        }
        if self.dmc.playing() {
            value |= 0x10;
        }
        if self.frame_irq {
            value |= 0x40;
        }
        if self.dmc.irq_flag {
            value |= 0x80;
        }
        self.frame_irq = false;
        value
    }

    /// Advance the APU by one CPU cycle.
    pub fn tick(&mut self, cartridge: &mut Cartridge) {
        // Pulse and noise timers run at half the CPU rate.
        if self.ticks % 2 == 0 {
            self.pulse[0].clock_timer();
            self.pulse[1].clock_timer();
            self.noise.clock_timer();
        }
        self.triangle.clock_timer();
        self.dmc.clock_timer(cartridge);

        if self.ticks % FRAME_SEQUENCER_INTERVAL == 0 {
            self.clock_sequencer();
        }

        // Emit samples at 44.1 kHz without accumulating rounding drift.
        self.sample_acc += SAMPLE_RATE_HZ;
        if self.sample_acc >= CPU_CLOCK_HZ {
            self.sample_acc -= CPU_CLOCK_HZ;
            let sample = self.mix();
            let filtered = self.filters.filter(sample);
            self.ring[self.ring_head] = filtered;
            self.ring_head = (self.ring_head + 1) % AUDIO_RING_LEN;
            self.samples_produced += 1;
        }

        self.ticks += 1;
    }

    fn clock_sequencer(&mut self) {
        if self.five_step_mode {
            match self.sequencer_step {
                0 | 2 => self.clock_quarter_frame(),
                1 => {
                    self.clock_quarter_frame();
                    self.clock_half_frame();
                }
                3 => {}
                4 => {
                    self.clock_quarter_frame();
                    self.clock_half_frame();
                }
                _ => unreachable!(),
            }
            self.sequencer_step = (self.sequencer_step + 1) % 5;
        } else {
            match self.sequencer_step {
                0 | 2 => self.clock_quarter_frame(),
                1 => {
                    self.clock_quarter_frame();
                    self.clock_half_frame();
                }
                3 => {
                    self.clock_quarter_frame();
                    self.clock_half_frame();
                    if !self.irq_inhibit {
                        self.frame_irq = true;
                    }
                }
                _ => unreachable!(),
            }
            self.sequencer_step = (self.sequencer_step + 1) % 4;
        }
    }

    // Envelopes and the triangle's linear counter.
    fn clock_quarter_frame(&mut self) {
        self.pulse[0].envelope.clock();
        self.pulse[1].envelope.clock();
        self.noise.envelope.clock();
        self.triangle.clock_linear_counter();
    }

    // Length counters and sweeps.
    fn clock_half_frame(&mut self) {
        self.pulse[0].length_counter.clock();
        self.pulse[1].length_counter.clock();
        self.triangle.length_counter.clock();
        self.noise.length_counter.clock();
        self.pulse[0].clock_sweep();
        self.pulse[1].clock_sweep();
    }

    fn mix(&self) -> f32 {
        let p = (self.pulse[0].output() + self.pulse[1].output()) as usize;
        let tnd = 3 * self.triangle.output() as usize
            + 2 * self.noise.output() as usize
            + self.dmc.output() as usize;
        self.pulse_lut[p] + self.tnd_lut[tnd]
    }

    /// The ring of the most recent output samples.
    pub fn samples(&self) -> &[f32; AUDIO_RING_LEN] {
        &self.ring
    }

    /// Total samples emitted since power-on.
    pub fn samples_produced(&self) -> u64 {
        self.samples_produced
    }
}

impl Default for Apu {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_cartridge() -> Cartridge {
        let mut bytes = vec![b'N', b'E', b'S', 0x1A, 0x01, 0x01, 0x00, 0x00];
        bytes.resize(16, 0x00);
        bytes.resize(16 + 0x4000 + 0x2000, 0x00);
        Cartridge::from_ines(&bytes).unwrap()
    }

    #[test]
    fn test_mixer_luts() {
        let apu = Apu::new();
        assert_eq!(apu.pulse_lut[0], 0.0);
        assert_eq!(apu.tnd_lut[0], 0.0);
        assert!((apu.pulse_lut[30] - 95.52 / (8128.0 / 30.0 + 100.0)).abs() < 1e-6);
        assert!((apu.tnd_lut[202] - 163.67 / (24329.0 / 202.0 + 100.0)).abs() < 1e-6);
        // Mixed silence really is silence.
        assert_eq!(apu.mix(), 0.0);
    }

    #[test]
    fn test_status_reports_length_counters() {
        let mut apu = Apu::new();
        apu.write_register(0x4015, 0x03);
        apu.write_register(0x4003, 0x08);
        assert_eq!(apu.read_status() & 0x03, 0x01);
        apu.write_register(0x4015, 0x00);
        assert_eq!(apu.read_status() & 0x03, 0x00);
    }

    #[test]
    fn test_sample_rate() {
        let mut apu = Apu::new();
        let mut cartridge = test_cartridge();
        // One emulated second of CPU cycles.
        for _ in 0..CPU_CLOCK_HZ {
            apu.tick(&mut cartridge);
        }
        let produced = apu.samples_produced();
        assert!(produced.abs_diff(SAMPLE_RATE_HZ) <= 1);
    }

    #[test]
    fn test_four_step_mode_raises_frame_irq() {
        let mut apu = Apu::new();
        let mut cartridge = test_cartridge();
        for _ in 0..CPU_CLOCK_HZ / 60 {
            apu.tick(&mut cartridge);
        }
        assert_eq!(apu.read_status() & 0x40, 0x40);
        // The read cleared it.
        assert_eq!(apu.read_status() & 0x40, 0x00);
    }

    #[test]
    fn test_irq_inhibit() {
        let mut apu = Apu::new();
        let mut cartridge = test_cartridge();
        apu.write_register(0x4017, 0x40);
        for _ in 0..CPU_CLOCK_HZ / 60 {
            apu.tick(&mut cartridge);
        }
        assert_eq!(apu.read_status() & 0x40, 0x00);
    }
}
