/// Duration lookup shared by every channel's length counter.
const LENGTH_TABLE: [u8; 0x20] = [
    0x0A, 0xFE, 0x14, 0x02, 0x28, 0x04, 0x50, 0x06, 0xA0, 0x08, 0x3C, 0x0A, 0x0E, 0x0C, 0x1A, 0x0E,
    0x0C, 0x10, 0x18, 0x12, 0x30, 0x14, 0x60, 0x16, 0xC0, 0x18, 0x48, 0x1A, 0x10, 0x1C, 0x20, 0x1E,
];

/// A length counter.
///
/// Counts down once per half frame and silences its channel when it reaches
/// zero. Disabling the channel through `$4015` zeroes the counter and keeps
/// it from loading.
#[derive(Clone, Copy, Default, Debug)]
pub struct LengthCounter {
    /// Channel enable bit from `$4015`
    enabled: bool,
    /// Halt flag, pauses the countdown
    pub halt: bool,
    value: u8,
}

impl LengthCounter {
    /// Load a duration from the lookup table. Ignored while disabled.
    pub fn load(&mut self, index: u8) {
        if self.enabled {
            self.value = LENGTH_TABLE[index as usize & 0x1F];
        }
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if !enabled {
            self.value = 0;
        }
    }

    /// Clock the counter, once per half frame.
    pub fn clock(&mut self) {
        if !self.halt && self.value > 0 {
            self.value -= 1;
        }
    }

    /// `true` while the counter holds a nonzero duration.
    pub fn active(&self) -> bool {
        self.value > 0
    }

    /// `true` if the counter should be muting the channel.
    pub fn silenced(&self) -> bool {
        self.value == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_requires_enable() {
        let mut lc = LengthCounter::default();
        lc.load(0x01);
        assert!(lc.silenced());
        lc.set_enabled(true);
        lc.load(0x01);
        assert!(lc.active());
    }

    #[test]
    fn test_disable_clears_value() {
        let mut lc = LengthCounter::default();
        lc.set_enabled(true);
        lc.load(0x00);
        assert!(lc.active());
        lc.set_enabled(false);
        assert!(lc.silenced());
    }

    #[test]
    fn test_halt_pauses_countdown() {
        let mut lc = LengthCounter::default();
        lc.set_enabled(true);
        lc.load(0x03); // duration 2
        lc.clock();
        assert!(lc.active());
        lc.halt = true;
        lc.clock();
        assert!(lc.active());
        lc.halt = false;
        lc.clock();
        assert!(lc.silenced());
    }
}
