mod common;

use assert_hex::assert_eq_hex;
use famicore::core::{Button, Cartridge, Nes};

fn idle_nes() -> Nes {
    common::nes_with_prg(&common::idle_loop_prg())
}

#[test]
fn test_power_on_loads_reset_vector() {
    let nes = common::nes_with_prg(&[(0xFFFC, 0x34), (0xFFFD, 0x12)]);
    assert_eq_hex!(nes.cpu.pc, 0x1234);
    assert_eq!(nes.cpu.pending_cycles(), 8);
}

#[test]
fn test_frame_takes_341_by_262_dots() {
    let mut nes = idle_nes();
    let mut ticks = 0u64;
    while !nes.bus.ppu.frame_complete {
        nes.tick();
        ticks += 1;
    }
    assert_eq!(ticks, 341 * 262);
}

#[test]
fn test_odd_frame_skip_depends_on_rendering() {
    // Rendering disabled: dot 0 of scanline 0 is processed normally.
    let mut nes = idle_nes();
    while !(nes.bus.ppu.scanline() == 0 && nes.bus.ppu.dot() == 0) {
        nes.tick();
    }
    nes.tick();
    assert_eq!(nes.bus.ppu.dot(), 1);

    // Rendering enabled: the idle dot is skipped.
    let mut nes = idle_nes();
    nes.write_byte(0x2001, 0x08);
    while !(nes.bus.ppu.scanline() == 0 && nes.bus.ppu.dot() == 0) {
        nes.tick();
    }
    nes.tick();
    assert_eq!(nes.bus.ppu.dot(), 2);
}

#[test]
fn test_nmi_fires_once_at_vblank_start() {
    let mut prg = common::idle_loop_prg();
    prg.push((0x9000, 0x40)); // RTI
    prg.push((0xFFFA, 0x00));
    prg.push((0xFFFB, 0x90));
    let mut nes = common::nes_with_prg(&prg);
    nes.write_byte(0x2000, 0x80);

    let mut nmi_entries = 0;
    let mut previous_pc = nes.cpu.pc;
    for _ in 0..(341 * 262) {
        nes.tick();
        if nes.cpu.pc == 0x9000 && previous_pc != 0x9000 {
            nmi_entries += 1;
            // The NMI lands exactly at the start of vblank.
            assert_eq!(nes.bus.ppu.scanline(), 241);
            assert!(nes.bus.ppu.in_vblank());
        }
        previous_pc = nes.cpu.pc;
    }
    assert_eq!(nmi_entries, 1);
}

#[test]
fn test_nmi_disabled_never_fires() {
    let mut prg = common::idle_loop_prg();
    prg.push((0x9000, 0x40));
    prg.push((0xFFFA, 0x00));
    prg.push((0xFFFB, 0x90));
    let mut nes = common::nes_with_prg(&prg);

    for _ in 0..(341 * 262) {
        nes.tick();
        assert_ne!(nes.cpu.pc, 0x9000);
    }
    // The vblank flag still rises without the NMI.
    let mut saw_vblank = false;
    for _ in 0..(341 * 262) {
        nes.tick();
        saw_vblank |= nes.bus.ppu.in_vblank();
    }
    assert!(saw_vblank);
}

#[test]
fn test_oam_dma_copies_a_page_and_suspends_the_cpu() {
    let mut nes = idle_nes();
    for i in 0..=255u8 {
        nes.write_byte(0x0200 + i as u16, i.wrapping_mul(3));
    }

    nes.write_byte(0x4014, 0x02);
    assert!(nes.bus.dma_active());

    let mut cpu_slots = 0u32;
    while nes.bus.dma_active() {
        if nes.bus.elapsed_cycles % 3 == 0 {
            cpu_slots += 1;
        }
        nes.tick();
    }
    assert!(
        cpu_slots == 513 || cpu_slots == 514,
        "DMA took {} CPU cycles",
        cpu_slots
    );
    for i in 0..=255u8 {
        assert_eq_hex!(nes.bus.ppu.oam_read(i), i.wrapping_mul(3));
    }
}

#[test]
fn test_oam_dma_alignment_costs_one_cycle() {
    // Trigger the DMA from both master-clock parities and expect the two
    // documented durations.
    let mut durations = std::collections::HashSet::new();
    for offset in 0..6u64 {
        let mut nes = idle_nes();
        for _ in 0..offset {
            nes.tick();
        }
        nes.write_byte(0x4014, 0x02);
        let mut cpu_slots = 0u32;
        while nes.bus.dma_active() {
            if nes.bus.elapsed_cycles % 3 == 0 {
                cpu_slots += 1;
            }
            nes.tick();
        }
        assert!(cpu_slots == 513 || cpu_slots == 514);
        durations.insert(cpu_slots);
    }
    assert_eq!(durations.len(), 2);
}

#[test]
fn test_controller_strobe_then_serial_read() {
    let mut nes = idle_nes();
    nes.set_button(Button::A, true);
    nes.set_button(Button::Select, true);
    nes.set_button(Button::Down, true);
    nes.set_button(Button::Right, true);

    nes.write_byte(0x4016, 0x01);
    // Releasing a button after the strobe must not affect the capture.
    nes.set_button(Button::A, false);

    let bits: Vec<u8> = (0..8).map(|_| nes.read_byte(0x4016)).collect();
    // A, B, Select, Start, Up, Down, Left, Right.
    assert_eq!(bits, vec![1, 0, 1, 0, 0, 1, 0, 1]);
}

#[test]
fn test_sprite_zero_hit() {
    let mut nes = Nes::new(Cartridge::from_ines(&common::ines_image(&common::idle_loop_prg(), 0)).unwrap());

    {
        let bus = &mut nes.bus;
        // Tile 0: an opaque 8x8 block for the background.
        for row in 0..8 {
            bus.ppu.ppu_write(&mut bus.cartridge, row, 0xFF);
        }
        // Tile 1: an opaque block for sprite 0.
        for row in 0..8 {
            bus.ppu.ppu_write(&mut bus.cartridge, 0x10 + row, 0xFF);
        }
    }

    // Sprite 0 somewhere in the middle of the screen.
    nes.bus.ppu.oam[0].y = 50;
    nes.bus.ppu.oam[0].id = 1;
    nes.bus.ppu.oam[0].attribute = 0x00;
    nes.bus.ppu.oam[0].x = 100;

    // Both layers on, including the left edge.
    nes.write_byte(0x2001, 0x1E);

    assert!(!nes.bus.ppu.sprite_zero_hit());
    nes.advance_frame();
    assert!(nes.bus.ppu.sprite_zero_hit());
}

#[test]
fn test_sprite_zero_hit_requires_both_layers() {
    let mut nes = Nes::new(Cartridge::from_ines(&common::ines_image(&common::idle_loop_prg(), 0)).unwrap());
    {
        let bus = &mut nes.bus;
        for row in 0..8 {
            bus.ppu.ppu_write(&mut bus.cartridge, row, 0xFF);
            bus.ppu.ppu_write(&mut bus.cartridge, 0x10 + row, 0xFF);
        }
    }
    nes.bus.ppu.oam[0].y = 50;
    nes.bus.ppu.oam[0].id = 1;
    nes.bus.ppu.oam[0].attribute = 0x00;
    nes.bus.ppu.oam[0].x = 100;

    // Sprites only: no hit can be generated.
    nes.write_byte(0x2001, 0x10);
    nes.advance_frame();
    assert!(!nes.bus.ppu.sprite_zero_hit());
}

#[test]
fn test_reset_rereads_vector() {
    let mut nes = common::nes_with_prg(&[(0xFFFC, 0x00), (0xFFFD, 0x80), (0x8000, 0xEA)]);
    for _ in 0..100 {
        nes.tick();
    }
    nes.reset();
    assert_eq_hex!(nes.cpu.pc, 0x8000);
    assert_eq!(nes.cpu.pending_cycles(), 8);
}

#[test]
fn test_audio_samples_accumulate() {
    let mut nes = idle_nes();
    nes.write_byte(0x4015, 0x0F);
    nes.advance_samples(64);
    assert!(nes.bus.apu.samples_produced() >= 64);
}
