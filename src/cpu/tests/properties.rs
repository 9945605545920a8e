//! Universal properties and concrete end-to-end scenarios every
//! instruction sequence must satisfy.

use super::*;

fn pc_invariant_holds(cpu: &Cpu, bus: &Bus) {
    let expected_bank = (cpu.pc >> 14) & 0x03;
    assert_eq!(
        bus.memory.current_bank() as u16,
        expected_bank,
        "current_bank must track pc>>14"
    );
}

fn flag_shape_holds(cpu: &Cpu) {
    assert_eq!(cpu.f & 0x02, 0x02, "bit 1 of F must always read as 1");
    assert_eq!(cpu.f & 0x28, 0x00, "bits 3 and 5 of F must always read as 0");
}

#[test]
fn pc_and_flag_invariants_hold_after_every_step() {
    let mut cpu = Cpu::new();
    let mut bus = test_bus();
    let program = [
        0x3E, 0x9B, // MVI A,0x9B
        0x27, // DAA
        0x3C, // INR A
        0x2F, // CMA
        0x07, // RLC
        0x17, // RAL
    ];
    bus.memory.load_image(cpu.pc, &program);
    for _ in 0..program.len() {
        cpu.step(&mut bus).unwrap();
        pc_invariant_holds(&cpu, &bus);
        flag_shape_holds(&cpu);
    }
}

#[test]
fn mov_r_r_is_identity() {
    let mut cpu = Cpu::new();
    let mut bus = test_bus();
    cpu.a = 0x55;
    cpu.f = 0xC6;
    let before_a = cpu.a;
    let before_f = cpu.f;
    run(&mut cpu, &mut bus, &[0x7F], 1); // MOV A,A
    assert_eq!(cpu.a, before_a);
    assert_eq!(cpu.f, before_f);
}

#[test]
fn push_pop_round_trips_bc_de_hl() {
    let cases: [(u8, u8, fn(&mut Cpu, u16)); 3] = [
        (0xC5, 0xC1, Cpu::set_bc),
        (0xD5, 0xD1, Cpu::set_de),
        (0xE5, 0xE1, Cpu::set_hl),
    ];
    for (push, pop, set) in cases {
        let mut cpu = Cpu::new();
        let mut bus = test_bus();
        cpu.sp = 0x2000;
        set(&mut cpu, 0xBEEF);
        bus.memory.load_image(0, &[push, pop]);
        cpu.step(&mut bus).unwrap();
        set(&mut cpu, 0x0000);
        cpu.step(&mut bus).unwrap();
        let restored = match push {
            0xC5 => cpu.bc(),
            0xD5 => cpu.de(),
            _ => cpu.hl(),
        };
        assert_eq!(restored, 0xBEEF);
        assert_eq!(cpu.sp, 0x2000);
    }
}

#[test]
fn push_pop_psw_round_trips_modulo_fixed_bits() {
    let mut cpu = Cpu::new();
    let mut bus = test_bus();
    cpu.sp = 0x2000;
    cpu.a = 0x42;
    cpu.f = 0xFF; // all bits set, including 3/5 which POP PSW must mask off
    let expected_f = (0xFFu8 | flags::ALWAYS_ONE) & !flags::UNUSED_MASK;
    run(&mut cpu, &mut bus, &[0xF5], 1); // PUSH PSW
    cpu.a = 0;
    cpu.f = 0;
    run(&mut cpu, &mut bus, &[0xF1], 1); // POP PSW
    assert_eq!(cpu.a, 0x42);
    assert_eq!(cpu.f, expected_f);
}

#[test]
fn cma_is_involutive() {
    let mut cpu = Cpu::new();
    let mut bus = test_bus();
    cpu.a = 0x3C;
    let before_f = cpu.f;
    run(&mut cpu, &mut bus, &[0x2F, 0x2F], 2); // CMA; CMA
    assert_eq!(cpu.a, 0x3C);
    assert_eq!(cpu.f, before_f, "CMA must not touch any flag");
}

#[test]
fn rlc_then_rrc_restores_a_and_carry() {
    let mut cpu = Cpu::new();
    let mut bus = test_bus();
    cpu.a = 0x81;
    cpu.set_flag(flags::C, false);
    let before_c = cpu.flag(flags::C);
    run(&mut cpu, &mut bus, &[0x07, 0x0F], 2); // RLC; RRC
    assert_eq!(cpu.a, 0x81);
    assert_eq!(cpu.flag(flags::C), before_c);
}

#[test]
fn ral_then_rar_restores_a() {
    let mut cpu = Cpu::new();
    let mut bus = test_bus();
    cpu.a = 0x81;
    cpu.set_flag(flags::C, true);
    run(&mut cpu, &mut bus, &[0x17, 0x1F], 2); // RAL; RAR
    assert_eq!(cpu.a, 0x81);
}

#[test]
fn dad_sets_carry_on_17_bit_overflow() {
    let mut cpu = Cpu::new();
    let mut bus = test_bus();
    cpu.set_hl(0xFFFF);
    cpu.set_bc(0x0001);
    let before_s = cpu.flag(flags::S);
    run(&mut cpu, &mut bus, &[0x09], 1); // DAD B
    assert_eq!(cpu.hl(), 0x0000);
    assert!(cpu.flag(flags::C));
    assert_eq!(cpu.flag(flags::S), before_s, "DAD must not touch Sign");
}

#[test]
fn scenario_a_inr_a_wraps_to_zero() {
    let mut cpu = Cpu::new();
    let mut bus = test_bus();
    run(&mut cpu, &mut bus, &[0x3E, 0xFF, 0x3C], 2);
    assert_eq!(cpu.a, 0x00);
    assert!(cpu.flag(flags::Z));
    assert!(!cpu.flag(flags::S));
    assert!(cpu.flag(flags::P));
}

#[test]
fn scenario_b_adi_carries_into_high_nibble() {
    let mut cpu = Cpu::new();
    let mut bus = test_bus();
    run(&mut cpu, &mut bus, &[0x3E, 0x0F, 0xC6, 0x01], 2);
    assert_eq!(cpu.a, 0x10);
    assert!(!cpu.flag(flags::Z));
    assert!(!cpu.flag(flags::S));
    assert!(!cpu.flag(flags::P));
    assert!(!cpu.flag(flags::C));
}

#[test]
fn scenario_c_sui_borrows_to_0xff() {
    let mut cpu = Cpu::new();
    let mut bus = test_bus();
    run(&mut cpu, &mut bus, &[0x3E, 0x01, 0xD6, 0x02], 2);
    assert_eq!(cpu.a, 0xFF);
    assert!(!cpu.flag(flags::Z));
    assert!(cpu.flag(flags::S));
    assert!(cpu.flag(flags::P));
    assert!(cpu.flag(flags::C));
}

#[test]
fn scenario_d_daa_adjusts_out_of_range_bcd() {
    let mut cpu = Cpu::new();
    let mut bus = test_bus();
    run(&mut cpu, &mut bus, &[0x3E, 0x9B, 0x27], 2);
    assert_eq!(cpu.a, 0x01);
    assert!(cpu.flag(flags::C));
    assert!(!cpu.flag(flags::Z));
    assert!(!cpu.flag(flags::S));
    assert!(!cpu.flag(flags::P));
}

#[test]
fn scenario_e_push_bc_pop_hl_transfers_value() {
    let mut cpu = Cpu::new();
    let mut bus = test_bus();
    cpu.sp = 0x2000;
    run(&mut cpu, &mut bus, &[0x01, 0x34, 0x12, 0xC5, 0xE1], 3);
    assert_eq!(cpu.h, 0x12);
    assert_eq!(cpu.l, 0x34);
    assert_eq!(cpu.b, 0x12);
    assert_eq!(cpu.c, 0x34);
    assert_eq!(cpu.sp, 0x2000);
}

#[test]
fn scenario_f_eight_rlc_restores_accumulator() {
    let mut cpu = Cpu::new();
    let mut bus = test_bus();
    run(&mut cpu, &mut bus, &[0x3E, 0x0F, 0x07], 2);
    assert_eq!(cpu.a, 0x1E);
    assert!(!cpu.flag(flags::C));
    bus.memory.load_image(cpu.pc, &[0x07]);
    cpu.step(&mut bus).unwrap();
    assert_eq!(cpu.a, 0x3C);
    assert!(!cpu.flag(flags::C));
    for _ in 0..6 {
        bus.memory.load_image(cpu.pc, &[0x07]);
        cpu.step(&mut bus).unwrap();
    }
    assert_eq!(cpu.a, 0x0F);
}

#[test]
fn bank_crossing_fetch_switches_current_bank_mid_instruction() {
    let mut cpu = Cpu::new();
    let mut bus = test_bus();
    cpu.set_pc(&mut bus, 0x3FFF);
    bus.write(0x3FFF, 0xC3); // JMP split across the bank boundary
    bus.write(0x4000, 0x00);
    bus.write(0x4001, 0x40);
    cpu.step(&mut bus).unwrap();
    assert_eq!(cpu.pc, 0x4000);
    pc_invariant_holds(&cpu, &bus);
}

#[test]
fn config_override_changes_sector_offset() {
    let default_cfg = MachineConfig::default();
    let two_drive_cfg = MachineConfig::two_drive();
    assert_eq!(default_cfg.sector_offset(1, 0), 26 * 128);
    assert_eq!(two_drive_cfg.sector_offset(1, 0), 18 * 128);
}
