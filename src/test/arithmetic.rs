use super::*;

#[test]
fn add_two_immediates() {
    let outcome = run(program(vec![
        li(Register::T0, 5),
        li(Register::T1, 7),
        alu_r(AluOp::ADD, Register::T2, Register::T0, Register::T1),
    ]));
    assert_eq!(outcome.register(Register::T2), 12);
}

#[test]
fn addi_wraps_at_minimum() {
    let outcome = run(program(vec![
        InstructionKind::AluI {
            op: AluOp::LUI,
            dest: Register::T0,
            src: Register::ZERO,
            imm: Immediate::new(-0x8000),
        },
        alu_i(AluOp::ADD, Register::T0, Register::T0, -1),
    ]));
    assert_eq!(outcome.register(Register::T0), i32::max_value() as Word);
}

#[test]
fn addu_wraps_unsigned() {
    let outcome = run(program(vec![
        li(Register::T0, -1),
        alu_i(AluOp::ADDU, Register::T1, Register::T0, 1),
    ]));
    assert_eq!(outcome.register(Register::T1), 0);
}

#[test]
fn sub_and_subu() {
    let outcome = run(program(vec![
        li(Register::T0, 3),
        li(Register::T1, 5),
        alu_r(AluOp::SUB, Register::T2, Register::T0, Register::T1),
        alu_r(AluOp::SUBU, Register::T3, Register::T1, Register::T0),
    ]));
    assert_eq!(outcome.register(Register::T2) as i32, -2);
    assert_eq!(outcome.register(Register::T3), 2);
}

#[test]
fn signed_and_unsigned_comparison() {
    let outcome = run(program(vec![
        li(Register::A0, -1),
        li(Register::A1, 1),
        alu_r(AluOp::SLT, Register::T0, Register::A0, Register::A1),
        alu_r(AluOp::SLTU, Register::T1, Register::A0, Register::A1),
    ]));
    // Signed: -1 < 1. Unsigned: 0xffff_ffff is the largest word.
    assert_eq!(outcome.register(Register::T0), 1);
    assert_eq!(outcome.register(Register::T1), 0);
}

#[test]
fn logical_immediates_zero_extend() {
    let outcome = run(program(vec![
        alu_i(AluOp::OR, Register::T0, Register::ZERO, -1),
        alu_i(AluOp::AND, Register::T1, Register::T0, -1),
        alu_i(AluOp::XOR, Register::T2, Register::ZERO, -0x8000),
    ]));
    assert_eq!(outcome.register(Register::T0), 0x0000_ffff);
    assert_eq!(outcome.register(Register::T1), 0x0000_ffff);
    assert_eq!(outcome.register(Register::T2), 0x0000_8000);
}

#[test]
fn arithmetic_immediates_sign_extend() {
    let outcome = run(program(vec![
        li(Register::T0, 0),
        alu_i(AluOp::ADD, Register::T1, Register::T0, -4),
        InstructionKind::AluI {
            op: AluOp::SLT,
            dest: Register::T2,
            src: Register::T0,
            imm: Immediate::new(-4),
        },
    ]));
    assert_eq!(outcome.register(Register::T1) as i32, -4);
    // 0 < -4 is false in the signed comparison.
    assert_eq!(outcome.register(Register::T2), 0);
}

#[test]
fn nor_inverts() {
    let outcome = run(program(vec![
        li(Register::T0, 0),
        alu_r(AluOp::NOR, Register::T1, Register::T0, Register::ZERO),
    ]));
    assert_eq!(outcome.register(Register::T1), 0xffff_ffff);
}

#[test]
fn lui_builds_upper_half() {
    let outcome = run(program(vec![
        InstructionKind::AluI {
            op: AluOp::LUI,
            dest: Register::T0,
            src: Register::ZERO,
            imm: Immediate::new(0x1234),
        },
        alu_i(AluOp::OR, Register::T0, Register::T0, 0x5678),
    ]));
    assert_eq!(outcome.register(Register::T0), 0x1234_5678);
}

#[test]
fn wide_constant_with_low_bit_15_set() {
    let outcome = run(program(vec![
        InstructionKind::AluI {
            op: AluOp::LUI,
            dest: Register::AT,
            src: Register::ZERO,
            imm: Immediate::new(0x1234),
        },
        alu_i(AluOp::OR, Register::T0, Register::AT, -0x7987), // 0x8679
    ]));
    assert_eq!(outcome.register(Register::T0), 0x1234_8679);
}

#[test]
fn writes_to_zero_are_discarded() {
    let outcome = run(program(vec![
        li(Register::ZERO, 77),
        alu_r(AluOp::ADD, Register::T0, Register::ZERO, Register::ZERO),
    ]));
    assert_eq!(outcome.register(Register::ZERO), 0);
    assert_eq!(outcome.register(Register::T0), 0);
}
