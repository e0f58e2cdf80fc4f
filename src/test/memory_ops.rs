use super::*;

fn load(size: AccessSize, reg: Register, offset: i16, base: Register) -> InstructionKind {
    InstructionKind::Memory {
        store: false,
        size,
        reg,
        offset: Immediate::new(offset),
        base,
    }
}

fn store(size: AccessSize, reg: Register, offset: i16, base: Register) -> InstructionKind {
    InstructionKind::Memory {
        store: true,
        size,
        reg,
        offset: Immediate::new(offset),
        base,
    }
}

#[test]
fn word_round_trip_through_stack() {
    let outcome = run(program(vec![
        InstructionKind::AluI {
            op: AluOp::LUI,
            dest: Register::AT,
            src: Register::ZERO,
            imm: Immediate::new(0x1234),
        },
        alu_i(AluOp::OR, Register::T0, Register::AT, 0x5678),
        store(AccessSize::WORD, Register::T0, 0, Register::SP),
        load(AccessSize::WORD, Register::T1, 0, Register::SP),
    ]));
    assert_eq!(outcome.register(Register::T1), 0x1234_5678);

    let sp = constants::STACK_BASE;
    assert_eq!(outcome.memory.read_byte(sp), 0x12);
    assert_eq!(outcome.memory.read_byte(sp + 1), 0x34);
    assert_eq!(outcome.memory.read_byte(sp + 2), 0x56);
    assert_eq!(outcome.memory.read_byte(sp + 3), 0x78);
}

#[test]
fn negative_offset() {
    let outcome = run(program(vec![
        li(Register::T0, 23),
        store(AccessSize::WORD, Register::T0, -4, Register::SP),
        load(AccessSize::WORD, Register::T1, -4, Register::SP),
    ]));
    assert_eq!(outcome.register(Register::T1), 23);
    assert_eq!(outcome.memory.read_word(constants::STACK_BASE - 4), 23);
}

#[test]
fn store_truncates_to_access_size() {
    let outcome = run(program(vec![
        li(Register::T0, -1),
        store(AccessSize::BYTE, Register::T0, 0, Register::GP),
    ]));
    assert_eq!(outcome.register(Register::T0), 0xffff_ffff);
    assert_eq!(outcome.memory.read_byte(constants::GLOBAL_BASE), 0xff);
    assert_eq!(outcome.memory.read_byte(constants::GLOBAL_BASE + 1), 0x00);
}

#[test]
fn narrow_loads_zero_extend() {
    let outcome = run(program(vec![
        li(Register::T0, -1),
        store(AccessSize::WORD, Register::T0, 0, Register::GP),
        load(AccessSize::BYTE, Register::T1, 0, Register::GP),
        load(AccessSize::HALF, Register::T2, 0, Register::GP),
    ]));
    assert_eq!(outcome.register(Register::T1), 0x0000_00ff);
    assert_eq!(outcome.register(Register::T2), 0x0000_ffff);
}

#[test]
fn unmapped_loads_read_zero() {
    let outcome = run(program(vec![
        li(Register::T0, 77),
        load(AccessSize::WORD, Register::T0, 0x100, Register::GP),
    ]));
    assert_eq!(outcome.register(Register::T0), 0);
}

#[test]
fn unaligned_word_load_is_rejected() {
    let outcome = run(program(vec![
        li(Register::T1, 99),
        store(AccessSize::WORD, Register::T1, 0, Register::GP),
        load(AccessSize::WORD, Register::T1, 2, Register::GP),
    ]));
    assert_eq!(
        outcome.errors,
        vec![ExecError::UnalignedAccess {
            address: constants::GLOBAL_BASE + 2,
            size: 4,
        }]
    );
    // The destination register keeps its previous value.
    assert_eq!(outcome.register(Register::T1), 99);
}

#[test]
fn unaligned_half_store_is_rejected() {
    let outcome = run(program(vec![
        li(Register::T0, 0x41),
        store(AccessSize::HALF, Register::T0, 1, Register::GP),
    ]));
    assert_eq!(outcome.errors.len(), 1);
    assert_eq!(outcome.memory.read_byte(constants::GLOBAL_BASE + 1), 0);
}

#[test]
fn execution_continues_after_alignment_warning() {
    let outcome = run(program(vec![
        load(AccessSize::WORD, Register::T0, 2, Register::GP),
        li(Register::T1, 5),
    ]));
    assert_eq!(outcome.errors.len(), 1);
    assert_eq!(outcome.register(Register::T1), 5);
}
