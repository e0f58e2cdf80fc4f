//! Standard MIPS32 numeric instruction encoding.
//!
//! Every executable instruction gets a 32-bit encoding written into
//! simulated memory at its location. Instructions without a machine
//! counterpart (and label operands that are still undefined) encode as
//! the [`UNENCODED`](crate::constants::UNENCODED) sentinel.

use crate::instruction::{AccessSize, AluOp, BranchCond, Instruction, InstructionKind, JumpTarget};
use crate::registers::Register;
use crate::{constants, Address, LabelMap, Word};

const FUNCT_SLL: u32 = 0x00;
const FUNCT_SRL: u32 = 0x02;
const FUNCT_SRA: u32 = 0x03;
const FUNCT_SLLV: u32 = 0x04;
const FUNCT_SRLV: u32 = 0x06;
const FUNCT_SRAV: u32 = 0x07;
const FUNCT_JR: u32 = 0x08;
const FUNCT_JALR: u32 = 0x09;
const FUNCT_SYSCALL: u32 = 0x0c;
const FUNCT_MFHI: u32 = 0x10;
const FUNCT_MFLO: u32 = 0x12;
const FUNCT_MULT: u32 = 0x18;
const FUNCT_MULTU: u32 = 0x19;
const FUNCT_DIV: u32 = 0x1a;
const FUNCT_DIVU: u32 = 0x1b;
const FUNCT_ADD: u32 = 0x20;
const FUNCT_ADDU: u32 = 0x21;
const FUNCT_SUB: u32 = 0x22;
const FUNCT_SUBU: u32 = 0x23;
const FUNCT_AND: u32 = 0x24;
const FUNCT_OR: u32 = 0x25;
const FUNCT_XOR: u32 = 0x26;
const FUNCT_NOR: u32 = 0x27;
const FUNCT_SLT: u32 = 0x2a;
const FUNCT_SLTU: u32 = 0x2b;

const OP_REGIMM: u32 = 0x01;
const OP_J: u32 = 0x02;
const OP_JAL: u32 = 0x03;
const OP_BEQ: u32 = 0x04;
const OP_BNE: u32 = 0x05;
const OP_BLEZ: u32 = 0x06;
const OP_BGTZ: u32 = 0x07;
const OP_ADDI: u32 = 0x08;
const OP_ADDIU: u32 = 0x09;
const OP_SLTI: u32 = 0x0a;
const OP_SLTIU: u32 = 0x0b;
const OP_ANDI: u32 = 0x0c;
const OP_ORI: u32 = 0x0d;
const OP_XORI: u32 = 0x0e;
const OP_LUI: u32 = 0x0f;
const OP_LB: u32 = 0x20;
const OP_LH: u32 = 0x21;
const OP_LW: u32 = 0x23;
const OP_SB: u32 = 0x28;
const OP_SH: u32 = 0x29;
const OP_SW: u32 = 0x2b;

// rt selectors of the regimm branch family.
const RT_BLTZ: u32 = 0x00;
const RT_BGEZ: u32 = 0x01;
const RT_BLTZAL: u32 = 0x10;
const RT_BGEZAL: u32 = 0x11;

/// Constructs an R-format word.
#[inline]
pub fn r_type(funct: u32, rs: u32, rt: u32, rd: u32, shamt: u32) -> Word {
    ((rs << constants::RS_OFFSET) & constants::RS_MASK)
        | ((rt << constants::RT_OFFSET) & constants::RT_MASK)
        | ((rd << constants::RD_OFFSET) & constants::RD_MASK)
        | ((shamt << constants::SHAMT_OFFSET) & constants::SHAMT_MASK)
        | ((funct << constants::FUNCT_OFFSET) & constants::FUNCT_MASK)
}

/// Constructs an I-format word.
#[inline]
pub fn i_type(opcode: u32, rs: u32, rt: u32, immediate: u16) -> Word {
    ((opcode << constants::OPCODE_OFFSET) & constants::OPCODE_MASK)
        | ((rs << constants::RS_OFFSET) & constants::RS_MASK)
        | ((rt << constants::RT_OFFSET) & constants::RT_MASK)
        | ((u32::from(immediate) << constants::IMMEDIATE_OFFSET) & constants::IMMEDIATE_MASK)
}

/// Constructs a J-format word from a byte address.
#[inline]
pub fn j_type(opcode: u32, target: Address) -> Word {
    ((opcode << constants::OPCODE_OFFSET) & constants::OPCODE_MASK)
        | (((target >> 2) << constants::TARGET_OFFSET) & constants::TARGET_MASK)
}

fn gpr(register: Register) -> Option<u32> {
    if register.is_gpr() {
        Some(register.index() as u32)
    } else {
        None
    }
}

/// Encodes an instruction, falling back to the sentinel when no
/// machine encoding exists or a label operand is not yet defined.
pub fn encode(instr: &Instruction, labels: &LabelMap) -> Word {
    try_encode(instr, labels).unwrap_or(constants::UNENCODED)
}

fn try_encode(instr: &Instruction, labels: &LabelMap) -> Option<Word> {
    match instr.kind() {
        InstructionKind::AluR {
            op,
            dest,
            src1,
            src2,
        } => {
            // The hi/lo moves have their own machine encodings.
            if let (AluOp::ADD, Some(d), Register::ZERO) = (*op, dest, src2) {
                match src1 {
                    Register::HI => return Some(r_type(FUNCT_MFHI, 0, 0, gpr(*d)?, 0)),
                    Register::LO => return Some(r_type(FUNCT_MFLO, 0, 0, gpr(*d)?, 0)),
                    _ => {}
                }
            }

            let rs = gpr(*src1)?;
            let rt = gpr(*src2)?;
            match op {
                // Variable shifts take the amount in rs.
                AluOp::SLL => Some(r_type(FUNCT_SLLV, rt, rs, gpr((*dest)?)?, 0)),
                AluOp::SRL => Some(r_type(FUNCT_SRLV, rt, rs, gpr((*dest)?)?, 0)),
                AluOp::SRA => Some(r_type(FUNCT_SRAV, rt, rs, gpr((*dest)?)?, 0)),
                AluOp::MULT => Some(r_type(FUNCT_MULT, rs, rt, 0, 0)),
                AluOp::MULTU => Some(r_type(FUNCT_MULTU, rs, rt, 0, 0)),
                AluOp::DIV => Some(r_type(FUNCT_DIV, rs, rt, 0, 0)),
                AluOp::DIVU => Some(r_type(FUNCT_DIVU, rs, rt, 0, 0)),
                _ => {
                    let funct = match op {
                        AluOp::ADD => FUNCT_ADD,
                        AluOp::ADDU => FUNCT_ADDU,
                        AluOp::SUB => FUNCT_SUB,
                        AluOp::SUBU => FUNCT_SUBU,
                        AluOp::AND => FUNCT_AND,
                        AluOp::OR => FUNCT_OR,
                        AluOp::XOR => FUNCT_XOR,
                        AluOp::NOR => FUNCT_NOR,
                        AluOp::SLT => FUNCT_SLT,
                        AluOp::SLTU => FUNCT_SLTU,
                        _ => return None,
                    };
                    Some(r_type(funct, rs, rt, gpr((*dest)?)?, 0))
                }
            }
        }
        InstructionKind::AluI { op, dest, src, imm } => {
            let rt = gpr(*dest)?;
            let rs = gpr(*src)?;
            match op {
                // Immediate shifts are R-format with the amount in shamt.
                AluOp::SLL => Some(r_type(FUNCT_SLL, 0, rs, rt, imm.unsigned())),
                AluOp::SRL => Some(r_type(FUNCT_SRL, 0, rs, rt, imm.unsigned())),
                AluOp::SRA => Some(r_type(FUNCT_SRA, 0, rs, rt, imm.unsigned())),
                AluOp::LUI => Some(i_type(OP_LUI, 0, rt, imm.unsigned() as u16)),
                _ => {
                    let opcode = match op {
                        AluOp::ADD => OP_ADDI,
                        AluOp::ADDU => OP_ADDIU,
                        AluOp::AND => OP_ANDI,
                        AluOp::OR => OP_ORI,
                        AluOp::XOR => OP_XORI,
                        AluOp::SLT => OP_SLTI,
                        AluOp::SLTU => OP_SLTIU,
                        _ => return None,
                    };
                    Some(i_type(opcode, rs, rt, imm.unsigned() as u16))
                }
            }
        }
        InstructionKind::Memory {
            store,
            size,
            reg,
            offset,
            base,
        } => {
            let opcode = match (store, size) {
                (false, AccessSize::BYTE) => OP_LB,
                (false, AccessSize::HALF) => OP_LH,
                (false, AccessSize::WORD) => OP_LW,
                (true, AccessSize::BYTE) => OP_SB,
                (true, AccessSize::HALF) => OP_SH,
                (true, AccessSize::WORD) => OP_SW,
            };
            Some(i_type(
                opcode,
                gpr(*base)?,
                gpr(*reg)?,
                offset.unsigned() as u16,
            ))
        }
        InstructionKind::Jump { link, target } => match target {
            JumpTarget::Label(label) => {
                let address = *labels.get(label)?;
                Some(j_type(if *link { OP_JAL } else { OP_J }, address))
            }
            JumpTarget::Register(register) => {
                let rs = gpr(*register)?;
                if *link {
                    Some(r_type(FUNCT_JALR, rs, 0, Register::RA.index() as u32, 0))
                } else {
                    Some(r_type(FUNCT_JR, rs, 0, 0, 0))
                }
            }
        },
        InstructionKind::Branch {
            cond,
            link,
            src1,
            src2,
            label,
        } => {
            let target = *labels.get(label)?;
            let displacement = target.wrapping_sub(instr.location().wrapping_add(4));
            let displacement = ((displacement as i32) >> 2) as u16;
            let rs = gpr(*src1)?;
            match (cond, link) {
                (BranchCond::EQ, false) => {
                    Some(i_type(OP_BEQ, rs, gpr(*src2)?, displacement))
                }
                (BranchCond::NE, false) => {
                    Some(i_type(OP_BNE, rs, gpr(*src2)?, displacement))
                }
                (BranchCond::GE, false) => Some(i_type(OP_REGIMM, rs, RT_BGEZ, displacement)),
                (BranchCond::GE, true) => Some(i_type(OP_REGIMM, rs, RT_BGEZAL, displacement)),
                (BranchCond::LT, false) => Some(i_type(OP_REGIMM, rs, RT_BLTZ, displacement)),
                (BranchCond::LT, true) => Some(i_type(OP_REGIMM, rs, RT_BLTZAL, displacement)),
                (BranchCond::GT, false) => Some(i_type(OP_BGTZ, rs, 0, displacement)),
                (BranchCond::LE, false) => Some(i_type(OP_BLEZ, rs, 0, displacement)),
                _ => None,
            }
        }
        InstructionKind::Syscall => Some(r_type(FUNCT_SYSCALL, 0, 0, 0, 0)),
        InstructionKind::Directive(_) | InstructionKind::NonExecutable => None,
    }
}
