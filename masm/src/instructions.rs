//! Mnemonic dispatch: validates operands, constructs instruction
//! kinds, and expands pseudo-instructions into sequences of simples.

use crate::error::Error;
use crate::int_util::{parse_constant, parse_imm16, parse_shift, Constant};
use crate::{Result, Rule};
use matches::debug_assert_matches;
use mips::{
    constants, AccessSize, Address, AluOp, BranchCond, Immediate, Instruction, InstructionKind,
    JumpTarget, Register,
};
use pest::iterators::Pair;
use util::EnumFromStr;
use util_derive::EnumFromStr;

/// Every recognized mnemonic. Parsed after ASCII-uppercasing the
/// source token, so the variants spell the mnemonics themselves.
#[derive(Clone, Copy, PartialEq, Eq, Debug, EnumFromStr)]
enum Mnemonic {
    ADD,
    ADDU,
    SUB,
    SUBU,
    AND,
    OR,
    XOR,
    NOR,
    SLT,
    SLTU,
    SLLV,
    SRLV,
    SRAV,
    ADDI,
    ADDIU,
    ANDI,
    ORI,
    XORI,
    SLTI,
    SLTIU,
    SLL,
    SRL,
    SRA,
    LUI,
    LW,
    LH,
    LB,
    SW,
    SH,
    SB,
    J,
    JAL,
    JR,
    JALR,
    BEQ,
    BNE,
    BGEZ,
    BGEZAL,
    BLTZ,
    BLTZAL,
    BGTZ,
    BLEZ,
    SYSCALL,
    LI,
    MOVE,
    MFHI,
    MFLO,
    MULT,
    MULTU,
    MUL,
    DIV,
    DIVU,
    REM,
}

enum Operand<'i> {
    Register(Register),
    Int(&'i str),
    Name(&'i str),
}

fn operand(pair: Pair<Rule>) -> Result<Operand> {
    let inner = pair.into_inner().next().unwrap();
    match inner.as_rule() {
        Rule::register => Ok(Operand::Register(inner.as_str().parse()?)),
        Rule::int => Ok(Operand::Int(inner.as_str())),
        Rule::name => Ok(Operand::Name(inner.as_str())),
        _ => unreachable!(),
    }
}

/// Builds the instruction sequence for one parsed statement.
///
/// Simple mnemonics produce a single instruction carrying the
/// statement's source text. Pseudo-instructions produce their
/// expansion: every emitted simple occupies one word, at consecutive
/// locations, and renders its own canonical text.
pub fn build(pair: Pair<Rule>, location: Address) -> Result<Vec<Instruction>> {
    debug_assert_matches!(pair.as_rule(), Rule::instruction);

    let source = pair.as_str().to_string();
    let mut pairs = pair.into_inner();
    let mnemonic_pair = pairs.next().unwrap();
    let raw = mnemonic_pair.as_str();
    let mnemonic: Mnemonic = raw
        .to_uppercase()
        .parse()
        .map_err(|_| Error::UnknownMnemonic(raw.to_string()))?;
    let operands = pairs.map(operand).collect::<Result<Vec<_>>>()?;

    let wrong = || Error::WrongOperands(raw.to_string());
    let kinds = expand(mnemonic, &operands).ok_or_else(wrong)??;

    let count = kinds.len();
    let mut built = Vec::with_capacity(count);
    for (index, kind) in kinds.into_iter().enumerate() {
        let simple_location = location + (index as u32) * constants::WORD_BYTES;
        let text = if count == 1 {
            source.clone()
        } else {
            kind.render()
        };
        built.push(Instruction::new(
            kind,
            text,
            simple_location,
            constants::WORD_BYTES,
        ));
    }
    Ok(built)
}

/// Maps a mnemonic and its operands to the kinds it expands to.
/// `None` means the operand shapes did not match the mnemonic's
/// arity; inner errors are range or register failures.
fn expand(mnemonic: Mnemonic, operands: &[Operand]) -> Option<Result<Vec<InstructionKind>>> {
    use Operand::{Int, Name, Register as Reg};

    let kinds = match (mnemonic, operands) {
        // Three-register ALU operations.
        (
            Mnemonic::ADD
            | Mnemonic::ADDU
            | Mnemonic::SUB
            | Mnemonic::SUBU
            | Mnemonic::AND
            | Mnemonic::OR
            | Mnemonic::XOR
            | Mnemonic::NOR
            | Mnemonic::SLT
            | Mnemonic::SLTU
            | Mnemonic::SLLV
            | Mnemonic::SRLV
            | Mnemonic::SRAV,
            [Reg(dest), Reg(src1), Reg(src2)],
        ) => {
            let op = match mnemonic {
                Mnemonic::ADD => AluOp::ADD,
                Mnemonic::ADDU => AluOp::ADDU,
                Mnemonic::SUB => AluOp::SUB,
                Mnemonic::SUBU => AluOp::SUBU,
                Mnemonic::AND => AluOp::AND,
                Mnemonic::OR => AluOp::OR,
                Mnemonic::XOR => AluOp::XOR,
                Mnemonic::NOR => AluOp::NOR,
                Mnemonic::SLT => AluOp::SLT,
                Mnemonic::SLTU => AluOp::SLTU,
                Mnemonic::SLLV => AluOp::SLL,
                Mnemonic::SRLV => AluOp::SRL,
                _ => AluOp::SRA,
            };
            vec![alu_r(op, *dest, *src1, *src2)]
        }

        // Register-immediate ALU operations.
        (
            Mnemonic::ADDI
            | Mnemonic::ADDIU
            | Mnemonic::ANDI
            | Mnemonic::ORI
            | Mnemonic::XORI
            | Mnemonic::SLTI
            | Mnemonic::SLTIU,
            [Reg(dest), Reg(src), Int(text)],
        ) => {
            let op = match mnemonic {
                Mnemonic::ADDI => AluOp::ADD,
                Mnemonic::ADDIU => AluOp::ADDU,
                Mnemonic::ANDI => AluOp::AND,
                Mnemonic::ORI => AluOp::OR,
                Mnemonic::XORI => AluOp::XOR,
                Mnemonic::SLTI => AluOp::SLT,
                _ => AluOp::SLTU,
            };
            let imm = match parse_imm16(text) {
                Ok(imm) => imm,
                Err(err) => return Some(Err(err)),
            };
            vec![alu_i(op, *dest, *src, imm)]
        }

        // Constant shifts; the amount must be 0..=31.
        (Mnemonic::SLL | Mnemonic::SRL | Mnemonic::SRA, [Reg(dest), Reg(src), Int(text)]) => {
            let op = match mnemonic {
                Mnemonic::SLL => AluOp::SLL,
                Mnemonic::SRL => AluOp::SRL,
                _ => AluOp::SRA,
            };
            let amount = match parse_shift(text) {
                Ok(amount) => amount,
                Err(err) => return Some(Err(err)),
            };
            vec![alu_i(op, *dest, *src, amount)]
        }

        (Mnemonic::LUI, [Reg(dest), Int(text)]) => {
            let imm = match parse_imm16(text) {
                Ok(imm) => imm,
                Err(err) => return Some(Err(err)),
            };
            vec![alu_i(AluOp::LUI, *dest, Register::ZERO, imm)]
        }

        // Loads and stores: reg, offset(base).
        (
            Mnemonic::LW
            | Mnemonic::LH
            | Mnemonic::LB
            | Mnemonic::SW
            | Mnemonic::SH
            | Mnemonic::SB,
            [Reg(reg), Int(text), Reg(base)],
        ) => {
            let (store, size) = match mnemonic {
                Mnemonic::LW => (false, AccessSize::WORD),
                Mnemonic::LH => (false, AccessSize::HALF),
                Mnemonic::LB => (false, AccessSize::BYTE),
                Mnemonic::SW => (true, AccessSize::WORD),
                Mnemonic::SH => (true, AccessSize::HALF),
                _ => (true, AccessSize::BYTE),
            };
            let offset = match parse_imm16(text) {
                Ok(offset) => offset,
                Err(err) => return Some(Err(err)),
            };
            vec![InstructionKind::Memory {
                store,
                size,
                reg: *reg,
                offset: Immediate::new(offset),
                base: *base,
            }]
        }

        (Mnemonic::J | Mnemonic::JAL, [Name(label)]) => vec![InstructionKind::Jump {
            link: mnemonic == Mnemonic::JAL,
            target: JumpTarget::Label(label.to_string()),
        }],

        (Mnemonic::JR | Mnemonic::JALR, [Reg(register)]) => vec![InstructionKind::Jump {
            link: mnemonic == Mnemonic::JALR,
            target: JumpTarget::Register(*register),
        }],

        (Mnemonic::BEQ | Mnemonic::BNE, [Reg(src1), Reg(src2), Name(label)]) => {
            let cond = if mnemonic == Mnemonic::BEQ {
                BranchCond::EQ
            } else {
                BranchCond::NE
            };
            vec![InstructionKind::Branch {
                cond,
                link: false,
                src1: *src1,
                src2: *src2,
                label: label.to_string(),
            }]
        }

        // Single-source branches compare against $zero.
        (
            Mnemonic::BGEZ
            | Mnemonic::BGEZAL
            | Mnemonic::BLTZ
            | Mnemonic::BLTZAL
            | Mnemonic::BGTZ
            | Mnemonic::BLEZ,
            [Reg(src), Name(label)],
        ) => {
            let (cond, link) = match mnemonic {
                Mnemonic::BGEZ => (BranchCond::GE, false),
                Mnemonic::BGEZAL => (BranchCond::GE, true),
                Mnemonic::BLTZ => (BranchCond::LT, false),
                Mnemonic::BLTZAL => (BranchCond::LT, true),
                Mnemonic::BGTZ => (BranchCond::GT, false),
                _ => (BranchCond::LE, false),
            };
            vec![InstructionKind::Branch {
                cond,
                link,
                src1: *src,
                src2: Register::ZERO,
                label: label.to_string(),
            }]
        }

        (Mnemonic::SYSCALL, []) => vec![InstructionKind::Syscall],

        // li: one simple for 16-bit constants, a lui/or pair otherwise.
        (Mnemonic::LI, [Reg(dest), Int(text)]) => match parse_constant(text) {
            Ok(Constant::Narrow(value)) => {
                vec![alu_i(AluOp::ADD, *dest, Register::ZERO, value)]
            }
            Ok(Constant::Wide { high, low }) => vec![
                alu_i(AluOp::LUI, Register::AT, Register::ZERO, high),
                alu_i(AluOp::OR, *dest, Register::AT, low),
            ],
            Err(err) => return Some(Err(err)),
        },

        (Mnemonic::MOVE, [Reg(dest), Reg(src)]) => {
            vec![alu_r(AluOp::ADD, *dest, *src, Register::ZERO)]
        }

        (Mnemonic::MFHI, [Reg(dest)]) => {
            vec![alu_r(AluOp::ADD, *dest, Register::HI, Register::ZERO)]
        }
        (Mnemonic::MFLO, [Reg(dest)]) => {
            vec![alu_r(AluOp::ADD, *dest, Register::LO, Register::ZERO)]
        }

        (Mnemonic::MULT | Mnemonic::MULTU, [Reg(src1), Reg(src2)]) => {
            let op = if mnemonic == Mnemonic::MULT {
                AluOp::MULT
            } else {
                AluOp::MULTU
            };
            vec![alu_wide(op, *src1, *src2)]
        }

        (Mnemonic::MUL, [Reg(dest), Reg(src1), Reg(src2)]) => vec![
            alu_wide(AluOp::MULT, *src1, *src2),
            move_from(Register::LO, *dest),
        ],
        (Mnemonic::MUL, [Reg(dest), Reg(src), Int(text)]) => {
            let imm = match parse_imm16(text) {
                Ok(imm) => imm,
                Err(err) => return Some(Err(err)),
            };
            vec![
                alu_i(AluOp::ADD, Register::AT, Register::ZERO, imm),
                alu_wide(AluOp::MULT, *src, Register::AT),
                move_from(Register::LO, *dest),
            ]
        }

        // Two-register div is the raw machine instruction.
        (Mnemonic::DIV | Mnemonic::DIVU, [Reg(src1), Reg(src2)]) => {
            let op = if mnemonic == Mnemonic::DIV {
                AluOp::DIV
            } else {
                AluOp::DIVU
            };
            vec![alu_wide(op, *src1, *src2)]
        }

        // Three-operand div and rem are pseudos over it.
        (Mnemonic::DIV | Mnemonic::REM, [Reg(dest), Reg(src1), Reg(src2)]) => {
            let half = if mnemonic == Mnemonic::DIV {
                Register::LO
            } else {
                Register::HI
            };
            vec![alu_wide(AluOp::DIV, *src1, *src2), move_from(half, *dest)]
        }
        (Mnemonic::DIV | Mnemonic::REM, [Reg(dest), Reg(src), Int(text)]) => {
            let half = if mnemonic == Mnemonic::DIV {
                Register::LO
            } else {
                Register::HI
            };
            let imm = match parse_imm16(text) {
                Ok(imm) => imm,
                Err(err) => return Some(Err(err)),
            };
            vec![
                alu_i(AluOp::ADD, Register::AT, Register::ZERO, imm),
                alu_wide(AluOp::DIV, *src, Register::AT),
                move_from(half, *dest),
            ]
        }

        _ => return None,
    };

    Some(Ok(kinds))
}

fn alu_r(op: AluOp, dest: Register, src1: Register, src2: Register) -> InstructionKind {
    InstructionKind::AluR {
        op,
        dest: Some(dest),
        src1,
        src2,
    }
}

fn alu_wide(op: AluOp, src1: Register, src2: Register) -> InstructionKind {
    InstructionKind::AluR {
        op,
        dest: None,
        src1,
        src2,
    }
}

fn alu_i(op: AluOp, dest: Register, src: Register, imm: i16) -> InstructionKind {
    InstructionKind::AluI {
        op,
        dest,
        src,
        imm: Immediate::new(imm),
    }
}

fn move_from(half: Register, dest: Register) -> InstructionKind {
    alu_r(AluOp::ADD, dest, half, Register::ZERO)
}
