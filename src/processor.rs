use crate::instruction::{AluOp, Instruction, InstructionKind, JumpTarget};
use crate::memory::Memory;
use crate::registers::{Register, RegisterFile};
use crate::syscall::{self, SysIo};
use crate::{constants, Address, LabelMap, Word};
use std::error::Error as StdError;
use std::fmt;

/// Outcome of executing one instruction.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Exec {
    /// Control falls through to the instruction after this one.
    Next,
    /// A jump or taken branch moved the program counter.
    Jump(Address),
    /// An exit syscall ended the program with the given code.
    Exit(i32),
}

/// Errors and warnings raised while executing a single instruction.
///
/// Only an undefined label stops a run; the others leave the failed
/// effect out and let execution continue with the next instruction.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum ExecError {
    UndefinedLabel(String),
    UnalignedAccess { address: Address, size: u32 },
    DivisionByZero,
    UnknownSyscall(Word),
}

impl ExecError {
    /// Whether stepping must stop at the offending instruction.
    pub fn halts_execution(&self) -> bool {
        matches!(self, ExecError::UndefinedLabel(_))
    }
}

impl fmt::Display for ExecError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ExecError::UndefinedLabel(name) => write!(f, "undefined label {}", name),
            ExecError::UnalignedAccess { address, size } => write!(
                f,
                "unaligned memory address {:#010x} for {}-byte access",
                address, size
            ),
            ExecError::DivisionByZero => f.write_str("division by zero, hi and lo unchanged"),
            ExecError::UnknownSyscall(code) => {
                write!(f, "unknown or unimplemented syscall {}", code)
            }
        }
    }
}

impl StdError for ExecError {}

/// The execution engine: owns the register file and steps one
/// already-assembled instruction at a time against external memory.
#[derive(Default)]
pub struct Processor {
    registers: RegisterFile,
}

impl Processor {
    pub fn new() -> Processor {
        Default::default()
    }

    pub fn registers(&self) -> &RegisterFile {
        &self.registers
    }

    pub fn registers_mut(&mut self) -> &mut RegisterFile {
        &mut self.registers
    }

    /// Executes one instruction.
    ///
    /// Afterwards `pc` holds the address of the next instruction to
    /// run: `location + pc_increment` for straight-line flow (and for
    /// non-halting warnings, whose effect is skipped), the target for
    /// a jump or taken branch, and the instruction's own location
    /// when a referenced label turns out to be undefined. Labels are
    /// resolved through `labels` at this point, never earlier.
    pub fn execute(
        &mut self,
        memory: &mut Memory,
        io: &mut dyn SysIo,
        instr: &Instruction,
        labels: &LabelMap,
    ) -> Result<Exec, ExecError> {
        let next = instr.location().wrapping_add(instr.pc_increment());
        let result = self.dispatch(memory, io, instr, labels, next);

        match &result {
            Err(err) if err.halts_execution() => self.registers.set_pc(instr.location()),
            // Jumps set pc to their target in dispatch.
            Ok(Exec::Jump(_)) => {}
            _ => self.registers.set_pc(next),
        }
        result
    }

    fn dispatch(
        &mut self,
        memory: &mut Memory,
        io: &mut dyn SysIo,
        instr: &Instruction,
        labels: &LabelMap,
        next: Address,
    ) -> Result<Exec, ExecError> {
        match instr.kind() {
            InstructionKind::AluR {
                op,
                dest,
                src1,
                src2,
            } => {
                let lhs = self.registers.get(*src1);
                let rhs = self.registers.get(*src2);
                if op.is_wide() {
                    let (hi, lo) = alu_64(*op, lhs, rhs).ok_or(ExecError::DivisionByZero)?;
                    self.registers.set(Register::HI, hi);
                    self.registers.set(Register::LO, lo);
                    if let Some(dest) = dest {
                        self.registers.set(*dest, lo);
                    }
                } else {
                    match dest {
                        Some(dest) => {
                            let value = alu_32(*op, lhs, rhs);
                            self.registers.set(*dest, value);
                        }
                        None => unreachable!("32-bit operation without a destination"),
                    }
                }
                Ok(Exec::Next)
            }
            InstructionKind::AluI { op, dest, src, imm } => {
                let lhs = self.registers.get(*src);
                let rhs = if op.zero_extends_immediate() {
                    imm.unsigned()
                } else {
                    imm.signed() as Word
                };
                let value = alu_32(*op, lhs, rhs);
                self.registers.set(*dest, value);
                Ok(Exec::Next)
            }
            InstructionKind::Memory {
                store,
                size,
                reg,
                offset,
                base,
            } => {
                let address = self
                    .registers
                    .get(*base)
                    .wrapping_add(offset.signed() as Word);
                let size = size.bytes();
                if address % size != 0 {
                    return Err(ExecError::UnalignedAccess { address, size });
                }
                if *store {
                    memory.write(address, size, self.registers.get(*reg));
                } else {
                    // Loads zero-extend regardless of width.
                    let value = memory.read(address, size);
                    self.registers.set(*reg, value);
                }
                Ok(Exec::Next)
            }
            InstructionKind::Jump { link, target } => {
                let address = match target {
                    JumpTarget::Register(register) => self.registers.get(*register),
                    JumpTarget::Label(label) => resolve(labels, label)?,
                };
                if *link {
                    self.registers.set(Register::RA, next);
                }
                self.registers.set_pc(address);
                Ok(Exec::Jump(address))
            }
            InstructionKind::Branch {
                cond,
                link,
                src1,
                src2,
                label,
            } => {
                let address = resolve(labels, label)?;
                let lhs = self.registers.get(*src1) as i32;
                let rhs = self.registers.get(*src2) as i32;
                if cond.holds(lhs, rhs) {
                    if *link {
                        self.registers.set(Register::RA, next);
                    }
                    self.registers.set_pc(address);
                    Ok(Exec::Jump(address))
                } else {
                    Ok(Exec::Next)
                }
            }
            InstructionKind::Syscall => syscall::dispatch(&mut self.registers, memory, io),
            InstructionKind::Directive(_) => {
                unreachable!("directives execute during assembly, not on the processor")
            }
            InstructionKind::NonExecutable => Ok(Exec::Next),
        }
    }
}

fn resolve(labels: &LabelMap, label: &str) -> Result<Address, ExecError> {
    labels
        .get(label)
        .copied()
        .ok_or_else(|| ExecError::UndefinedLabel(label.to_string()))
}

fn alu_32(op: AluOp, lhs: Word, rhs: Word) -> Word {
    match op {
        AluOp::ADD | AluOp::ADDU => lhs.wrapping_add(rhs),
        AluOp::SUB | AluOp::SUBU => lhs.wrapping_sub(rhs),
        AluOp::AND => lhs & rhs,
        AluOp::OR => lhs | rhs,
        AluOp::XOR => lhs ^ rhs,
        AluOp::NOR => !(lhs | rhs),
        AluOp::SLT => ((lhs as i32) < (rhs as i32)) as Word,
        AluOp::SLTU => (lhs < rhs) as Word,
        AluOp::SLL => lhs << (rhs & constants::SHIFT_MASK),
        AluOp::SRL => lhs >> (rhs & constants::SHIFT_MASK),
        AluOp::SRA => ((lhs as i32) >> (rhs & constants::SHIFT_MASK)) as Word,
        AluOp::LUI => rhs << constants::HALF_WIDTH,
        AluOp::MULT | AluOp::MULTU | AluOp::DIV | AluOp::DIVU => {
            unreachable!("64-bit operation dispatched as 32-bit")
        }
    }
}

/// Returns `(hi, lo)`, or `None` for a division by zero.
fn alu_64(op: AluOp, lhs: Word, rhs: Word) -> Option<(Word, Word)> {
    match op {
        AluOp::MULT => {
            let product = i64::from(lhs as i32).wrapping_mul(i64::from(rhs as i32));
            Some(((product >> constants::WORD_WIDTH) as Word, product as Word))
        }
        AluOp::MULTU => {
            let product = u64::from(lhs).wrapping_mul(u64::from(rhs));
            Some(((product >> constants::WORD_WIDTH) as Word, product as Word))
        }
        AluOp::DIV => {
            if rhs == 0 {
                return None;
            }
            let (lhs, rhs) = (lhs as i32, rhs as i32);
            Some((lhs.wrapping_rem(rhs) as Word, lhs.wrapping_div(rhs) as Word))
        }
        AluOp::DIVU => {
            if rhs == 0 {
                return None;
            }
            Some((lhs % rhs, lhs / rhs))
        }
        _ => unreachable!("32-bit operation dispatched as 64-bit"),
    }
}
