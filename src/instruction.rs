use crate::registers::Register;
use crate::{constants, Address, Word};
use std::fmt;

/// A 16-bit immediate operand.
///
/// Offers the three projections instructions need: the raw 16-bit
/// value, the sign-extended word used by arithmetic, and the
/// zero-extended word used by logical operations and encoding.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Immediate(i16);

impl Immediate {
    pub fn new(value: i16) -> Immediate {
        Immediate(value)
    }

    #[inline]
    pub fn value(self) -> i16 {
        self.0
    }

    #[inline]
    pub fn signed(self) -> i32 {
        i32::from(self.0)
    }

    #[inline]
    pub fn unsigned(self) -> Word {
        u32::from(self.0 as u16)
    }
}

impl fmt::Display for Immediate {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Operation tags for the ALU instruction forms.
///
/// The first group maps two words to one word; the `MULT`/`DIV` group
/// produces a 64-bit result split across `hi` and `lo`.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum AluOp {
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
    SLL,
    SRL,
    SRA,
    LUI,
    MULT,
    MULTU,
    DIV,
    DIVU,
}

impl AluOp {
    /// Whether the operation produces a 64-bit `(hi, lo)` result.
    pub fn is_wide(self) -> bool {
        matches!(self, AluOp::MULT | AluOp::MULTU | AluOp::DIV | AluOp::DIVU)
    }

    /// Logical immediates are zero-extended; everything else
    /// sign-extends. Keeping `or` zero-extending is what lets a
    /// `lui`/`or` pair reassemble any 32-bit constant.
    pub fn zero_extends_immediate(self) -> bool {
        matches!(self, AluOp::AND | AluOp::OR | AluOp::XOR | AluOp::NOR)
    }
}

/// Memory transfer width.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum AccessSize {
    BYTE,
    HALF,
    WORD,
}

impl AccessSize {
    #[inline]
    pub fn bytes(self) -> u32 {
        match self {
            AccessSize::BYTE => constants::BYTE_BYTES,
            AccessSize::HALF => constants::HALF_BYTES,
            AccessSize::WORD => constants::WORD_BYTES,
        }
    }
}

/// Branch predicates, evaluated as signed comparisons of two register
/// values. Single-source branches compare against `$zero`.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum BranchCond {
    EQ,
    NE,
    LT,
    LE,
    GT,
    GE,
}

impl BranchCond {
    pub fn holds(self, lhs: i32, rhs: i32) -> bool {
        match self {
            BranchCond::EQ => lhs == rhs,
            BranchCond::NE => lhs != rhs,
            BranchCond::LT => lhs < rhs,
            BranchCond::LE => lhs <= rhs,
            BranchCond::GT => lhs > rhs,
            BranchCond::GE => lhs >= rhs,
        }
    }
}

/// Where a jump goes: a register's current value or a named label
/// resolved when the jump executes.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum JumpTarget {
    Register(Register),
    Label(String),
}

/// Assembler directives, validated and decoded at parse time. Their
/// size effects are applied to the segment cursors when committed.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Directive {
    Text,
    Data,
    Global(String),
    Align(u32),
    Space(u32),
    Byte(Vec<u8>),
    Half(Vec<u16>),
    Word(Vec<Word>),
    Ascii(Vec<u8>),
    Asciiz(Vec<u8>),
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum InstructionKind {
    AluR {
        op: AluOp,
        /// Absent for `mult`/`div`, which only define `hi` and `lo`.
        dest: Option<Register>,
        src1: Register,
        src2: Register,
    },
    AluI {
        op: AluOp,
        dest: Register,
        src: Register,
        imm: Immediate,
    },
    Memory {
        store: bool,
        size: AccessSize,
        reg: Register,
        offset: Immediate,
        base: Register,
    },
    Jump {
        link: bool,
        target: JumpTarget,
    },
    Branch {
        cond: BranchCond,
        link: bool,
        src1: Register,
        src2: Register,
        label: String,
    },
    Syscall,
    Directive(Directive),
    /// A line that contained only labels and/or a comment.
    NonExecutable,
}

impl InstructionKind {
    /// Canonical assembly text for an executable kind. Used for
    /// instructions born from pseudo-expansion, which have no source
    /// text of their own. Directive and label-only lines keep their
    /// original text instead.
    pub fn render(&self) -> String {
        match self {
            InstructionKind::AluR {
                op,
                dest,
                src1,
                src2,
            } => {
                if let (AluOp::ADD, Some(d), Register::ZERO) = (*op, dest, src2) {
                    match src1 {
                        Register::HI => return format!("mfhi {}", d),
                        Register::LO => return format!("mflo {}", d),
                        _ => {}
                    }
                }
                let mnemonic = match op {
                    AluOp::ADD => "add",
                    AluOp::ADDU => "addu",
                    AluOp::SUB => "sub",
                    AluOp::SUBU => "subu",
                    AluOp::AND => "and",
                    AluOp::OR => "or",
                    AluOp::XOR => "xor",
                    AluOp::NOR => "nor",
                    AluOp::SLT => "slt",
                    AluOp::SLTU => "sltu",
                    AluOp::SLL => "sllv",
                    AluOp::SRL => "srlv",
                    AluOp::SRA => "srav",
                    AluOp::MULT => "mult",
                    AluOp::MULTU => "multu",
                    AluOp::DIV => "div",
                    AluOp::DIVU => "divu",
                    AluOp::LUI => "lui",
                };
                match dest {
                    Some(dest) => format!("{} {}, {}, {}", mnemonic, dest, src1, src2),
                    None => format!("{} {}, {}", mnemonic, src1, src2),
                }
            }
            InstructionKind::AluI { op, dest, src, imm } => match op {
                AluOp::LUI => format!("lui {}, {}", dest, imm),
                AluOp::SLL => format!("sll {}, {}, {}", dest, src, imm),
                AluOp::SRL => format!("srl {}, {}, {}", dest, src, imm),
                AluOp::SRA => format!("sra {}, {}, {}", dest, src, imm),
                _ => {
                    let mnemonic = match op {
                        AluOp::ADD => "addi",
                        AluOp::ADDU => "addiu",
                        AluOp::AND => "andi",
                        AluOp::OR => "ori",
                        AluOp::XOR => "xori",
                        AluOp::SLT => "slti",
                        AluOp::SLTU => "sltiu",
                        _ => "addi",
                    };
                    format!("{} {}, {}, {}", mnemonic, dest, src, imm)
                }
            },
            InstructionKind::Memory {
                store,
                size,
                reg,
                offset,
                base,
            } => {
                let mnemonic = match (store, size) {
                    (false, AccessSize::BYTE) => "lb",
                    (false, AccessSize::HALF) => "lh",
                    (false, AccessSize::WORD) => "lw",
                    (true, AccessSize::BYTE) => "sb",
                    (true, AccessSize::HALF) => "sh",
                    (true, AccessSize::WORD) => "sw",
                };
                format!("{} {}, {}({})", mnemonic, reg, offset, base)
            }
            InstructionKind::Jump { link, target } => match target {
                JumpTarget::Label(label) => {
                    format!("{} {}", if *link { "jal" } else { "j" }, label)
                }
                JumpTarget::Register(register) => {
                    format!("{} {}", if *link { "jalr" } else { "jr" }, register)
                }
            },
            InstructionKind::Branch {
                cond,
                link,
                src1,
                src2,
                label,
            } => match cond {
                BranchCond::EQ => format!("beq {}, {}, {}", src1, src2, label),
                BranchCond::NE => format!("bne {}, {}, {}", src1, src2, label),
                BranchCond::GE if *link => format!("bgezal {}, {}", src1, label),
                BranchCond::GE => format!("bgez {}, {}", src1, label),
                BranchCond::LT if *link => format!("bltzal {}, {}", src1, label),
                BranchCond::LT => format!("bltz {}, {}", src1, label),
                BranchCond::GT => format!("bgtz {}, {}", src1, label),
                BranchCond::LE => format!("blez {}, {}", src1, label),
            },
            InstructionKind::Syscall => "syscall".to_string(),
            InstructionKind::Directive(_) | InstructionKind::NonExecutable => String::new(),
        }
    }
}

/// One parsed instruction, fixed once the parser hands it over. The
/// only later mutation is merging labels and comments when a
/// label-only line's slot is overwritten by real code.
#[derive(Clone, PartialEq, Debug)]
pub struct Instruction {
    source: String,
    location: Address,
    pc_increment: u32,
    labels: Vec<String>,
    comment: Option<String>,
    kind: InstructionKind,
}

impl Instruction {
    pub fn new(
        kind: InstructionKind,
        source: impl Into<String>,
        location: Address,
        pc_increment: u32,
    ) -> Instruction {
        Instruction {
            source: source.into(),
            location,
            pc_increment,
            labels: Vec::new(),
            comment: None,
            kind,
        }
    }

    /// Attaches the line's labels and comment. The parser calls this
    /// on the first instruction of an expansion only.
    pub fn attach(&mut self, labels: Vec<String>, comment: Option<String>) {
        self.labels = labels;
        self.comment = comment;
    }

    /// Merges context from a label-only instruction whose slot this
    /// one is replacing: its labels come first, its comment is kept
    /// unless the new line has one.
    pub fn merge_context(&mut self, previous: &Instruction) {
        let mut labels = previous.labels.clone();
        labels.extend(self.labels.drain(..));
        self.labels = labels;
        if self.comment.is_none() {
            self.comment = previous.comment.clone();
        }
    }

    #[inline]
    pub fn kind(&self) -> &InstructionKind {
        &self.kind
    }

    #[inline]
    pub fn source(&self) -> &str {
        &self.source
    }

    #[inline]
    pub fn location(&self) -> Address {
        self.location
    }

    #[inline]
    pub fn pc_increment(&self) -> u32 {
        self.pc_increment
    }

    #[inline]
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    #[inline]
    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }

    /// The label this instruction needs resolved before it can run.
    pub fn referenced_label(&self) -> Option<&str> {
        match &self.kind {
            InstructionKind::Jump {
                target: JumpTarget::Label(label),
                ..
            } => Some(label),
            InstructionKind::Branch { label, .. } => Some(label),
            _ => None,
        }
    }

    /// Whether the execution engine has anything to do with this
    /// instruction. Directives run during assembly instead.
    pub fn is_executable(&self) -> bool {
        !matches!(
            self.kind,
            InstructionKind::Directive(_) | InstructionKind::NonExecutable
        )
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for label in &self.labels {
            write!(f, "{}: ", label)?;
        }
        f.write_str(&self.source)?;
        if let Some(comment) = &self.comment {
            if !self.source.is_empty() {
                f.write_str("\t")?;
            }
            write!(f, "# {}", comment)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn immediate_projections() {
        let imm = Immediate::new(-1);
        assert_eq!(imm.value(), -1);
        assert_eq!(imm.signed(), -1);
        assert_eq!(imm.unsigned(), 0x0000_ffff);

        let imm = Immediate::new(0x1234);
        assert_eq!(imm.signed(), 0x1234);
        assert_eq!(imm.unsigned(), 0x1234);
    }

    #[test]
    fn wide_ops() {
        assert!(AluOp::MULT.is_wide());
        assert!(AluOp::DIVU.is_wide());
        assert!(!AluOp::ADD.is_wide());
        assert!(!AluOp::SLL.is_wide());
    }

    #[test]
    fn render_alu_and_memory() {
        let add = InstructionKind::AluR {
            op: AluOp::ADD,
            dest: Some(Register::T2),
            src1: Register::T0,
            src2: Register::T1,
        };
        assert_eq!(add.render(), "add $t2, $t0, $t1");

        let mult = InstructionKind::AluR {
            op: AluOp::MULT,
            dest: None,
            src1: Register::T1,
            src2: Register::AT,
        };
        assert_eq!(mult.render(), "mult $t1, $at");

        let mflo = InstructionKind::AluR {
            op: AluOp::ADD,
            dest: Some(Register::T0),
            src1: Register::LO,
            src2: Register::ZERO,
        };
        assert_eq!(mflo.render(), "mflo $t0");

        let load = InstructionKind::Memory {
            store: false,
            size: AccessSize::WORD,
            reg: Register::T1,
            offset: Immediate::new(0),
            base: Register::SP,
        };
        assert_eq!(load.render(), "lw $t1, 0($sp)");
    }

    #[test]
    fn render_control_flow() {
        let jump = InstructionKind::Jump {
            link: false,
            target: JumpTarget::Label("main".to_string()),
        };
        assert_eq!(jump.render(), "j main");

        let branch = InstructionKind::Branch {
            cond: BranchCond::NE,
            link: false,
            src1: Register::T0,
            src2: Register::T1,
            label: "loop".to_string(),
        };
        assert_eq!(branch.render(), "bne $t0, $t1, loop");

        let bgez = InstructionKind::Branch {
            cond: BranchCond::GE,
            link: true,
            src1: Register::A0,
            src2: Register::ZERO,
            label: "handler".to_string(),
        };
        assert_eq!(bgez.render(), "bgezal $a0, handler");
    }

    #[test]
    fn context_merging() {
        let mut marker = Instruction::new(InstructionKind::NonExecutable, "", 0x0040_0000, 0);
        marker.attach(vec!["loop".to_string()], Some("top".to_string()));

        let mut real = Instruction::new(
            InstructionKind::Syscall,
            "syscall",
            0x0040_0000,
            crate::constants::WORD_BYTES,
        );
        real.attach(vec!["start".to_string()], None);
        real.merge_context(&marker);

        assert_eq!(real.labels(), ["loop".to_string(), "start".to_string()]);
        assert_eq!(real.comment(), Some("top"));
    }

    #[test]
    fn referenced_labels() {
        let jump = Instruction::new(
            InstructionKind::Jump {
                link: false,
                target: JumpTarget::Label("later".to_string()),
            },
            "j later",
            0,
            4,
        );
        assert_eq!(jump.referenced_label(), Some("later"));

        let jr = Instruction::new(
            InstructionKind::Jump {
                link: false,
                target: JumpTarget::Register(Register::RA),
            },
            "jr $ra",
            0,
            4,
        );
        assert_eq!(jr.referenced_label(), None);
    }
}
