use crate::constants;
use crate::Word;
use num_derive::{FromPrimitive, ToPrimitive};
use num_traits::{FromPrimitive as _, ToPrimitive as _};
use std::fmt;
use std::str::FromStr;
use util::ParseEnumError;

/// The register set: the 32 general-purpose registers in their machine
/// order, followed by the three registers that user assembly cannot
/// name as operands.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, FromPrimitive, ToPrimitive)]
pub enum Register {
    /// Always zero; writes are discarded.
    ZERO,
    /// Assembler temporary, clobbered by pseudo-instruction expansion.
    AT,
    V0,
    V1,
    A0,
    A1,
    A2,
    A3,
    T0,
    T1,
    T2,
    T3,
    T4,
    T5,
    T6,
    T7,
    S0,
    S1,
    S2,
    S3,
    S4,
    S5,
    S6,
    S7,
    T8,
    T9,
    K0,
    K1,
    GP,
    SP,
    FP,
    RA,
    /// Program counter. Written by jumps and branches only.
    PC,
    /// Upper half of multiplication results, remainder of division.
    HI,
    /// Lower half of multiplication results, quotient of division.
    LO,
}

/// General-purpose register names in machine order, without the `$`.
const GPR_NAMES: [&str; constants::GPR_COUNT] = [
    "zero", "at", "v0", "v1", "a0", "a1", "a2", "a3", "t0", "t1", "t2", "t3", "t4", "t5", "t6",
    "t7", "s0", "s1", "s2", "s3", "s4", "s5", "s6", "s7", "t8", "t9", "k0", "k1", "gp", "sp", "fp",
    "ra",
];

impl Register {
    #[inline]
    pub fn index(self) -> usize {
        self.to_usize().unwrap()
    }

    /// Whether this is one of the 32 numbered machine registers.
    #[inline]
    pub fn is_gpr(self) -> bool {
        self.index() < constants::GPR_COUNT
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Register::PC => f.write_str("pc"),
            Register::HI => f.write_str("hi"),
            Register::LO => f.write_str("lo"),
            _ => write!(f, "${}", GPR_NAMES[self.index()]),
        }
    }
}

impl FromStr for Register {
    type Err = ParseEnumError;

    /// Accepts `$`-prefixed names (`$t0`) and numeric aliases (`$8`).
    /// `pc`, `hi` and `lo` deliberately do not parse: they can only be
    /// named by instructions that define them.
    fn from_str(s: &str) -> Result<Register, ParseEnumError> {
        let err = || ParseEnumError {
            value: s.to_string(),
            enum_name: "Register",
        };

        let name = match s.strip_prefix('$') {
            Some(rest) if !rest.is_empty() => rest,
            _ => return Err(err()),
        };

        if name.bytes().all(|b| b.is_ascii_digit()) {
            let number: usize = name.parse().map_err(|_| err())?;
            if number < constants::GPR_COUNT {
                return Register::from_usize(number).ok_or_else(err);
            }
            return Err(err());
        }

        // $s8 is the conventional alias for the frame pointer.
        if name == "s8" {
            return Ok(Register::FP);
        }

        GPR_NAMES
            .iter()
            .position(|&n| n == name)
            .and_then(Register::from_usize)
            .ok_or_else(err)
    }
}

/// The machine's register values: 32 general-purpose slots plus `pc`,
/// `hi` and `lo`, all 32-bit words.
pub struct RegisterFile {
    values: [Word; constants::REGISTER_COUNT],
}

impl RegisterFile {
    pub fn new() -> RegisterFile {
        let mut file = RegisterFile {
            values: [0; constants::REGISTER_COUNT],
        };
        file.set(Register::GP, constants::GLOBAL_BASE);
        file.set(Register::SP, constants::STACK_BASE);
        file.set(Register::PC, constants::TEXT_BASE);
        file
    }

    #[inline]
    pub fn get(&self, register: Register) -> Word {
        self.values[register.index()]
    }

    /// Writes a register. Writes to `$zero` are discarded here so no
    /// caller has to special-case them.
    #[inline]
    pub fn set(&mut self, register: Register, value: Word) {
        let index = register.index();
        if index != Register::ZERO.index() {
            self.values[index] = value;
        }
    }

    #[inline]
    pub fn pc(&self) -> Word {
        self.get(Register::PC)
    }

    #[inline]
    pub fn set_pc(&mut self, value: Word) {
        self.set(Register::PC, value);
    }

    /// The general-purpose registers in machine order, for dumps.
    pub fn gprs(&self) -> impl Iterator<Item = (Register, Word)> + '_ {
        (0..constants::GPR_COUNT).map(move |i| {
            let register = Register::from_usize(i).unwrap();
            (register, self.values[i])
        })
    }
}

impl Default for RegisterFile {
    fn default() -> RegisterFile {
        RegisterFile::new()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parse_names_and_aliases() {
        assert_eq!("$zero".parse(), Ok(Register::ZERO));
        assert_eq!("$0".parse(), Ok(Register::ZERO));
        assert_eq!("$t0".parse(), Ok(Register::T0));
        assert_eq!("$8".parse(), Ok(Register::T0));
        assert_eq!("$t8".parse(), Ok(Register::T8));
        assert_eq!("$24".parse(), Ok(Register::T8));
        assert_eq!("$ra".parse(), Ok(Register::RA));
        assert_eq!("$31".parse(), Ok(Register::RA));
        assert_eq!("$s8".parse(), Ok(Register::FP));
        assert_eq!("$30".parse(), Ok(Register::FP));
    }

    #[test]
    fn reject_unnameable_and_unknown() {
        assert!(Register::from_str("pc").is_err());
        assert!(Register::from_str("hi").is_err());
        assert!(Register::from_str("lo").is_err());
        assert!(Register::from_str("$pc").is_err());
        assert!(Register::from_str("$32").is_err());
        assert!(Register::from_str("$t99").is_err());
        assert!(Register::from_str("t0").is_err());
        assert!(Register::from_str("$").is_err());
    }

    #[test]
    fn display_round_trip() {
        for i in 0..constants::GPR_COUNT {
            let register = Register::from_usize(i).unwrap();
            let rendered = register.to_string();
            assert_eq!(rendered.parse(), Ok(register));
        }
        assert_eq!(Register::PC.to_string(), "pc");
        assert_eq!(Register::HI.to_string(), "hi");
    }

    #[test]
    fn zero_register_is_immutable() {
        let mut file = RegisterFile::new();
        file.set(Register::ZERO, 0xdead_beef);
        assert_eq!(file.get(Register::ZERO), 0);
    }

    #[test]
    fn initial_pointers() {
        let file = RegisterFile::new();
        assert_eq!(file.get(Register::SP), constants::STACK_BASE);
        assert_eq!(file.get(Register::GP), constants::GLOBAL_BASE);
        assert_eq!(file.pc(), constants::TEXT_BASE);
        assert_eq!(file.get(Register::T0), 0);
    }
}
