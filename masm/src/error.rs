use crate::Rule;
use mips::Address;
use pest::error::Error as PestError;
use std::error::Error as StdError;
use std::fmt;
use util::ParseEnumError;

#[derive(Clone, Debug, PartialEq)]
pub enum Error {
    Syntax(PestError<Rule>),
    UnknownMnemonic(String),
    UnknownDirective(String),
    BadRegister(ParseEnumError),
    WrongOperands(String),
    BadInt(String),
    OutOfRange {
        what: &'static str,
        value: String,
    },
    BadEscape(String),
    TrailingTokens(String),
    DuplicateLabel(String),
    OverwriteInstruction(Address),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Syntax(err) => write!(f, "{}", err),
            Error::UnknownMnemonic(token) => write!(f, "unknown mnemonic {}", token),
            Error::UnknownDirective(token) => write!(f, "unknown directive {}", token),
            Error::BadRegister(err) => write!(f, "invalid register: {}", err),
            Error::WrongOperands(mnemonic) => write!(f, "wrong operands for {}", mnemonic),
            Error::BadInt(token) => write!(f, "invalid integer {}", token),
            Error::OutOfRange { what, value } => write!(f, "{} out of range: {}", what, value),
            Error::BadEscape(token) => write!(f, "invalid escape sequence {}", token),
            Error::TrailingTokens(token) => {
                write!(f, "unexpected token after string literal: {}", token)
            }
            Error::DuplicateLabel(label) => write!(f, "duplicate label {}", label),
            Error::OverwriteInstruction(address) => write!(
                f,
                "refusing to overwrite instruction at {:#010x}",
                address
            ),
        }
    }
}

impl StdError for Error {}

impl From<PestError<Rule>> for Error {
    fn from(err: PestError<Rule>) -> Error {
        Error::Syntax(err)
    }
}

impl From<ParseEnumError> for Error {
    fn from(err: ParseEnumError) -> Error {
        Error::BadRegister(err)
    }
}
