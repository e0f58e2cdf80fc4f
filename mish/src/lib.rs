//! Interactive shell for the [mips](../mips/index.html) machine.
//!
//! Couples the `masm` front end to the execution engine: reads lines,
//! parses and commits them, and steps the processor when auto-execute
//! is on, pausing whenever a forward reference appears and resuming on
//! `:execute`. Everything the shell can do besides assembling code is
//! a `:`-prefixed meta-command.

mod command;
mod interpreter;

pub use crate::command::Command;
pub use crate::interpreter::{Base, Interpreter, Settings};
