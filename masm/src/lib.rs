//! Assembly front end for the [mips](../mips/index.html) machine.
//!
//! The central entry point is [`parse_line`], which turns one line of
//! free-form assembly source into an ordered sequence of
//! [`Instruction`]s: a meta line (labels and/or a comment only), a
//! directive, a single machine instruction, or a pseudo-instruction
//! expanded into two or three simples with consecutive locations.
//!
//! Parsed batches are fed to an [`Assembler`], which owns the label
//! map, the location-to-instruction map, the unresolved-reference map
//! and the text/data cursors, and writes instruction encodings and
//! directive data into simulated memory.
//!
//! Lines are parsed with [pest]; `masm::Error` wraps
//! `pest::error::Error<Rule>` so syntax diagnostics keep pest's
//! line/column rendering.
//!
//! [pest]: https://docs.rs/pest/

mod directives;
mod error;
mod escape;
mod instructions;
mod int_util;
mod state;


pub use crate::error::Error;
pub use crate::escape::{escape, unescape};
pub use crate::state::{Assembler, Commit};

use mips::{Address, Instruction, InstructionKind};
use pest::Parser;
use pest_derive::Parser;

#[derive(Parser)]
#[grammar = "grammar.pest"]
struct LineParser;

pub type Result<T> = std::result::Result<T, Error>;

/// Parses one source line into its instructions.
///
/// `location` is the address the line's first instruction will occupy;
/// pseudo-expansion places the remaining simples at `location + 4` and
/// `location + 8`. The line's labels and comment are attached to the
/// first instruction only.
pub fn parse_line(line: &str, location: Address) -> Result<Vec<Instruction>> {
    let pair = LineParser::parse(Rule::line, line)?.next().unwrap();

    let mut labels = Vec::new();
    let mut comment = None;
    let mut statement = None;

    for item in pair.into_inner() {
        match item.as_rule() {
            Rule::label => {
                for fragment in item.as_str().split(':').filter(|f| !f.is_empty()) {
                    labels.push(fragment.to_string());
                }
            }
            Rule::directive | Rule::instruction => statement = Some(item),
            Rule::comment => comment = Some(item.as_str()[1..].trim().to_string()),
            Rule::EOI => {}
            _ => unreachable!(),
        }
    }

    let mut batch = match statement {
        None => vec![Instruction::new(InstructionKind::NonExecutable, "", location, 0)],
        Some(pair) if pair.as_rule() == Rule::directive => {
            vec![directives::build(pair, location)?]
        }
        Some(pair) => instructions::build(pair, location)?,
    };

    batch[0].attach(labels, comment);
    Ok(batch)
}
