//! Directive parsing: validates arguments and produces typed
//! [`Directive`] values. Size effects happen later, when the
//! assembler commits the line.

use crate::error::Error;
use crate::escape::unescape;
use crate::int_util::{parse_byte, parse_count, parse_half, parse_word};
use crate::{Result, Rule};
use matches::debug_assert_matches;
use mips::{Address, Directive, Instruction, InstructionKind};
use pest::iterators::Pair;

/// Builds the single instruction a directive line produces. Its
/// `pc_increment` is zero: the assembler advances the cursor by the
/// directive's actual size when it runs.
pub fn build(pair: Pair<Rule>, location: Address) -> Result<Instruction> {
    debug_assert_matches!(pair.as_rule(), Rule::directive);

    let source = pair.as_str().to_string();
    let mut pairs = pair.into_inner();
    let name = pairs.next().unwrap().as_str().to_string();
    let args: Vec<Pair<Rule>> = pairs.collect();

    let directive = match name.as_str() {
        ".text" => {
            no_args(&name, &args)?;
            Directive::Text
        }
        ".data" => {
            no_args(&name, &args)?;
            Directive::Data
        }
        ".globl" => Directive::Global(one_name(&name, &args)?.to_string()),
        ".align" => {
            let factor = parse_count(one_int(&name, &args)?, "alignment factor")?;
            if factor > 2 {
                return Err(Error::OutOfRange {
                    what: "alignment factor",
                    value: factor.to_string(),
                });
            }
            Directive::Align(factor)
        }
        ".space" => Directive::Space(parse_count(one_int(&name, &args)?, "space size")?),
        ".byte" => Directive::Byte(int_list(&name, &args, parse_byte)?),
        ".half" => Directive::Half(int_list(&name, &args, parse_half)?),
        ".word" => Directive::Word(int_list(&name, &args, parse_word)?),
        ".ascii" => Directive::Ascii(string_bytes(&name, &args)?),
        ".asciiz" => Directive::Asciiz(string_bytes(&name, &args)?),
        _ => return Err(Error::UnknownDirective(name)),
    };

    Ok(Instruction::new(
        InstructionKind::Directive(directive),
        source,
        location,
        0,
    ))
}

fn arg_inner<'i>(pair: &Pair<'i, Rule>) -> Pair<'i, Rule> {
    pair.clone().into_inner().next().unwrap()
}

fn no_args(name: &str, args: &[Pair<Rule>]) -> Result<()> {
    if args.is_empty() {
        Ok(())
    } else {
        Err(Error::WrongOperands(name.to_string()))
    }
}

fn one_name<'i>(name: &str, args: &[Pair<'i, Rule>]) -> Result<&'i str> {
    match args {
        [arg] => {
            let inner = arg_inner(arg);
            if inner.as_rule() == Rule::name {
                Ok(inner.as_str())
            } else {
                Err(Error::WrongOperands(name.to_string()))
            }
        }
        _ => Err(Error::WrongOperands(name.to_string())),
    }
}

fn one_int<'i>(name: &str, args: &[Pair<'i, Rule>]) -> Result<&'i str> {
    match args {
        [arg] => {
            let inner = arg_inner(arg);
            if inner.as_rule() == Rule::int {
                Ok(inner.as_str())
            } else {
                Err(Error::WrongOperands(name.to_string()))
            }
        }
        _ => Err(Error::WrongOperands(name.to_string())),
    }
}

fn int_list<T>(
    name: &str,
    args: &[Pair<Rule>],
    parse: impl Fn(&str) -> Result<T>,
) -> Result<Vec<T>> {
    if args.is_empty() {
        return Err(Error::WrongOperands(name.to_string()));
    }
    let mut values = Vec::with_capacity(args.len());
    for arg in args {
        let inner = arg_inner(arg);
        if inner.as_rule() != Rule::int {
            return Err(Error::WrongOperands(name.to_string()));
        }
        values.push(parse(inner.as_str())?);
    }
    Ok(values)
}

/// Extracts and decodes the one string literal of `.ascii`/`.asciiz`.
/// The literal is taken from its raw span, so inner whitespace
/// survives tokenization; anything after the closing quote is an
/// error.
fn string_bytes(name: &str, args: &[Pair<Rule>]) -> Result<Vec<u8>> {
    match args {
        [arg] => {
            let inner = arg_inner(arg);
            if inner.as_rule() != Rule::string {
                return Err(Error::WrongOperands(name.to_string()));
            }
            let quoted = inner.as_str();
            unescape(&quoted[1..quoted.len() - 1])
        }
        [first, second, ..] => {
            if arg_inner(first).as_rule() == Rule::string {
                Err(Error::TrailingTokens(second.as_str().to_string()))
            } else {
                Err(Error::WrongOperands(name.to_string()))
            }
        }
        [] => Err(Error::WrongOperands(name.to_string())),
    }
}
