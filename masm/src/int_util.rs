//! Integer literal parsing: signed decimal or `0x` hexadecimal, with
//! per-width range validation.

use crate::error::Error;
use crate::Result;

fn parse_i64(text: &str) -> Result<i64> {
    let (negative, digits) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text),
    };
    let magnitude = if let Some(hex) = digits.strip_prefix("0x") {
        i64::from_str_radix(hex, 16)
    } else {
        i64::from_str_radix(digits, 10)
    }
    .map_err(|_| Error::BadInt(text.to_string()))?;

    Ok(if negative { -magnitude } else { magnitude })
}

fn ranged(text: &str, what: &'static str, min: i64, max: i64) -> Result<i64> {
    let value = parse_i64(text)?;
    if value < min || value > max {
        return Err(Error::OutOfRange {
            what,
            value: text.to_string(),
        });
    }
    Ok(value)
}

/// 16-bit immediates accept −32768..=65535; values above `i16::MAX`
/// are reinterpreted as their 16-bit two's-complement pattern, so
/// `0xFFFF` parses as `-1`.
pub fn parse_imm16(text: &str) -> Result<i16> {
    Ok(ranged(text, "immediate", i64::from(i16::min_value()), i64::from(u16::max_value()))? as i16)
}

/// Shift amounts must lie in 0..=31.
pub fn parse_shift(text: &str) -> Result<i16> {
    Ok(ranged(text, "shift amount", 0, 31)? as i16)
}

pub fn parse_byte(text: &str) -> Result<u8> {
    Ok(ranged(text, "byte value", i64::from(i8::min_value()), i64::from(u8::max_value()))? as u8)
}

pub fn parse_half(text: &str) -> Result<u16> {
    Ok(ranged(text, "half value", i64::from(i16::min_value()), i64::from(u16::max_value()))? as u16)
}

pub fn parse_word(text: &str) -> Result<u32> {
    Ok(
        ranged(text, "word value", i64::from(i32::min_value()), i64::from(u32::max_value()))?
            as u32,
    )
}

/// Non-negative counts for `.align` and `.space`.
pub fn parse_count(text: &str, what: &'static str) -> Result<u32> {
    Ok(ranged(text, what, 0, i64::from(u32::max_value()))? as u32)
}

/// A 32-bit constant destined for a register load: either one
/// sign-extendable 16-bit immediate, or split into halves for a
/// `lui`/`or` pair.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Constant {
    Narrow(i16),
    Wide { high: i16, low: i16 },
}

pub fn parse_constant(text: &str) -> Result<Constant> {
    let value = ranged(
        text,
        "constant",
        i64::from(i32::min_value()),
        i64::from(u32::max_value()),
    )?;
    if value >= i64::from(i16::min_value()) && value <= i64::from(i16::max_value()) {
        Ok(Constant::Narrow(value as i16))
    } else {
        let word = value as u32;
        Ok(Constant::Wide {
            high: (word >> 16) as u16 as i16,
            low: word as u16 as i16,
        })
    }
}
