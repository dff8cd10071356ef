//! Signed mantissa/exponent numerals
//!
//! Every number the instrument sends or accepts carries an explicit
//! sign: `+1.25`, `-400`, and in scientific form `+2.00E-01`.

use core::fmt::Write;

use heapless::String;
#[cfg(not(feature = "std"))]
use micromath::F32Ext;

use crate::error::NumericError;
use crate::types::Scale;

/// Maximum encoded numeral length
pub const MAX_TOKEN_LEN: usize = 48;

/// An encoded numeral
pub type Token = String<MAX_TOKEN_LEN>;

/// Decimal places kept in a formatted scientific mantissa
const MANTISSA_PLACES: f32 = 1e4;

/// Decode a signed numeral such as `+1.23`, `-400` or `+.5`
///
/// The first byte must be the sign. Digits are weighted from the
/// decimal point when there is one, otherwise from the token length.
pub fn decode(token: &[u8]) -> Result<f32, NumericError> {
    let (&sign, body) = token.split_first().ok_or(NumericError::Empty)?;
    let negative = match sign {
        b'+' => false,
        b'-' => true,
        _ => return Err(NumericError::MissingSign),
    };

    let mut point = None;
    for (i, &b) in body.iter().enumerate() {
        match b {
            b'.' if point.is_some() => return Err(NumericError::MultiplePoints),
            b'.' => point = Some(i),
            b'0'..=b'9' => {}
            other => return Err(NumericError::InvalidByte(other)),
        }
    }
    let digits = body.len() - usize::from(point.is_some());
    if digits == 0 {
        return Err(NumericError::NoDigits);
    }

    // Weight of the first digit as a power of ten
    let integer_digits = point.unwrap_or(body.len());
    let mut weight = 1.0f64;
    for _ in 1..integer_digits {
        weight *= 10.0;
    }
    if integer_digits == 0 {
        weight = 0.1;
    }

    let mut value = 0.0f64;
    for &b in body.iter().filter(|b| b.is_ascii_digit()) {
        value += f64::from(b - b'0') * weight;
        weight /= 10.0;
    }

    #[allow(clippy::cast_possible_truncation)]
    let value = value as f32;
    Ok(if negative { -value } else { value })
}

/// Encode a value with an explicit sign
///
/// `integral` emits the truncated magnitude as a bare integer; otherwise
/// the default fixed notation of the float is used.
pub fn encode(value: f32, integral: bool) -> Result<Token, NumericError> {
    let mut token = Token::new();
    let sign = if value < 0.0 { '-' } else { '+' };
    token.push(sign).map_err(|()| NumericError::Overflow)?;
    let magnitude = value.abs();
    let written = if integral {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let whole = magnitude.trunc() as u64;
        write!(token, "{whole}")
    } else {
        write!(token, "{magnitude}")
    };
    written.map_err(|_| NumericError::Overflow)?;
    Ok(token)
}

/// Split a scientific literal `<mantissa>E<exponent>` into its parts
pub fn parse_scientific(token: &[u8]) -> Result<(f32, i32), NumericError> {
    let token = trim(token);
    if token.is_empty() {
        return Err(NumericError::Empty);
    }
    let split = token
        .iter()
        .position(|&b| b == b'E' || b == b'e')
        .ok_or(NumericError::MissingExponent)?;
    let mantissa = decode(&token[..split])?;
    let exponent = decode(&token[split + 1..])?;
    #[allow(clippy::cast_possible_truncation)]
    Ok((mantissa, exponent.round() as i32))
}

/// Decode a scientific literal straight to its value
pub fn decode_scientific(token: &[u8]) -> Result<f32, NumericError> {
    let (mantissa, exponent) = parse_scientific(token)?;
    Ok(Scale::new(mantissa, exponent).value())
}

/// Format a value as `<mantissa>E<exponent>`
///
/// Whole mantissas are written as integers, so `0.2` becomes `+2E-1`.
pub fn format_scientific(value: f32) -> Result<Token, NumericError> {
    let scale = Scale::from_value(value);
    let mantissa = (scale.mantissa() * MANTISSA_PLACES).round() / MANTISSA_PLACES;
    format_parts(Scale::new(mantissa, scale.exponent()))
}

/// Format a scale as `<mantissa>E<exponent>`
pub fn format_scale(scale: Scale) -> Result<Token, NumericError> {
    format_parts(scale)
}

fn format_parts(scale: Scale) -> Result<Token, NumericError> {
    let mut token = encode(scale.mantissa(), scale.is_integral())?;
    token.push('E').map_err(|()| NumericError::Overflow)?;
    #[allow(clippy::cast_precision_loss)]
    let exponent = encode(scale.exponent() as f32, true)?;
    token
        .push_str(&exponent)
        .map_err(|()| NumericError::Overflow)?;
    Ok(token)
}

fn trim(token: &[u8]) -> &[u8] {
    let start = token
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(token.len());
    let end = token
        .iter()
        .rposition(|b| !b.is_ascii_whitespace())
        .map_or(start, |i| i + 1);
    &token[start..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trim_strips_both_ends() {
        assert_eq!(trim(b"  +1E0\r\n"), b"+1E0");
        assert_eq!(trim(b"   "), b"");
    }

    #[test]
    fn integral_mantissa_has_no_point() {
        assert_eq!(format_scale(Scale::new(2.0, -1)).unwrap().as_str(), "+2E-1");
    }

    #[test]
    fn zero_formats() {
        assert_eq!(format_scientific(0.0).unwrap().as_str(), "+0E+0");
    }
}
