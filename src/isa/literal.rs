//! Numeric literal parser shared by the lexer-driven parser and the builder.

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LiteralError {
    #[error("literal is empty")]
    Empty,
    #[error("invalid literal format: {0}")]
    InvalidFormat(String),
    #[error("negative literals are not supported")]
    NegativeNotSupported,
    #[error("literal '{0}' exceeds the allowed range")]
    OutOfRange(String),
}

fn strip_prefix_ignore_case<'a>(input: &'a str, prefix: &str) -> Option<&'a str> {
    input
        .strip_prefix(prefix)
        .or_else(|| input.strip_prefix(prefix.to_ascii_uppercase().as_str()))
}

/// Parses an unsigned 64-bit literal.
pub fn parse_u64_literal(input: &str) -> Result<u64, LiteralError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(LiteralError::Empty);
    }
    if trimmed.starts_with('-') {
        return Err(LiteralError::NegativeNotSupported);
    }
    let (digits, radix) = [("0b", 2), ("0o", 8), ("0x", 16)]
        .into_iter()
        .find_map(|(prefix, radix)| {
            strip_prefix_ignore_case(trimmed, prefix).map(|rest| (rest, radix))
        })
        .unwrap_or((trimmed, 10));
    parse_radix(digits, radix)
}

fn parse_radix(src: &str, radix: u32) -> Result<u64, LiteralError> {
    let digits = src.replace('_', "");
    if digits.is_empty() {
        return Err(LiteralError::InvalidFormat(src.into()));
    }
    u64::from_str_radix(&digits, radix).map_err(|_| LiteralError::InvalidFormat(src.into()))
}

/// Parses an unsigned 32-bit literal (opcodes, LUT constants).
pub fn parse_u32_literal(input: &str) -> Result<u32, LiteralError> {
    let value = parse_u64_literal(input)?;
    u32::try_from(value).map_err(|_| LiteralError::OutOfRange(input.trim().to_string()))
}

/// Parses an unsigned 8-bit literal (bit positions, widths, counts).
pub fn parse_u8_literal(input: &str) -> Result<u8, LiteralError> {
    let value = parse_u64_literal(input)?;
    u8::try_from(value).map_err(|_| LiteralError::OutOfRange(input.trim().to_string()))
}
