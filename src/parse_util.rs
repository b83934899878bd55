//! Small combinators over byte slices.
//!
//! Every function takes the remaining input and hands back whatever is left after it, so parsers
//! read as a straight line of `let bytes = ...` rebinds.

use std::str::FromStr;

use thiserror::Error;

pub type ParseResult<T> = Result<T, ParseError>;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ParseError {
    #[error("Unexpected end of input, expected '{exp}'")]
    UnexpectedEof { exp: char },

    #[error("Expected '{exp}', but got '{got}'")]
    UnexpectedToken { exp: char, got: char },

    #[error("Expected \"{exp}\", but got \"{got}\"")]
    UnexpectedSlice { exp: String, got: String },
}

/// Consumes ascii whitespace, including line breaks.
pub fn take_ws(bytes: &[u8]) -> &[u8] {
    let i = bytes
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(bytes.len());

    &bytes[i..]
}

/// Consumes spaces and tabs only, stopping at a line break.
pub fn take_blank(bytes: &[u8]) -> &[u8] {
    let i = bytes
        .iter()
        .position(|&b| b != b' ' && b != b'\t')
        .unwrap_or(bytes.len());

    &bytes[i..]
}

/// Takes the next byte from the slice. If there is none, the slice is left as-is.
pub const fn take_1(bytes: &[u8]) -> (Option<u8>, &[u8]) {
    let [b, bytes @ ..] = bytes else {
        return (None, bytes);
    };

    (Some(*b), bytes)
}

/// Like `take_1`, but doesn't consume the byte.
pub fn peek_1(bytes: &[u8]) -> Option<u8> {
    bytes.first().copied()
}

/// Expects the next byte in `bytes` to be `b`.
pub fn expect(b: u8, bytes: &[u8]) -> ParseResult<&[u8]> {
    let (Some(a), bytes) = take_1(bytes) else {
        return Err(ParseError::UnexpectedEof { exp: b as char });
    };

    if a != b {
        return Err(ParseError::UnexpectedToken {
            exp: b as char,
            got: a as char,
        });
    }

    Ok(bytes)
}

/// Expects `bytes` to start with `bs`.
pub fn expect_slice<'a>(bs: &[u8], bytes: &'a [u8]) -> ParseResult<&'a [u8]> {
    match bytes.strip_prefix(bs) {
        Some(rest) => Ok(rest),
        None => {
            let n = bs.len().min(bytes.len());

            Err(ParseError::UnexpectedSlice {
                exp: String::from_utf8_lossy(bs).to_string(),
                got: String::from_utf8_lossy(&bytes[..n]).to_string(),
            })
        }
    }
}

/// Advance the slice until `P` is satisfied (or the input ends), without consuming the byte that
/// satisfied it.
///
/// Returns `None` when nothing was consumed.
#[inline]
pub fn take_until_fn<P>(p: P, bytes: &[u8]) -> (Option<&[u8]>, &[u8])
where
    P: Fn(u8) -> bool,
{
    let i = bytes.iter().position(|&b| p(b)).unwrap_or(bytes.len());

    if i == 0 {
        (None, bytes)
    } else {
        let (res, bytes) = bytes.split_at(i);

        (Some(res), bytes)
    }
}

/// Advance the slice until byte `b` is found, without consuming it.
pub fn take_until(b: u8, bytes: &[u8]) -> (Option<&[u8]>, &[u8]) {
    take_until_fn(|a| a == b, bytes)
}

/// Takes a run of ascii digits.
pub fn take_digits(bytes: &[u8]) -> (Option<&[u8]>, &[u8]) {
    take_until_fn(|b| !b.is_ascii_digit(), bytes)
}

/// Takes the rest of the current line and consumes its line break, if any. A trailing `\r` is
/// not part of the returned line.
pub fn take_line(bytes: &[u8]) -> (&[u8], &[u8]) {
    let (line, bytes) = take_until(b'\n', bytes);
    let (_, bytes) = take_1(bytes);

    let line = line.unwrap_or_default();
    let line = line.strip_suffix(b"\r").unwrap_or(line);

    (line, bytes)
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConvertError {
    #[error("Input is not valid UTF-8")]
    InvalidUtf8,

    #[error("Failed to convert \"{str}\"")]
    ParseError { str: String },
}

/// Converts `&[u8]` to `T` if `T: FromStr`.
pub fn convert<T: FromStr>(bytes: &[u8]) -> Result<T, ConvertError> {
    let str = std::str::from_utf8(bytes).map_err(|_| ConvertError::InvalidUtf8)?;

    str.trim().parse::<T>().map_err(|_| ConvertError::ParseError {
        str: str.to_string(),
    })
}
