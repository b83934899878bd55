use std::borrow::Cow;

use thiserror::Error;
use tracing::warn;

use crate::parse_util;
use crate::parse_util::ConvertError;
use crate::parse_util::ParseError;
use crate::rule_set;
use crate::rule_set::RuleError;
use crate::rule_set::RuleSet;

/// Largest width or height a pattern may span, declared or not.
pub const MAX_PATTERN_SIDE: usize = 1 << 16;

#[derive(Debug, Default, PartialEq, Eq)]
pub struct RleFile<'a> {
    pub name: Option<Cow<'a, str>>,
    pub author: Option<Cow<'a, str>>,

    /// Position of the pattern's top-left corner, from a `#P` or `#R` line.
    pub offset: Option<(i64, i64)>,

    /// Bounding box declared by the header line, as `(width, height)`.
    pub size: Option<(usize, usize)>,

    /// Rule from the header, or from a `#r` line when the header has none.
    pub rules: Option<RuleSet>,
}

#[derive(Debug, Error)]
pub enum RleError {
    #[error("Comment line error: {0}")]
    CommentLine(#[from] RleCommentLineError),

    #[error("Header line error: {0}")]
    HeaderLine(#[from] RleHeaderLineError),

    #[error("Encoding error: {0}")]
    Encoding(#[from] RleEncodingError),
}

/// Parse the RLE file format, calling `f(row, col)` for every live cell. Rows grow downward from
/// the top-left corner of the pattern.
///
/// See: https://conwaylife.com/wiki/Run_Length_Encoded
pub fn read_rle<F>(mut bytes: &'_ [u8], f: F) -> Result<RleFile<'_>, RleError>
where
    F: FnMut(usize, usize),
{
    let mut file = RleFile::default();

    // Parse as many comment lines as possible
    loop {
        bytes = parse_util::take_ws(bytes);

        let (Some(line), rest) = read_line_comment(bytes)? else {
            break;
        };

        match line {
            RleCommentLine::Comment => {}
            RleCommentLine::Name { name } => {
                if file.name.is_some() {
                    warn!("RLE file name already defined. Using latest");
                }

                file.name = Some(name);
            }
            RleCommentLine::Author { author } => {
                if file.author.is_some() {
                    warn!("RLE author already defined. Using latest");
                }

                file.author = Some(author);
            }
            RleCommentLine::Offset { x, y } => {
                if file.offset.is_some() {
                    warn!("RLE offset already defined. Using latest");
                }

                file.offset = Some((x, y))
            }
            RleCommentLine::RuleSet { set } => {
                if file.rules.is_some() {
                    warn!("RLE rule already defined. Using latest");
                }

                file.rules = Some(set);
            }
        }

        bytes = rest;
    }

    // Parse header line, if it's present
    if let (Some(header), rest) = read_line_header(bytes)? {
        let RleHeaderLine {
            width,
            height,
            set,
        } = header;

        file.size = Some((width, height));

        if let Some(set) = set {
            if file.rules.is_some_and(|rules| rules != set) {
                warn!("RLE header rule {set} overrides comment rule");
            }

            file.rules = Some(set);
        }

        bytes = rest;
    }

    let bounds = file.size.unwrap_or((MAX_PATTERN_SIDE, MAX_PATTERN_SIDE));
    read_encoding(bytes, bounds, f)?;

    Ok(file)
}

enum RleCommentLine<'a> {
    Comment,
    Name { name: Cow<'a, str> },
    Author { author: Cow<'a, str> },
    Offset { x: i64, y: i64 },
    RuleSet { set: RuleSet },
}

#[derive(Debug, Error)]
pub enum RleCommentLineError {
    #[error("No comment type")]
    NoType,

    #[error("Empty name line")]
    EmptyName,

    #[error("Empty author line")]
    EmptyAuthor,

    #[error("Invalid rule: {0}")]
    InvalidRule(#[from] RuleError),

    #[error("Invalid coordinates: {0}")]
    InvalidCoord(#[from] RleCoordError),

    #[error("Invalid comment type, found '{got}'")]
    InvalidType { got: char },
}

/// Attempt to parse a comment line, otherwise leaves `bytes` as-is.
fn read_line_comment(
    bytes: &'_ [u8],
) -> Result<(Option<RleCommentLine<'_>>, &'_ [u8]), RleCommentLineError> {
    let Ok(rest) = parse_util::expect(b'#', bytes) else {
        return Ok((None, bytes));
    };

    let (Some(b), rest) = parse_util::take_1(rest) else {
        return Err(RleCommentLineError::NoType);
    };

    let (line, rest) = parse_util::take_line(rest);
    let line = line.trim_ascii();

    let line = match b {
        // Comment line
        b'C' | b'c' => RleCommentLine::Comment,

        // Pattern name
        b'N' => {
            if line.is_empty() {
                return Err(RleCommentLineError::EmptyName);
            }

            RleCommentLine::Name {
                name: String::from_utf8_lossy(line),
            }
        }

        // Pattern author
        b'O' => {
            if line.is_empty() {
                return Err(RleCommentLineError::EmptyAuthor);
            }

            RleCommentLine::Author {
                author: String::from_utf8_lossy(line),
            }
        }

        // Pattern offset
        b'R' | b'P' => {
            let (x, y) = read_offset(line)?;

            RleCommentLine::Offset { x, y }
        }

        // Pattern rules
        b'r' => {
            let (set, _) = rule_set::parse_rule(line)?;

            RleCommentLine::RuleSet { set }
        }

        b => return Err(RleCommentLineError::InvalidType { got: b as char }),
    };

    Ok((Some(line), rest))
}

#[derive(Debug, Error)]
pub enum RleCoordError {
    #[error("Expected x coordinate, found end of line")]
    NoX,

    #[error("Failed to parse x coordinate: {0}")]
    ParseX(#[source] ConvertError),

    #[error("Expected y coordinate, found end of line")]
    NoY,

    #[error("Failed to parse y coordinate: {0}")]
    ParseY(#[source] ConvertError),
}

/// Reads the `x y` pair of a `#P` line, e.g. `#P -1 -1`.
fn read_offset(line: &[u8]) -> Result<(i64, i64), RleCoordError> {
    let mut words = line
        .split(|b| b.is_ascii_whitespace())
        .filter(|w| !w.is_empty());

    let x = words.next().ok_or(RleCoordError::NoX)?;
    let x = parse_util::convert(x).map_err(RleCoordError::ParseX)?;

    let y = words.next().ok_or(RleCoordError::NoY)?;
    let y = parse_util::convert(y).map_err(RleCoordError::ParseY)?;

    Ok((x, y))
}

struct RleHeaderLine {
    width: usize,
    height: usize,
    set: Option<RuleSet>,
}

#[derive(Debug, Error)]
pub enum RleHeaderLineError {
    #[error("Parse error: {0}")]
    ParseError(#[from] ParseError),

    #[error("Expected width, found '{got}'")]
    NoWidth { got: String },

    #[error("Expected height, found '{got}'")]
    NoHeight { got: String },

    #[error("Invalid dimension: {0}")]
    InvalidNumber(#[from] ConvertError),

    #[error("Invalid token: expected ',' or end of line, found '{got}'")]
    InvalidToken { got: char },

    #[error("Invalid rule: {0}")]
    InvalidRule(#[from] RuleError),

    #[error("Pattern of {width}x{height} is larger than 65536x65536")]
    TooLarge { width: usize, height: usize },
}

/// Attempt to parse a header line like `x = 3, y = 3, rule = B3/S23`, otherwise leaves `bytes`
/// as-is.
fn read_line_header(bytes: &[u8]) -> Result<(Option<RleHeaderLine>, &[u8]), RleHeaderLineError> {
    let Ok(rest) = parse_util::expect(b'x', bytes) else {
        return Ok((None, bytes));
    };

    let (line, rest) = parse_util::take_line(rest);

    let line = read_assignment(line)?;
    let (Some(width), line) = parse_util::take_digits(line) else {
        return Err(RleHeaderLineError::NoWidth {
            got: String::from_utf8_lossy(line).to_string(),
        });
    };
    let width = parse_util::convert(width)?;

    let line = parse_util::take_blank(line);
    let line = parse_util::expect(b',', line)?;
    let line = parse_util::take_blank(line);
    let line = parse_util::expect(b'y', line)?;

    let line = read_assignment(line)?;
    let (Some(height), line) = parse_util::take_digits(line) else {
        return Err(RleHeaderLineError::NoHeight {
            got: String::from_utf8_lossy(line).to_string(),
        });
    };
    let height = parse_util::convert(height)?;

    if width > MAX_PATTERN_SIDE || height > MAX_PATTERN_SIDE {
        return Err(RleHeaderLineError::TooLarge { width, height });
    }

    let line = parse_util::take_blank(line);
    let set = match parse_util::take_1(line) {
        (None, _) => None,
        (Some(b','), line) => {
            let line = parse_util::take_blank(line);
            let line = parse_util::expect_slice(b"rule", line)?;
            let line = read_assignment(line)?;

            let (set, _) = rule_set::parse_rule(line)?;

            Some(set)
        }
        (Some(b), _) => return Err(RleHeaderLineError::InvalidToken { got: b as char }),
    };

    let line = RleHeaderLine { width, height, set };

    Ok((Some(line), rest))
}

/// Consumes the ` = ` between a header key and its value.
fn read_assignment(line: &[u8]) -> Result<&[u8], ParseError> {
    let line = parse_util::take_blank(line);
    let line = parse_util::expect(b'=', line)?;

    Ok(parse_util::take_blank(line))
}

#[derive(Debug, Error)]
pub enum RleEncodingError {
    #[error("Unexpected end of input, expected '!'")]
    UnexpectedEof,

    #[error("Failed to convert run length: {0}")]
    RunLength(#[from] ConvertError),

    #[error("Unrecognized byte: 0x{got:0X}")]
    UnrecognizedByte { got: u8 },

    #[error("Run of {run} cells overflows the pattern coordinates")]
    RunTooLong { run: usize },

    #[error("Live cell at ({row}, {col}) is outside the {width}x{height} pattern")]
    OutsideBox {
        row: usize,
        col: usize,
        width: usize,
        height: usize,
    },
}

/// Reads the run-length body. Every live cell must fall inside `(width, height)`.
fn read_encoding<F>(
    mut bytes: &[u8],
    (width, height): (usize, usize),
    mut f: F,
) -> Result<(), RleEncodingError>
where
    F: FnMut(usize, usize),
{
    let mut rep: usize = 1;

    let (mut row, mut col): (usize, usize) = (0, 0);

    loop {
        let Some(b) = parse_util::peek_1(bytes) else {
            return Err(RleEncodingError::UnexpectedEof);
        };

        match b {
            w if w.is_ascii_whitespace() => {
                bytes = parse_util::take_ws(bytes);
            }

            // End of pattern
            b'!' => break,

            // Dead cells
            b'b' => {
                let (_, rest) = parse_util::take_1(bytes);
                bytes = rest;

                col = col
                    .checked_add(rep)
                    .ok_or(RleEncodingError::RunTooLong { run: rep })?;
                rep = 1;
            }

            // Live cells
            b'o' => {
                let (_, rest) = parse_util::take_1(bytes);
                bytes = rest;

                let end = col
                    .checked_add(rep)
                    .ok_or(RleEncodingError::RunTooLong { run: rep })?;

                if rep > 0 && (row >= height || end > width) {
                    return Err(RleEncodingError::OutsideBox {
                        row,
                        col: end - 1,
                        width,
                        height,
                    });
                }

                for col in col..end {
                    f(row, col)
                }

                col = end;
                rep = 1;
            }

            // End of line
            b'$' => {
                let (_, rest) = parse_util::take_1(bytes);
                bytes = rest;

                row = row
                    .checked_add(rep)
                    .ok_or(RleEncodingError::RunTooLong { run: rep })?;
                col = 0;
                rep = 1;
            }

            n if n.is_ascii_digit() => {
                let (Some(n), rest) = parse_util::take_digits(bytes) else {
                    unreachable!("We peeked and found a digit")
                };
                bytes = rest;

                rep = parse_util::convert(n)?;
            }

            b => return Err(RleEncodingError::UnrecognizedByte { got: b }),
        }
    }

    Ok(())
}
