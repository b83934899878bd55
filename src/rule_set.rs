use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::parse_util;

/// Rules of Conway's Game of Life.
pub const B3S23: RuleSet = RuleSet::new(0b1000, 0b1100);

/// An outer-totalistic rule over the Moore neighbourhood.
///
/// # Representation
/// Life rules are represented as
/// ```notrust
/// |------birth------|
/// 0000_0000_0000_0000_0000_0000_0000_0000
///                     |----survival-----|
/// ```
///
/// # Examples
/// ```notrust
/// b3s23:                0000_0000_0000_1000_0000_0000_0000_1100
///
/// b0s0:                 0000_0000_0000_0000_0000_0000_0000_0000
/// b012345678s012345678: 0000_0001_1111_1111_0000_0001_1111_1111
/// ```
///
/// See: https://conwaylife.com/wiki/Rulestring
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct RuleSet {
    rule: u32,
}

impl Default for RuleSet {
    fn default() -> Self {
        B3S23
    }
}

impl RuleSet {
    /// Create a new `RuleSet` for the given births and survivals. For both `b` and
    /// `s`, numbers are set on a bit basis. For instance if bit `i` in `b` is on, it
    /// means `i` is included in the set of births. Any bit past the 8th is ignored.
    pub const fn new(b: u16, s: u16) -> Self {
        let b = b & 0x1FF;
        let s = s & 0x1FF;

        Self {
            rule: (b as u32) << 16 | s as u32,
        }
    }

    pub const fn births(&self) -> u16 {
        ((self.rule & 0x1FF0000) >> 0x10) as u16
    }

    pub const fn survivals(&self) -> u16 {
        (self.rule & 0x1FF) as u16
    }

    /// State of a cell in the next generation, given its current state and how many of its eight
    /// neighbours are alive.
    #[inline]
    pub const fn next_state(&self, alive: bool, neighbors: u8) -> bool {
        let count = 1 << neighbors;

        if alive {
            self.survivals() & count != 0
        } else {
            self.births() & count != 0
        }
    }
}

impl fmt::Debug for RuleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RuleSet({self})")
    }
}

impl fmt::Display for RuleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn digits(f: &mut fmt::Formatter<'_>, mask: u16) -> fmt::Result {
            for n in (0..=8).filter(|n| mask & (1 << n) != 0) {
                write!(f, "{n}")?;
            }

            Ok(())
        }

        f.write_str("B")?;
        digits(f, self.births())?;
        f.write_str("/S")?;
        digits(f, self.survivals())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RuleError {
    #[error("Empty rule")]
    Empty,

    #[error("Expected 'B' or a digit, found '{got}'")]
    MissingBirths { got: char },

    #[error("Expected 'S' after the births")]
    MissingSurvivals,

    #[error("Neighbour count {got} is out of range 0..=8")]
    InvalidCount { got: u8 },

    #[error("Parse error: {0}")]
    ParseError(#[from] parse_util::ParseError),

    #[error("Unexpected trailing input \"{rest}\"")]
    TrailingInput { rest: String },
}

/// Parse a rule at the start of `bytes`, in either `B3/S23` or the older `23/3` notation.
pub(crate) fn parse_rule(bytes: &[u8]) -> Result<(RuleSet, &[u8]), RuleError> {
    match parse_util::peek_1(bytes) {
        None => Err(RuleError::Empty),
        Some(b'b' | b'B') => parse_named_rule(bytes),
        Some(b) if b.is_ascii_digit() || b == b'/' => parse_nameless_rule(bytes),
        Some(b) => Err(RuleError::MissingBirths { got: b as char }),
    }
}

// Parse rules that look like b3/s23. The slash is optional.
fn parse_named_rule(bytes: &[u8]) -> Result<(RuleSet, &[u8]), RuleError> {
    let (_, bytes) = parse_util::take_1(bytes);
    let (b, bytes) = parse_util::take_digits(bytes);

    let bytes = parse_util::expect(b'/', bytes).unwrap_or(bytes);

    let (Some(b's' | b'S'), bytes) = parse_util::take_1(bytes) else {
        return Err(RuleError::MissingSurvivals);
    };
    let (s, bytes) = parse_util::take_digits(bytes);

    let b = digits_to_mask(b.unwrap_or_default())?;
    let s = digits_to_mask(s.unwrap_or_default())?;

    Ok((RuleSet::new(b, s), bytes))
}

// Parse rules that look like 23/3, survivals first. These show up in RLE `#r` comment lines.
fn parse_nameless_rule(bytes: &[u8]) -> Result<(RuleSet, &[u8]), RuleError> {
    let (s, bytes) = parse_util::take_digits(bytes);
    let bytes = parse_util::expect(b'/', bytes)?;
    let (b, bytes) = parse_util::take_digits(bytes);

    let b = digits_to_mask(b.unwrap_or_default())?;
    let s = digits_to_mask(s.unwrap_or_default())?;

    Ok((RuleSet::new(b, s), bytes))
}

/// Convert the human readable birth/survival digits to a packed bit representation
fn digits_to_mask(bytes: &[u8]) -> Result<u16, RuleError> {
    let mut n = 0;

    for &b in bytes {
        let count = b - b'0';
        if count > 8 {
            return Err(RuleError::InvalidCount { got: count });
        }

        n |= 1 << count;
    }

    Ok(n)
}

impl FromStr for RuleSet {
    type Err = RuleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (rule, rest) = parse_rule(s.trim().as_bytes())?;

        if !rest.is_empty() {
            return Err(RuleError::TrailingInput {
                rest: String::from_utf8_lossy(rest).to_string(),
            });
        }

        Ok(rule)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conway_forms() {
        for s in ["B3/S23", "b3s23", "B3S23", "b3/s23", "23/3", " B3/S23\n"] {
            assert_eq!(s.parse::<RuleSet>(), Ok(B3S23), "{s:?}");
        }
    }

    #[test]
    fn highlife() {
        let rule: RuleSet = "B36/S23".parse().unwrap();

        assert_eq!(rule.births(), 0b100_1000);
        assert_eq!(rule.survivals(), 0b1100);
        assert_eq!(rule.to_string(), "B36/S23");
    }

    #[test]
    fn empty_sets() {
        let rule: RuleSet = "B/S".parse().unwrap();

        assert_eq!(rule, RuleSet::new(0, 0));
        assert_eq!(rule.to_string(), "B/S");
    }

    #[test]
    fn conway_transitions() {
        let table = [
            (true, 1, false),
            (true, 2, true),
            (true, 3, true),
            (true, 4, false),
            (false, 2, false),
            (false, 3, true),
            (false, 8, false),
        ];

        for (alive, n, next) in table {
            assert_eq!(B3S23.next_state(alive, n), next, "alive={alive} n={n}");
        }
    }

    #[test]
    fn rejects_bad_rules() {
        assert_eq!("".parse::<RuleSet>(), Err(RuleError::Empty));
        assert_eq!("B39/S23".parse::<RuleSet>(), Err(RuleError::InvalidCount { got: 9 }));
        assert_eq!("B3".parse::<RuleSet>(), Err(RuleError::MissingSurvivals));
        assert_eq!(
            "X3/S23".parse::<RuleSet>(),
            Err(RuleError::MissingBirths { got: 'X' })
        );
        assert!(matches!(
            "B3/S23x".parse::<RuleSet>(),
            Err(RuleError::TrailingInput { .. })
        ));
    }
}
