//! The simulation engine: a toroidal grid of cells, bit-packed one cell per bit.
//!
//! A [`Universe`] is owned by whatever drives it. The driver calls [`Universe::tick`] once per
//! step and reads [`Universe::cells`] to draw. Nothing in here knows how the cells end up on a
//! screen.

use std::fmt;

use thiserror::Error;
use tracing::debug;
use tracing::trace;
use tracing::warn;

use crate::bits::BitBuffer;
use crate::parse_rle;
use crate::parse_rle::RleError;
use crate::parse_rle::RleFile;
use crate::rule_set::RuleSet;

pub const DEFAULT_WIDTH: u32 = 64;
pub const DEFAULT_HEIGHT: u32 = 64;

/// Glyph used for a live cell by the [`fmt::Display`] impl.
pub const ALIVE_GLYPH: char = '◼';

/// Glyph used for a dead cell by the [`fmt::Display`] impl.
pub const DEAD_GLYPH: char = '◻';

#[derive(Debug, Error)]
pub enum UniverseError {
    #[error("Invalid dimensions {width}x{height}, both must be positive")]
    InvalidDimensions { width: u32, height: u32 },

    #[error("Cell ({row}, {col}) is outside of the {width}x{height} universe")]
    OutOfBounds {
        row: u32,
        col: u32,
        width: u32,
        height: u32,
    },

    #[error("Failed to read RLE pattern: {0}")]
    Rle(#[from] RleError),
}

#[derive(Clone, Debug)]
pub struct Universe {
    width: u32,
    height: u32,

    /// The current generation. Bit `n` is the cell at row `n / width`, column `n % width`.
    cells: BitBuffer,

    /// Scratch buffer the next generation is written into before being swapped with `cells`.
    next: BitBuffer,

    rules: RuleSet,

    /// Ticks since construction or the last resize.
    generation: u64,
}

impl Default for Universe {
    /// A [`DEFAULT_WIDTH`] by [`DEFAULT_HEIGHT`] universe with the usual seed pattern.
    fn default() -> Self {
        Self::from_cells(
            DEFAULT_WIDTH,
            DEFAULT_HEIGHT,
            RuleSet::default(),
            seed_pattern(DEFAULT_WIDTH as usize * DEFAULT_HEIGHT as usize),
        )
    }
}

impl Universe {
    /// Create a universe of the given dimensions, following Conway's rules.
    ///
    /// The initial pattern is deterministic: cell `n` is alive if and only if `n` is divisible by
    /// 2 or by 7.
    ///
    /// # Errors
    /// [`UniverseError::InvalidDimensions`] if either dimension is zero.
    pub fn new(width: u32, height: u32) -> Result<Self, UniverseError> {
        Self::with_rules(width, height, RuleSet::default())
    }

    /// Like [`Universe::new`], evolving under `rules` instead of Conway's.
    pub fn with_rules(width: u32, height: u32, rules: RuleSet) -> Result<Self, UniverseError> {
        check_dimensions(width, height)?;

        let cells = seed_pattern(width as usize * height as usize);

        Ok(Self::from_cells(width, height, rules, cells))
    }

    /// Create a universe where every cell is dead.
    pub fn dead(width: u32, height: u32) -> Result<Self, UniverseError> {
        check_dimensions(width, height)?;

        let cells = BitBuffer::zeroed(width as usize * height as usize);

        Ok(Self::from_cells(width, height, RuleSet::default(), cells))
    }

    fn from_cells(width: u32, height: u32, rules: RuleSet, cells: BitBuffer) -> Self {
        debug!(width, height, %rules, "creating universe");

        let next = BitBuffer::zeroed(cells.len());

        Self {
            width,
            height,
            cells,
            next,
            rules,
            generation: 0,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Total number of cells.
    pub fn area(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// The bit-packed cells, `ceil(width * height / 8)` bytes.
    ///
    /// Bit `n` (LSB-first within each byte) is set if and only if cell `n` is alive, where cells
    /// are numbered in row-major order. The view borrows the universe, so it has to be consumed
    /// before the next mutation.
    pub fn cells(&self) -> &[u8] {
        self.cells.as_bytes()
    }

    /// Whether the cell at (`row`, `col`) is alive.
    pub fn cell(&self, row: u32, col: u32) -> Result<bool, UniverseError> {
        let i = self.index(row, col)?;

        Ok(self.cells.get(i))
    }

    /// Number of live cells.
    pub fn population(&self) -> usize {
        self.cells.count_ones()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn rules(&self) -> RuleSet {
        self.rules
    }

    pub fn set_rules(&mut self, rules: RuleSet) {
        self.rules = rules;
    }

    /// Change the width. Any change clears every cell.
    ///
    /// # Errors
    /// [`UniverseError::InvalidDimensions`] if `width` is zero, in which case nothing changes.
    pub fn set_width(&mut self, width: u32) -> Result<(), UniverseError> {
        check_dimensions(width, self.height)?;

        if width != self.width {
            self.resize(width, self.height);
        }

        Ok(())
    }

    /// Change the height. Any change clears every cell.
    ///
    /// # Errors
    /// [`UniverseError::InvalidDimensions`] if `height` is zero, in which case nothing changes.
    pub fn set_height(&mut self, height: u32) -> Result<(), UniverseError> {
        check_dimensions(self.width, height)?;

        if height != self.height {
            self.resize(self.width, height);
        }

        Ok(())
    }

    fn resize(&mut self, width: u32, height: u32) {
        debug!(
            from_width = self.width,
            from_height = self.height,
            width,
            height,
            "resizing universe"
        );

        self.width = width;
        self.height = height;
        self.cells.resize_cleared(self.area());
        self.next.resize_cleared(self.area());
        self.generation = 0;
    }

    /// Flip the cell at (`row`, `col`) between alive and dead.
    pub fn toggle_cell(&mut self, row: u32, col: u32) -> Result<(), UniverseError> {
        let i = self.index(row, col)?;
        self.cells.toggle(i);

        Ok(())
    }

    /// Bring every listed (`row`, `col`) cell to life.
    ///
    /// All coordinates are checked before any cell is touched, so on error the universe is left
    /// as it was.
    pub fn set_cells(&mut self, cells: &[(u32, u32)]) -> Result<(), UniverseError> {
        let indices = cells
            .iter()
            .map(|&(row, col)| self.index(row, col))
            .collect::<Result<Vec<_>, _>>()?;

        for i in indices {
            self.cells.set(i, true);
        }

        Ok(())
    }

    /// Kill every cell.
    pub fn clear(&mut self) {
        self.cells.clear();
    }

    /// Replace the contents of the universe with an RLE pattern, centred.
    ///
    /// Patterns larger than the universe wrap around its edges, and no pattern may span more than
    /// [`parse_rle::MAX_PATTERN_SIDE`] cells a side. When the file names a rule, the
    /// universe switches to it. A pattern that fails to parse leaves the universe untouched.
    pub fn load_rle<'a>(&mut self, bytes: &'a [u8]) -> Result<RleFile<'a>, UniverseError> {
        let (width, height) = (self.width as usize, self.height as usize);

        // Cells land wrapped into a scratch grid first, then get shifted into place once the
        // pattern's size is known
        let mut pattern = BitBuffer::zeroed(self.area());
        let mut extent = (0, 0);
        let file = parse_rle::read_rle(bytes, |row, col| {
            extent = (extent.0.max(col + 1), extent.1.max(row + 1));
            pattern.set((row % height) * width + col % width, true);
        })?;

        let (pattern_width, pattern_height) = file.size.unwrap_or(extent);

        if pattern_width > width || pattern_height > height {
            warn!(
                pattern_width,
                pattern_height,
                width = self.width,
                height = self.height,
                "pattern is larger than the universe, wrapping"
            );
        }

        // Both sides are at most `MAX_PATTERN_SIDE`, the universe's at most `u32::MAX`
        let down = ((height as i64 - pattern_height as i64) / 2).rem_euclid(height as i64);
        let right = ((width as i64 - pattern_width as i64) / 2).rem_euclid(width as i64);

        self.cells.clear();
        for n in (0..pattern.len()).filter(|&n| pattern.get(n)) {
            let row = (n / width + down as usize) % height;
            let col = (n % width + right as usize) % width;

            self.cells.set(row * width + col, true);
        }

        if let Some(rules) = file.rules {
            self.rules = rules;
        }
        self.generation = 0;

        debug!(name = ?file.name, population = self.population(), "loaded RLE pattern");

        Ok(file)
    }

    /// Advance the universe by one generation.
    ///
    /// The next generation is computed from the current one in full before anything becomes
    /// visible, so no cell ever sees a neighbour that has already been updated this tick.
    pub fn tick(&mut self) {
        let width = self.width as usize;

        for row in 0..self.height {
            for col in 0..self.width {
                let i = row as usize * width + col as usize;

                let alive = self.cells.get(i);
                let neighbors = self.live_neighbor_count(row, col);
                let next = self.rules.next_state(alive, neighbors);

                self.next.set(i, next);
            }
        }

        std::mem::swap(&mut self.cells, &mut self.next);
        self.generation += 1;

        trace!(
            generation = self.generation,
            population = self.population(),
            "tick"
        );
    }

    /// Counts the live cells among the eight neighbours of (`row`, `col`), wrapping around the
    /// edges of the universe.
    ///
    /// On a universe one cell wide (or tall) the wrapped neighbours are the cell's own column
    /// (or row), and they are counted as such.
    fn live_neighbor_count(&self, row: u32, col: u32) -> u8 {
        let north = if row == 0 { self.height - 1 } else { row - 1 };
        let south = if row == self.height - 1 { 0 } else { row + 1 };
        let west = if col == 0 { self.width - 1 } else { col - 1 };
        let east = if col == self.width - 1 { 0 } else { col + 1 };

        let neighbors = [
            (north, west),
            (north, col),
            (north, east),
            (row, west),
            (row, east),
            (south, west),
            (south, col),
            (south, east),
        ];

        neighbors
            .into_iter()
            .map(|(row, col)| self.cells.get(self.index_unchecked(row, col)) as u8)
            .sum()
    }

    fn index(&self, row: u32, col: u32) -> Result<usize, UniverseError> {
        if row >= self.height || col >= self.width {
            return Err(UniverseError::OutOfBounds {
                row,
                col,
                width: self.width,
                height: self.height,
            });
        }

        Ok(self.index_unchecked(row, col))
    }

    #[inline]
    fn index_unchecked(&self, row: u32, col: u32) -> usize {
        row as usize * self.width as usize + col as usize
    }
}

impl fmt::Display for Universe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in 0..self.height {
            for col in 0..self.width {
                let glyph = if self.cells.get(self.index_unchecked(row, col)) {
                    ALIVE_GLYPH
                } else {
                    DEAD_GLYPH
                };

                write!(f, "{glyph}")?;
            }

            writeln!(f)?;
        }

        Ok(())
    }
}

fn check_dimensions(width: u32, height: u32) -> Result<(), UniverseError> {
    if width == 0 || height == 0 {
        return Err(UniverseError::InvalidDimensions { width, height });
    }

    Ok(())
}

/// The default seed: cell `n` is alive if and only if `n` is divisible by 2 or by 7.
fn seed_pattern(area: usize) -> BitBuffer {
    let mut cells = BitBuffer::zeroed(area);

    for n in 0..area {
        cells.set(n, n % 2 == 0 || n % 7 == 0);
    }

    cells
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_bytes() {
        // cells 0..8: alive at 0, 2, 4, 6, 7
        // cells 8..16: alive at 8, 10, 12, 14
        let universe = Universe::new(4, 4).unwrap();

        assert_eq!(universe.cells(), &[0b1101_0101, 0b0101_0101]);
    }

    #[test]
    fn trailing_bits_stay_clear() {
        let mut universe = Universe::dead(3, 3).unwrap();
        universe.set_cells(&[(2, 2)]).unwrap();

        assert_eq!(universe.cells(), &[0, 0b1]);
    }

    #[test]
    fn corner_neighbors() {
        let mut universe = Universe::dead(4, 4).unwrap();
        universe.set_cells(&[(3, 3), (3, 0), (0, 3)]).unwrap();

        assert_eq!(universe.live_neighbor_count(0, 0), 3);
        assert_eq!(universe.live_neighbor_count(3, 3), 2);
        assert_eq!(universe.live_neighbor_count(1, 1), 0);
    }

    #[test]
    fn index_is_row_major() {
        let universe = Universe::dead(5, 2).unwrap();

        assert_eq!(universe.index(1, 3).unwrap(), 8);
    }

    #[test]
    fn default_is_seeded() {
        let universe = Universe::default();

        assert_eq!((universe.width(), universe.height()), (64, 64));
        assert_eq!(universe.cells(), Universe::new(64, 64).unwrap().cells());
    }
}
