use crate::universe::Universe;

/// Hex values of braille dots
///
/// ```text
///  1   8
///  2  10
///  4  20
/// 40  80
/// ```
///
/// Where the base blank pattern is codepoint `0x2800` (or U+2800)
///
/// To get other configurations, just add the numbers above.
const BRAILLE_EMPTY: u32 = 0x2800;

/// A terminal frame drawing each 2x4 block of cells as one braille character.
pub struct Braille {
    /// The cell buffer
    cb: Vec<bool>,

    /// The frame buffer.
    fb: String,

    /// Codepoints. This allows us to construct the framebuffer more easily
    cp: Vec<u32>,

    /// Width of the cell buffer
    w: usize,

    /// Height of the cell buffer
    h: usize,
}

impl Braille {
    /// A frame showing `w` by `h` cells.
    pub fn new(w: usize, h: usize) -> Self {
        // Let `w` and `h` refer to width and height of the cell buffer. Then `bw = ceil(w / 2)`
        // and `bh = ceil(h / 4)` are the width and height of braille characters of our framebuffer
        // (that is, not accounting for the trailing newlines expected at the end of each line).
        let (bw, bh) = (w.div_ceil(2), h.div_ceil(4));

        // Each braille character is 3 bytes, and newlines one byte.
        let fb = String::with_capacity(3 * (bw * bh) + bh);

        Self {
            cb: vec![false; w * h],
            fb,
            cp: vec![BRAILLE_EMPTY; bw * bh],
            w,
            h,
        }
    }

    /// Frame size that fits in a terminal of `cols` by `rows` characters.
    pub fn for_terminal(cols: u16, rows: u16) -> Self {
        Self::new(cols as usize * 2, rows as usize * 4)
    }

    pub fn width(&self) -> usize {
        self.w
    }

    pub fn height(&self) -> usize {
        self.h
    }

    /// Copy the cells of `universe` into the frame. Anything past the frame's edges is cropped.
    pub fn draw(&mut self, universe: &Universe) {
        self.cb.fill(false);

        let cols = self.w.min(universe.width() as usize);
        let rows = self.h.min(universe.height() as usize);
        let bytes = universe.cells();

        for y in 0..rows {
            for x in 0..cols {
                let n = y * universe.width() as usize + x;

                if bytes[n >> 3] & (1 << (n & 7)) != 0 {
                    let i = self.xy_from(x, y);
                    self.cb[i] = true;
                }
            }
        }
    }

    /// Build the frame from the cell buffer, one line per row of braille characters.
    pub fn render(&mut self) -> &str {
        let bw = self.w.div_ceil(2);

        // compute new codepoints
        self.cp.fill(BRAILLE_EMPTY);

        for (n, &px) in self.cb.iter().enumerate() {
            if px {
                let (x, y) = self.xy_to(n);
                self.cp[(y / 4) * bw + (x / 2)] += Self::get_hex_value(x, y);
            }
        }

        self.fb.clear();

        for (i, &c) in self.cp.iter().enumerate() {
            if i > 0 && i % bw == 0 {
                self.fb.push('\n');
            }

            // Every codepoint sits in U+2800..=U+28FF
            self.fb.push(char::from_u32(c).unwrap_or(' '));
        }
        self.fb.push('\n');

        &self.fb
    }

    fn xy_to(&self, n: usize) -> (usize, usize) {
        (n % self.w, n / self.w)
    }

    fn xy_from(&self, x: usize, y: usize) -> usize {
        y * self.w + x
    }

    fn get_hex_value(x: usize, y: usize) -> u32 {
        match (x % 2, y % 4) {
            (0, 0) => 0x1,
            (1, 0) => 0x8,
            (0, 1) => 0x2,
            (1, 1) => 0x10,
            (0, 2) => 0x4,
            (1, 2) => 0x20,
            (0, 3) => 0x40,
            (1, 3) => 0x80,
            _ => unreachable!(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Braille;
    use crate::universe::Universe;

    #[test]
    fn single_dots() {
        let mut universe = Universe::dead(4, 4).unwrap();
        universe.set_cells(&[(0, 0), (3, 3)]).unwrap();

        let mut frame = Braille::new(4, 4);
        frame.draw(&universe);

        assert_eq!(frame.render(), "\u{2801}\u{2880}\n");
    }

    #[test]
    fn crops_large_universe() {
        let mut universe = Universe::dead(8, 8).unwrap();
        universe.set_cells(&[(0, 1), (7, 7)]).unwrap();

        let mut frame = Braille::new(2, 4);
        frame.draw(&universe);

        assert_eq!(frame.render(), "\u{2808}\n");
    }

    #[test]
    fn terminal_size() {
        let frame = Braille::for_terminal(10, 5);

        assert_eq!((frame.width(), frame.height()), (20, 20));
    }
}
