/// A fixed length run of bits, packed LSB-first into bytes.
///
/// Bit `n` lives in byte `n / 8`, at position `n % 8`:
/// ```notrust
///  byte 0             byte 1
///  7654_3210          fedc_ba98
/// ```
///
/// Bits past `len` in the last byte are kept at zero, so the byte view can be handed to a
/// renderer as-is.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BitBuffer {
    bytes: Vec<u8>,
    len: usize,
}

impl BitBuffer {
    /// A buffer of `len` bits, all unset.
    pub fn zeroed(len: usize) -> Self {
        Self {
            bytes: vec![0; len.div_ceil(8)],
            len,
        }
    }

    /// Number of bits in the buffer.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// # Panics
    /// If `n >= self.len()`.
    #[inline]
    pub fn get(&self, n: usize) -> bool {
        assert!(n < self.len, "bit {n} is out of bounds");

        self.bytes[n >> 3] & Self::mask(n) != 0
    }

    /// # Panics
    /// If `n >= self.len()`.
    #[inline]
    pub fn set(&mut self, n: usize, value: bool) {
        assert!(n < self.len, "bit {n} is out of bounds");

        if value {
            self.bytes[n >> 3] |= Self::mask(n);
        } else {
            self.bytes[n >> 3] &= !Self::mask(n);
        }
    }

    /// # Panics
    /// If `n >= self.len()`.
    #[inline]
    pub fn toggle(&mut self, n: usize) {
        assert!(n < self.len, "bit {n} is out of bounds");

        self.bytes[n >> 3] ^= Self::mask(n);
    }

    /// Unset every bit.
    pub fn clear(&mut self) {
        self.bytes.fill(0);
    }

    /// Change the length to `len` bits and unset every bit.
    pub fn resize_cleared(&mut self, len: usize) {
        self.bytes.clear();
        self.bytes.resize(len.div_ceil(8), 0);
        self.len = len;
    }

    pub fn count_ones(&self) -> usize {
        self.bytes.iter().map(|b| b.count_ones() as usize).sum()
    }

    /// The packed bytes, exactly `ceil(len / 8)` of them.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    #[inline]
    const fn mask(n: usize) -> u8 {
        1 << (n & 7)
    }
}

#[cfg(test)]
mod tests {
    use super::BitBuffer;

    #[test]
    fn lsb_first() {
        let mut bits = BitBuffer::zeroed(12);
        bits.set(0, true);
        bits.set(9, true);

        assert_eq!(bits.as_bytes(), &[0b0000_0001, 0b0000_0010]);
    }

    #[test]
    fn toggle_twice() {
        let mut bits = BitBuffer::zeroed(3);
        bits.toggle(2);
        assert!(bits.get(2));

        bits.toggle(2);
        assert!(!bits.get(2));
        assert_eq!(bits.count_ones(), 0);
    }

    #[test]
    fn resize_clears() {
        let mut bits = BitBuffer::zeroed(8);
        bits.set(3, true);
        bits.resize_cleared(17);

        assert_eq!(bits.len(), 17);
        assert_eq!(bits.as_bytes(), &[0, 0, 0]);
    }

    #[test]
    #[should_panic]
    fn get_past_len() {
        BitBuffer::zeroed(9).get(9);
    }
}
