//! Count-min sketch with 4-bit counters, the frequency estimator of the TinyLFU admission.

const DEPTH: usize = 4;
const COUNTERS_PER_WORD: usize = 16;
const COUNTER_MAX: u64 = 0xf;
const RESET_MASK: u64 = 0x7777_7777_7777_7777;

#[derive(Debug, Clone)]
pub struct CountMinSketch {
    /// `DEPTH` rows of `width` saturating nibbles, packed into words
    table: Vec<u64>,
    width: usize,
    mask: u64,
}

impl CountMinSketch {
    /// The width is rounded up to a power of two, at least one counter per row.
    pub fn new(width: usize) -> Self {
        let width = width.max(1).next_power_of_two();
        let words = (DEPTH * width + COUNTERS_PER_WORD - 1) / COUNTERS_PER_WORD;
        CountMinSketch {
            table: vec![0; words],
            width,
            mask: (width - 1) as u64,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    fn position(&self, hash: u64, row: usize) -> (usize, u32) {
        let h1 = hash & 0xffff_ffff;
        let h2 = (hash >> 32) | 1;
        let col = h1.wrapping_add(h2.wrapping_mul(row as u64)) & self.mask;
        let idx = row * self.width + col as usize;
        (
            idx / COUNTERS_PER_WORD,
            ((idx % COUNTERS_PER_WORD) * 4) as u32,
        )
    }

    pub fn add(&mut self, hash: u64) {
        for row in 0..DEPTH {
            let (word, shift) = self.position(hash, row);
            if (self.table[word] >> shift) & COUNTER_MAX < COUNTER_MAX {
                self.table[word] += 1 << shift;
            }
        }
    }

    /// `estimate` returns the minimum counter among the rows.
    pub fn estimate(&self, hash: u64) -> u64 {
        (0..DEPTH)
            .map(|row| {
                let (word, shift) = self.position(hash, row);
                (self.table[word] >> shift) & COUNTER_MAX
            })
            .min()
            .unwrap_or(0)
    }

    /// `reset` halves every counter.
    pub fn reset(&mut self) {
        for word in self.table.iter_mut() {
            *word = (*word >> 1) & RESET_MASK;
        }
    }

    pub fn clear(&mut self) {
        for word in self.table.iter_mut() {
            *word = 0;
        }
    }
}
