//! Doorkeeper is a bloom filter in front of the count-min sketch,
//! a key only reaches the sketch after the doorkeeper has seen it once.

const MIN_BITS: f64 = 1024.0;
const MIN_HASHES: u32 = 2;
const MAX_HASHES: u32 = 16;

#[derive(Debug, Clone)]
pub struct Doorkeeper {
    bits: Vec<u64>,
    mask: u64,
    hashes: u32,
}

impl Doorkeeper {
    /// `new` sizes the filter for `insertions` keys at the `false_positive_rate`.
    pub fn new(insertions: usize, false_positive_rate: f64) -> Self {
        let n = insertions.max(1) as f64;
        let p = if false_positive_rate <= 0.0 || false_positive_rate >= 1.0 {
            0.01
        } else {
            false_positive_rate
        };
        let ln2 = std::f64::consts::LN_2;
        let m = (n * -p.ln() / (ln2 * ln2)).max(MIN_BITS).ceil() as usize;
        let m = m.next_power_of_two();
        let hashes = ((m as f64 / n) * ln2).round() as u32;
        Doorkeeper {
            bits: vec![0; (m + 63) / 64],
            mask: (m - 1) as u64,
            hashes: hashes.max(MIN_HASHES).min(MAX_HASHES),
        }
    }

    pub fn bits(&self) -> usize {
        (self.mask + 1) as usize
    }

    pub fn hashes(&self) -> u32 {
        self.hashes
    }

    #[inline]
    fn locate(&self, hash: u64, i: u32) -> (usize, u64) {
        let h1 = hash & 0xffff_ffff;
        let h2 = (hash >> 32) | 1;
        let bit = h1.wrapping_add(h2.wrapping_mul(i as u64)) & self.mask;
        ((bit >> 6) as usize, 1 << (bit & 63))
    }

    /// `put` records the hash, it returns true if the hash may have been recorded before.
    pub fn put(&mut self, hash: u64) -> bool {
        let mut existed = true;
        for i in 0..self.hashes {
            let (word, bit) = self.locate(hash, i);
            if self.bits[word] & bit == 0 {
                existed = false;
                self.bits[word] |= bit;
            }
        }
        existed
    }

    pub fn contains(&self, hash: u64) -> bool {
        (0..self.hashes).all(|i| {
            let (word, bit) = self.locate(hash, i);
            self.bits[word] & bit != 0
        })
    }

    pub fn reset(&mut self) {
        for word in self.bits.iter_mut() {
            *word = 0;
        }
    }
}
