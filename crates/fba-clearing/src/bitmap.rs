//! Sparse tick bitmap: one bit per active tick.
//!
//! A tick's bit lives at word position `tick >> 8` (upper 16 bits,
//! arithmetic shift so negative ticks land in negative words) and bit
//! position `tick & 0xFF`. Words are 256 bits wide; only non-zero words
//! are stored, so scans over a batch touch set bits only.
//!
//! Bit searches inside a word are constant-time `trailing_zeros` /
//! `leading_zeros` on the four limbs.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A 256-bit word as four little-endian `u64` limbs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Word256([u64; 4]);

impl Word256 {
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0 == [0; 4]
    }

    #[must_use]
    pub fn bit(&self, pos: u8) -> bool {
        let (limb, offset) = (usize::from(pos) / 64, u32::from(pos) % 64);
        self.0[limb] >> offset & 1 == 1
    }

    pub fn set_bit(&mut self, pos: u8) {
        let (limb, offset) = (usize::from(pos) / 64, u32::from(pos) % 64);
        self.0[limb] |= 1 << offset;
    }

    pub fn clear_bit(&mut self, pos: u8) {
        let (limb, offset) = (usize::from(pos) / 64, u32::from(pos) % 64);
        self.0[limb] &= !(1 << offset);
    }

    /// Least-significant set bit at or above `pos`.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn lsb_from(&self, pos: u8) -> Option<u8> {
        let (start_limb, offset) = (usize::from(pos) / 64, u32::from(pos) % 64);
        for limb in start_limb..4 {
            let mut word = self.0[limb];
            if limb == start_limb {
                // Mask out bits strictly below `pos`.
                word &= u64::MAX << offset;
            }
            if word != 0 {
                return Some((limb as u8) * 64 + word.trailing_zeros() as u8);
            }
        }
        None
    }

    /// Most-significant set bit at or below `pos`.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn msb_to(&self, pos: u8) -> Option<u8> {
        let (start_limb, offset) = (usize::from(pos) / 64, u32::from(pos) % 64);
        for limb in (0..=start_limb).rev() {
            let mut word = self.0[limb];
            if limb == start_limb && offset < 63 {
                // Mask out bits strictly above `pos`.
                word &= (1u64 << (offset + 1)) - 1;
            }
            if word != 0 {
                return Some((limb as u8) * 64 + 63 - word.leading_zeros() as u8);
            }
        }
        None
    }
}

/// Word and bit position of a tick.
#[allow(clippy::cast_possible_truncation)]
fn position(tick: i32) -> (i16, u8) {
    ((tick >> 8) as i16, (tick & 0xFF) as u8)
}

fn tick_at(word_pos: i16, bit_pos: u8) -> i32 {
    (i32::from(word_pos) << 8) + i32::from(bit_pos)
}

/// Sparse bitset over the 24-bit signed tick range of one batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickBitmap {
    words: BTreeMap<i16, Word256>,
}

impl TickBitmap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `tick` active.
    pub fn set(&mut self, tick: i32) {
        let (word_pos, bit_pos) = position(tick);
        self.words.entry(word_pos).or_default().set_bit(bit_pos);
    }

    /// Mark `tick` inactive; drops the word when it empties.
    pub fn clear(&mut self, tick: i32) {
        let (word_pos, bit_pos) = position(tick);
        if let Some(word) = self.words.get_mut(&word_pos) {
            word.clear_bit(bit_pos);
            if word.is_zero() {
                self.words.remove(&word_pos);
            }
        }
    }

    #[must_use]
    pub fn is_set(&self, tick: i32) -> bool {
        let (word_pos, bit_pos) = position(tick);
        self.words.get(&word_pos).is_some_and(|w| w.bit(bit_pos))
    }

    /// The lowest active tick in `[from, to]`, scanning upward.
    #[must_use]
    pub fn next_active(&self, from: i32, to: i32) -> Option<i32> {
        if from > to {
            return None;
        }
        let (from_word, from_bit) = position(from);
        let (to_word, _) = position(to);
        for (&word_pos, word) in self.words.range(from_word..=to_word) {
            let start_bit = if word_pos == from_word { from_bit } else { 0 };
            if let Some(bit_pos) = word.lsb_from(start_bit) {
                let tick = tick_at(word_pos, bit_pos);
                return (tick <= to).then_some(tick);
            }
        }
        None
    }

    /// The highest active tick in `[to, from]`, scanning downward.
    #[must_use]
    pub fn prev_active(&self, from: i32, to: i32) -> Option<i32> {
        if from < to {
            return None;
        }
        let (from_word, from_bit) = position(from);
        let (to_word, _) = position(to);
        for (&word_pos, word) in self.words.range(to_word..=from_word).rev() {
            let start_bit = if word_pos == from_word { from_bit } else { 255 };
            if let Some(bit_pos) = word.msb_to(start_bit) {
                let tick = tick_at(word_pos, bit_pos);
                return (tick >= to).then_some(tick);
            }
        }
        None
    }

    /// Number of stored (non-zero) words.
    #[must_use]
    pub fn word_count(&self) -> usize {
        self.words.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use fba_types::constants::{MAX_TICK, MIN_TICK};

    use super::*;

    #[test]
    fn word256_set_clear_bit() {
        let mut word = Word256::default();
        assert!(word.is_zero());

        word.set_bit(0);
        word.set_bit(63);
        word.set_bit(64);
        word.set_bit(255);
        assert!(word.bit(0));
        assert!(word.bit(63));
        assert!(word.bit(64));
        assert!(word.bit(255));
        assert!(!word.bit(1));

        word.clear_bit(63);
        assert!(!word.bit(63));
        assert!(!word.is_zero());
    }

    #[test]
    fn word256_lsb_from_masks_below() {
        let mut word = Word256::default();
        word.set_bit(10);
        word.set_bit(200);
        assert_eq!(word.lsb_from(0), Some(10));
        assert_eq!(word.lsb_from(10), Some(10));
        assert_eq!(word.lsb_from(11), Some(200));
        assert_eq!(word.lsb_from(201), None);
    }

    #[test]
    fn word256_msb_to_masks_above() {
        let mut word = Word256::default();
        word.set_bit(10);
        word.set_bit(200);
        assert_eq!(word.msb_to(255), Some(200));
        assert_eq!(word.msb_to(200), Some(200));
        assert_eq!(word.msb_to(199), Some(10));
        assert_eq!(word.msb_to(9), None);
    }

    #[test]
    fn set_is_set_clear() {
        let mut bitmap = TickBitmap::new();
        for tick in [MIN_TICK, -257, -1, 0, 900, MAX_TICK] {
            assert!(!bitmap.is_set(tick));
            bitmap.set(tick);
            assert!(bitmap.is_set(tick));
        }
        bitmap.clear(900);
        assert!(!bitmap.is_set(900));
        assert!(bitmap.is_set(MIN_TICK));
    }

    #[test]
    fn clear_drops_empty_words() {
        let mut bitmap = TickBitmap::new();
        bitmap.set(900);
        bitmap.set(901);
        assert_eq!(bitmap.word_count(), 1);
        bitmap.clear(900);
        assert_eq!(bitmap.word_count(), 1);
        bitmap.clear(901);
        assert!(bitmap.is_empty());
    }

    #[test]
    fn negative_ticks_map_to_negative_words() {
        let mut bitmap = TickBitmap::new();
        bitmap.set(-1);
        bitmap.set(-256);
        assert!(bitmap.is_set(-1));
        assert!(bitmap.is_set(-256));
        assert!(!bitmap.is_set(-2));
        // -1 and -256 share word -1 (bits 255 and 0).
        assert_eq!(bitmap.word_count(), 1);
    }

    #[test]
    fn next_active_within_word() {
        let mut bitmap = TickBitmap::new();
        bitmap.set(900);
        bitmap.set(950);
        assert_eq!(bitmap.next_active(MIN_TICK, MAX_TICK), Some(900));
        assert_eq!(bitmap.next_active(900, MAX_TICK), Some(900));
        assert_eq!(bitmap.next_active(901, MAX_TICK), Some(950));
        assert_eq!(bitmap.next_active(951, MAX_TICK), None);
    }

    #[test]
    fn next_active_across_words() {
        let mut bitmap = TickBitmap::new();
        bitmap.set(-300);
        bitmap.set(5000);
        assert_eq!(bitmap.next_active(MIN_TICK, MAX_TICK), Some(-300));
        assert_eq!(bitmap.next_active(-299, MAX_TICK), Some(5000));
    }

    #[test]
    fn next_active_respects_to_bound() {
        let mut bitmap = TickBitmap::new();
        bitmap.set(5000);
        assert_eq!(bitmap.next_active(0, 4999), None);
        assert_eq!(bitmap.next_active(0, 5000), Some(5000));
    }

    #[test]
    fn prev_active_within_word() {
        let mut bitmap = TickBitmap::new();
        bitmap.set(900);
        bitmap.set(950);
        assert_eq!(bitmap.prev_active(MAX_TICK, MIN_TICK), Some(950));
        assert_eq!(bitmap.prev_active(950, MIN_TICK), Some(950));
        assert_eq!(bitmap.prev_active(949, MIN_TICK), Some(900));
        assert_eq!(bitmap.prev_active(899, MIN_TICK), None);
    }

    #[test]
    fn prev_active_across_words_and_bound() {
        let mut bitmap = TickBitmap::new();
        bitmap.set(-300);
        bitmap.set(5000);
        assert_eq!(bitmap.prev_active(MAX_TICK, MIN_TICK), Some(5000));
        assert_eq!(bitmap.prev_active(4999, MIN_TICK), Some(-300));
        assert_eq!(bitmap.prev_active(4999, -299), None);
    }

    #[test]
    fn inverted_ranges_find_nothing() {
        let mut bitmap = TickBitmap::new();
        bitmap.set(0);
        assert_eq!(bitmap.next_active(10, 5), None);
        assert_eq!(bitmap.prev_active(5, 10), None);
    }

    #[test]
    fn extreme_ticks_roundtrip() {
        let mut bitmap = TickBitmap::new();
        bitmap.set(MIN_TICK);
        bitmap.set(MAX_TICK);
        assert_eq!(bitmap.next_active(MIN_TICK, MAX_TICK), Some(MIN_TICK));
        assert_eq!(bitmap.prev_active(MAX_TICK, MIN_TICK), Some(MAX_TICK));
        assert_eq!(bitmap.next_active(MIN_TICK + 1, MAX_TICK), Some(MAX_TICK));
        assert_eq!(bitmap.prev_active(MAX_TICK - 1, MIN_TICK), Some(MIN_TICK));
    }

    #[test]
    fn random_ops_agree_with_set_model() {
        use rand::{Rng, SeedableRng, rngs::StdRng};

        let mut rng = StdRng::seed_from_u64(0xF8A);
        let mut bitmap = TickBitmap::new();
        let mut model = std::collections::BTreeSet::new();

        for _ in 0..2_000 {
            let tick = rng.gen_range(-5_000..5_000);
            if rng.gen_bool(0.6) {
                bitmap.set(tick);
                model.insert(tick);
            } else {
                bitmap.clear(tick);
                model.remove(&tick);
            }
        }

        for _ in 0..200 {
            let from = rng.gen_range(-6_000..6_000);
            let to = rng.gen_range(from..7_000);
            let expected = model.range(from..=to).next().copied();
            assert_eq!(bitmap.next_active(from, to), expected);

            let expected = model.range(to..=from.max(to)).next_back().copied();
            let got = bitmap.prev_active(from.max(to), to);
            assert_eq!(got, expected);
        }
    }

    #[test]
    fn bitmap_serde_roundtrip() {
        let mut bitmap = TickBitmap::new();
        bitmap.set(-300);
        bitmap.set(900);
        let json = serde_json::to_string(&bitmap).unwrap();
        let back: TickBitmap = serde_json::from_str(&json).unwrap();
        assert_eq!(bitmap, back);
    }

    #[test]
    fn dense_range_scan_order() {
        let mut bitmap = TickBitmap::new();
        let ticks = [-1000, -999, -500, 0, 1, 255, 256, 257, 77777];
        for &tick in &ticks {
            bitmap.set(tick);
        }
        let mut found = Vec::new();
        let mut from = MIN_TICK;
        while let Some(tick) = bitmap.next_active(from, MAX_TICK) {
            found.push(tick);
            if tick == MAX_TICK {
                break;
            }
            from = tick + 1;
        }
        assert_eq!(found, ticks);
    }
}
