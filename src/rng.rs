// src/rng.rs
//
// Random streams.
//
// Each stochastic component owns its stream instead of drawing from a
// process-wide generator, so independent runs can execute side by side
// without sharing randomness. Streams are ChaCha8 and are reproducible
// given a seed.

use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Stream type owned by environments and modifiers.
pub type SimRng = ChaCha8Rng;

/// Build a stream seeded from OS entropy (non-reproducible).
pub fn entropy_rng() -> SimRng {
    SimRng::from_entropy()
}

/// Build a reproducible stream.
pub fn seeded_rng(seed: u64) -> SimRng {
    SimRng::seed_from_u64(seed)
}

/// Derive the seed of the `index`-th sub-stream from a base seed.
///
/// Used when one `seed()` call has to fan out to several owned streams
/// (e.g. an environment and each of its modifiers).
pub fn derive_seed(base: u64, index: usize) -> u64 {
    base.wrapping_add((index as u64 + 1).wrapping_mul(0x9E37_79B9_7F4A_7C15))
}

/// A stream that replays a fixed script of raw words, cycling when exhausted.
///
/// `ScriptedRng::from_units(&[0.5])` makes `rng.gen::<f64>()` return exactly
/// `0.5`, which pins down threshold comparisons in tests and replays.
#[derive(Debug, Clone)]
pub struct ScriptedRng {
    words: Vec<u64>,
    cursor: usize,
}

impl ScriptedRng {
    /// Replay raw 64-bit words.
    pub fn from_words(words: Vec<u64>) -> Self {
        let words = if words.is_empty() { vec![0] } else { words };
        Self { words, cursor: 0 }
    }

    /// Replay unit-interval draws as seen through `Rng::gen::<f64>()`.
    ///
    /// Values are clamped into `[0, 1)`.
    pub fn from_units(units: &[f64]) -> Self {
        const MANTISSA: f64 = (1u64 << 53) as f64;
        let words = units
            .iter()
            .map(|u| {
                let scaled = (u.clamp(0.0, 1.0) * MANTISSA).min(MANTISSA - 1.0) as u64;
                scaled << 11
            })
            .collect();
        Self::from_words(words)
    }
}

impl RngCore for ScriptedRng {
    fn next_u32(&mut self) -> u32 {
        (self.next_u64() >> 32) as u32
    }

    fn next_u64(&mut self) -> u64 {
        let word = self.words[self.cursor];
        self.cursor = (self.cursor + 1) % self.words.len();
        word
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        for chunk in dest.chunks_mut(8) {
            let bytes = self.next_u64().to_le_bytes();
            chunk.copy_from_slice(&bytes[..chunk.len()]);
        }
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}
