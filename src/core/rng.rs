//! Seeded randomness for dealing and agent tie-breaks.
//!
//! ```
//! use bazaar_arena::core::GameRng;
//!
//! let mut deck: Vec<u8> = (0..52).collect();
//! GameRng::new(42).shuffle(&mut deck);
//!
//! let mut again: Vec<u8> = (0..52).collect();
//! GameRng::new(42).shuffle(&mut again);
//! assert_eq!(deck, again);
//! ```

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use super::seat::Seat;

/// Deterministic RNG. The same seed deals the same match.
#[derive(Clone, Debug)]
pub struct GameRng {
    inner: ChaCha8Rng,
    seed: u64,
}

impl GameRng {
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            inner: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }

    /// The seed this RNG was created from.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Shuffle a slice in place.
    pub fn shuffle<T>(&mut self, slice: &mut [T]) {
        slice.shuffle(&mut self.inner);
    }

    /// Uniform pick from a slice, `None` if empty.
    #[must_use]
    pub fn choose<'a, T>(&mut self, slice: &'a [T]) -> Option<&'a T> {
        slice.choose(&mut self.inner)
    }

    /// Coin flip between the two seats.
    pub fn pick_seat(&mut self) -> Seat {
        if self.inner.gen_bool(0.5) {
            Seat::First
        } else {
            Seat::Second
        }
    }
}
