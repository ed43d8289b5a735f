//! Seat identification and per-seat data storage.
//!
//! ## Seat
//!
//! A match always has exactly two seats. `Seat::First` is the first entry
//! of the roster and is always visited first when per-turn bookkeeping
//! runs for both participants.
//!
//! ## SeatMap
//!
//! Fixed two-slot storage indexed by `Seat`. Iteration always yields
//! seats in roster order.

use serde::{Deserialize, Serialize};
use std::ops::{Index, IndexMut};

/// A roster position in a two-party match.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Seat {
    First,
    Second,
}

impl Seat {
    /// Both seats in roster order.
    pub const ALL: [Seat; 2] = [Seat::First, Seat::Second];

    /// Get the raw seat index (0-based).
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Seat::First => 0,
            Seat::Second => 1,
        }
    }

    /// Build a seat from a 0-based index.
    #[must_use]
    pub const fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Seat::First),
            1 => Some(Seat::Second),
            _ => None,
        }
    }

    /// The opposing seat.
    #[must_use]
    pub const fn other(self) -> Self {
        match self {
            Seat::First => Seat::Second,
            Seat::Second => Seat::First,
        }
    }

    /// Iterate over both seats in roster order.
    ///
    /// ```
    /// use bazaar_arena::core::Seat;
    ///
    /// let seats: Vec<_> = Seat::all().collect();
    /// assert_eq!(seats, vec![Seat::First, Seat::Second]);
    /// ```
    pub fn all() -> impl Iterator<Item = Seat> {
        Self::ALL.into_iter()
    }
}

impl std::fmt::Display for Seat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Seat {}", self.index() + 1)
    }
}

/// Per-seat data storage with O(1) access.
///
/// ## Example
///
/// ```
/// use bazaar_arena::core::{Seat, SeatMap};
///
/// let mut score: SeatMap<i32> = SeatMap::with_value(0);
/// score[Seat::Second] += 5;
///
/// assert_eq!(score[Seat::First], 0);
/// assert_eq!(score[Seat::Second], 5);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SeatMap<T> {
    data: [T; 2],
}

impl<T> SeatMap<T> {
    /// Create a SeatMap with values from a factory function.
    ///
    /// The factory is called in roster order.
    pub fn new(mut factory: impl FnMut(Seat) -> T) -> Self {
        let first = factory(Seat::First);
        let second = factory(Seat::Second);
        Self {
            data: [first, second],
        }
    }

    /// Create a SeatMap from two explicit values.
    pub fn from_pair(first: T, second: T) -> Self {
        Self {
            data: [first, second],
        }
    }

    /// Create a SeatMap with both entries set to the same value.
    pub fn with_value(value: T) -> Self
    where
        T: Clone,
    {
        Self::new(|_| value.clone())
    }

    /// Create a SeatMap with default values.
    pub fn with_default() -> Self
    where
        T: Default,
    {
        Self::new(|_| T::default())
    }

    /// Get a reference to a seat's data.
    #[must_use]
    pub fn get(&self, seat: Seat) -> &T {
        &self.data[seat.index()]
    }

    /// Get a mutable reference to a seat's data.
    pub fn get_mut(&mut self, seat: Seat) -> &mut T {
        &mut self.data[seat.index()]
    }

    /// Iterate over (Seat, &T) pairs in roster order.
    pub fn iter(&self) -> impl Iterator<Item = (Seat, &T)> {
        Seat::ALL.into_iter().zip(self.data.iter())
    }

    /// Iterate over (Seat, &mut T) pairs in roster order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (Seat, &mut T)> {
        Seat::ALL.into_iter().zip(self.data.iter_mut())
    }

    /// Find the first seat whose value matches the predicate.
    pub fn find(&self, mut predicate: impl FnMut(&T) -> bool) -> Option<Seat> {
        self.iter().find(|(_, v)| predicate(v)).map(|(s, _)| s)
    }

    /// Map both values into a new SeatMap.
    pub fn map<U>(&self, mut f: impl FnMut(Seat, &T) -> U) -> SeatMap<U> {
        SeatMap::new(|seat| f(seat, self.get(seat)))
    }
}

impl<T> Index<Seat> for SeatMap<T> {
    type Output = T;

    fn index(&self, seat: Seat) -> &Self::Output {
        self.get(seat)
    }
}

impl<T> IndexMut<Seat> for SeatMap<T> {
    fn index_mut(&mut self, seat: Seat) -> &mut Self::Output {
        self.get_mut(seat)
    }
}
