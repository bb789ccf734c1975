//! Root priority by key
//!
//! For each of the 24 major and minor keys, the order in which candidate chord
//! roots are tried: tonic first, then its fifth/fourth relatives, then the
//! remaining chromatic degrees.

use crate::note::SEMITONES;

/// A key-specific permutation of the twelve pitch classes.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct RootOrder([u8; SEMITONES]);

impl RootOrder {
    /// Ascending chromatic order `0..12`.
    pub const CHROMATIC: RootOrder = RootOrder([0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11]);

    /// Build an order, rejecting anything that is not a permutation of `0..12`.
    pub fn new(order: [u8; SEMITONES]) -> Option<Self> {
        let mut seen = [false; SEMITONES];
        for &pc in &order {
            let pc = pc as usize;
            if pc >= SEMITONES || seen[pc] {
                return None;
            }
            seen[pc] = true;
        }
        Some(RootOrder(order))
    }

    /// Pitch classes in priority order.
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.0.iter().map(|&pc| pc as usize)
    }

    /// The underlying permutation.
    pub const fn as_array(&self) -> &[u8; SEMITONES] {
        &self.0
    }
}

impl Default for RootOrder {
    fn default() -> Self {
        RootPriorityTable::standard()
            .order(RootPriorityTable::DEFAULT_KEY)
            .unwrap_or(RootOrder::CHROMATIC)
    }
}

const STANDARD_ORDERS: &[(&str, RootOrder)] = &[
    ("C", RootOrder([0, 7, 5, 9, 4, 2, 11, 1, 3, 6, 8, 10])),
    ("C#", RootOrder([1, 8, 6, 10, 5, 3, 0, 2, 4, 7, 9, 11])),
    ("D", RootOrder([2, 9, 7, 11, 6, 4, 1, 3, 5, 8, 10, 0])),
    ("D#", RootOrder([3, 10, 8, 0, 7, 5, 2, 4, 6, 9, 11, 1])),
    ("E", RootOrder([4, 11, 9, 1, 8, 6, 3, 5, 7, 10, 0, 2])),
    ("F", RootOrder([5, 0, 10, 2, 9, 7, 4, 6, 8, 11, 1, 3])),
    ("F#", RootOrder([6, 1, 11, 3, 10, 8, 5, 7, 9, 0, 2, 4])),
    ("G", RootOrder([7, 2, 0, 4, 11, 9, 6, 8, 10, 1, 3, 5])),
    ("G#", RootOrder([8, 3, 1, 5, 0, 10, 7, 9, 11, 2, 4, 6])),
    ("A", RootOrder([9, 4, 2, 6, 1, 11, 8, 10, 0, 3, 5, 7])),
    ("A#", RootOrder([10, 5, 3, 7, 2, 0, 9, 11, 1, 4, 6, 8])),
    ("B", RootOrder([11, 6, 4, 8, 3, 1, 10, 0, 2, 5, 7, 9])),
    // minor keys
    ("Cm", RootOrder([0, 5, 7, 2, 9, 4, 11, 1, 3, 6, 8, 10])),
    ("C#m", RootOrder([1, 6, 8, 3, 10, 5, 0, 2, 4, 7, 9, 11])),
    ("Dm", RootOrder([2, 7, 9, 4, 11, 6, 3, 5, 8, 10, 0, 1])),
    ("D#m", RootOrder([3, 8, 10, 5, 0, 7, 4, 6, 9, 11, 1, 2])),
    ("Em", RootOrder([4, 9, 11, 6, 1, 8, 5, 7, 10, 0, 2, 3])),
    ("Fm", RootOrder([5, 10, 0, 7, 2, 9, 6, 8, 11, 1, 3, 4])),
    ("F#m", RootOrder([6, 11, 1, 8, 3, 10, 7, 9, 0, 2, 4, 5])),
    ("Gm", RootOrder([7, 0, 2, 9, 4, 11, 8, 10, 1, 3, 5, 6])),
    ("G#m", RootOrder([8, 1, 3, 10, 5, 0, 9, 11, 2, 4, 6, 7])),
    ("Am", RootOrder([9, 2, 4, 11, 6, 1, 10, 0, 3, 5, 7, 8])),
    ("A#m", RootOrder([10, 3, 5, 0, 7, 2, 11, 1, 4, 6, 8, 9])),
    ("Bm", RootOrder([11, 4, 6, 1, 8, 3, 0, 2, 5, 7, 9, 10])),
];

/// Read-only lookup from key name to root order.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct RootPriorityTable {
    entries: &'static [(&'static str, RootOrder)],
}

impl RootPriorityTable {
    /// Key whose order is active before any key is selected.
    pub const DEFAULT_KEY: &'static str = "C";

    /// The built-in table: 12 major keys then 12 minor keys.
    pub const fn standard() -> Self {
        RootPriorityTable {
            entries: STANDARD_ORDERS,
        }
    }

    /// Wrap a caller-supplied table.
    pub const fn from_static(entries: &'static [(&'static str, RootOrder)]) -> Self {
        RootPriorityTable { entries }
    }

    /// Root order for `key`, if the key is known. Names are case-sensitive.
    pub fn order(&self, key: &str) -> Option<RootOrder> {
        self.entries
            .iter()
            .find(|(name, _)| *name == key)
            .map(|&(_, order)| order)
    }

    /// Recognized key names in table order.
    pub fn key_names(&self) -> impl Iterator<Item = &'static str> {
        self.entries.iter().map(|&(name, _)| name)
    }

    /// Whether `key` has an entry.
    pub fn contains(&self, key: &str) -> bool {
        self.order(key).is_some()
    }
}

impl Default for RootPriorityTable {
    fn default() -> Self {
        RootPriorityTable::standard()
    }
}
