//! Notes and pitch classes
//!
//! Sharp-spelled pitch names and the 12-slot membership array chord matching
//! works on.

use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// Number of pitch classes in an octave.
pub const SEMITONES: usize = 12;

/// Reduce a MIDI note number to its pitch class (0 = C).
#[inline]
pub const fn pitch_class(note: u8) -> usize {
    note as usize % SEMITONES
}

/// Twelve chromatic pitch classes
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NoteName {
    /// C
    C,
    /// C sharp / D flat
    Cs,
    /// D
    D,
    /// D sharp / E flat
    Ds,
    /// E
    E,
    /// F
    F,
    /// F sharp / G flat
    Fs,
    /// G
    G,
    /// G sharp / A flat
    Gs,
    /// A
    A,
    /// A sharp / B flat
    As,
    /// B
    B,
    /// Unknown note name
    Unknown,
}

impl NoteName {
    /// Map a pitch class to its name. Anything outside `0..12` is `Unknown`.
    pub const fn from_pitch_class(idx: usize) -> NoteName {
        match idx {
            0 => NoteName::C,
            1 => NoteName::Cs,
            2 => NoteName::D,
            3 => NoteName::Ds,
            4 => NoteName::E,
            5 => NoteName::F,
            6 => NoteName::Fs,
            7 => NoteName::G,
            8 => NoteName::Gs,
            9 => NoteName::A,
            10 => NoteName::As,
            11 => NoteName::B,
            _ => NoteName::Unknown,
        }
    }

    /// Sharp-based spelling used in chord labels (`"C#"`, `"A#"`, ...).
    pub const fn as_str(self) -> &'static str {
        match self {
            NoteName::C => "C",
            NoteName::Cs => "C#",
            NoteName::D => "D",
            NoteName::Ds => "D#",
            NoteName::E => "E",
            NoteName::F => "F",
            NoteName::Fs => "F#",
            NoteName::G => "G",
            NoteName::Gs => "G#",
            NoteName::A => "A",
            NoteName::As => "A#",
            NoteName::B => "B",
            NoteName::Unknown => "?",
        }
    }

    /// Pitch class of this name, `None` for `Unknown`.
    pub const fn pitch_class(self) -> Option<usize> {
        match self {
            NoteName::Unknown => None,
            other => Some(other as usize),
        }
    }
}

impl Display for NoteName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which pitch classes are sounding, octave ignored.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct PitchClassSet {
    present: [bool; SEMITONES],
}

impl PitchClassSet {
    /// Collect the pitch classes of a group of MIDI note numbers.
    pub fn from_notes<'a, I>(notes: I) -> Self
    where
        I: IntoIterator<Item = &'a u8>,
    {
        let mut set = PitchClassSet::default();
        for &note in notes {
            set.present[pitch_class(note)] = true;
        }
        set
    }

    /// Whether `pc` is sounding. Out-of-range classes are never present.
    #[inline]
    pub fn contains(&self, pc: usize) -> bool {
        pc < SEMITONES && self.present[pc]
    }

    /// Number of distinct pitch classes.
    pub fn len(&self) -> usize {
        self.present.iter().filter(|&&p| p).count()
    }

    /// True when no pitch class is set.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Lowest sounding pitch class.
    pub fn first(&self) -> Option<usize> {
        self.present.iter().position(|&p| p)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_sharp_spelled() {
        let names: Vec<&str> = (0..SEMITONES)
            .map(|pc| NoteName::from_pitch_class(pc).as_str())
            .collect();
        assert_eq!(
            names,
            ["C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B"]
        );
    }

    #[test]
    fn out_of_range_pitch_class_is_unknown() {
        assert_eq!(NoteName::from_pitch_class(12), NoteName::Unknown);
        assert_eq!(NoteName::from_pitch_class(usize::MAX), NoteName::Unknown);
        assert_eq!(NoteName::Unknown.to_string(), "?");
        assert_eq!(NoteName::Unknown.pitch_class(), None);
        assert_eq!(NoteName::As.pitch_class(), Some(10));
    }

    #[test]
    fn membership_folds_octaves() {
        let set = PitchClassSet::from_notes(&[48, 60, 64, 76]);
        assert_eq!(set.len(), 2);
        assert!(set.contains(0));
        assert!(set.contains(4));
        assert!(!set.contains(7));
        assert!(!set.contains(12));
        assert_eq!(set.first(), Some(0));
    }

    #[test]
    fn empty_membership() {
        let set = PitchClassSet::from_notes(Vec::<u8>::new().iter());
        assert!(set.is_empty());
        assert_eq!(set.first(), None);
    }
}
