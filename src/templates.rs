//! Chord templates
//!
//! Interval templates from plain triads up to thirteenth chords. Catalog order
//! is significant: earlier templates win ties.

use crate::note::{PitchClassSet, SEMITONES};

/// A chord quality as semitone offsets from its root.
///
/// Offsets may exceed an octave (9ths, 11ths, 13ths); matching folds them
/// back into a single octave.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ChordTemplate {
    label: &'static str,
    intervals: &'static [u8],
}

impl ChordTemplate {
    /// Define a template. `intervals` should start at 0 and ascend.
    pub const fn new(label: &'static str, intervals: &'static [u8]) -> Self {
        ChordTemplate { label, intervals }
    }

    /// Suffix appended to the root name, e.g. `"m7"`.
    pub const fn label(&self) -> &'static str {
        self.label
    }

    /// Raw semitone offsets, compound intervals included.
    pub const fn intervals(&self) -> &'static [u8] {
        self.intervals
    }

    /// True if every chord tone above `root` is sounding.
    #[inline]
    pub fn matches(&self, pitches: &PitchClassSet, root: usize) -> bool {
        self.intervals
            .iter()
            .all(|&off| pitches.contains((root + off as usize) % SEMITONES))
    }

    /// Number of distinct pitch classes the template occupies.
    pub fn coverage(&self) -> usize {
        let mut seen = [false; SEMITONES];
        for &off in self.intervals {
            seen[off as usize % SEMITONES] = true;
        }
        seen.iter().filter(|&&s| s).count()
    }
}

/// Standard templates, simplest first.
const STANDARD_TEMPLATES: &[ChordTemplate] = &[
    // triads
    ChordTemplate::new("maj", &[0, 4, 7]),
    ChordTemplate::new("min", &[0, 3, 7]),
    ChordTemplate::new("sus2", &[0, 2, 7]),
    ChordTemplate::new("sus4", &[0, 5, 7]),
    ChordTemplate::new("dim", &[0, 3, 6]),
    ChordTemplate::new("aug", &[0, 4, 8]),
    // sevenths
    ChordTemplate::new("7", &[0, 4, 7, 10]),
    ChordTemplate::new("maj7", &[0, 4, 7, 11]),
    ChordTemplate::new("m7", &[0, 3, 7, 10]),
    ChordTemplate::new("mMaj7", &[0, 3, 7, 11]),
    ChordTemplate::new("7sus4", &[0, 5, 7, 10]),
    // sixths
    ChordTemplate::new("6", &[0, 4, 7, 9]),
    ChordTemplate::new("m6", &[0, 3, 7, 9]),
    // ninths
    ChordTemplate::new("9", &[0, 4, 7, 10, 14]),
    ChordTemplate::new("m9", &[0, 3, 7, 10, 14]),
    ChordTemplate::new("maj9", &[0, 4, 7, 11, 14]),
    ChordTemplate::new("7b9", &[0, 4, 7, 10, 13]),
    ChordTemplate::new("7#9", &[0, 4, 7, 10, 15]),
    // elevenths
    ChordTemplate::new("11", &[0, 4, 7, 10, 14, 17]),
    ChordTemplate::new("m11", &[0, 3, 7, 10, 14, 17]),
    // thirteenths
    ChordTemplate::new("13", &[0, 4, 7, 10, 14, 17, 21]),
    ChordTemplate::new("m13", &[0, 3, 7, 10, 14, 17, 21]),
    ChordTemplate::new("maj13", &[0, 4, 7, 11, 14, 17, 21]),
];

/// Ordered, read-only list of chord templates.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ChordTemplateCatalog {
    templates: &'static [ChordTemplate],
}

impl ChordTemplateCatalog {
    /// The built-in 23-template catalog.
    pub const fn standard() -> Self {
        ChordTemplateCatalog {
            templates: STANDARD_TEMPLATES,
        }
    }

    /// Wrap a caller-supplied template list. Order is kept as given.
    pub const fn from_static(templates: &'static [ChordTemplate]) -> Self {
        ChordTemplateCatalog { templates }
    }

    /// Templates in priority order.
    pub fn iter(&self) -> std::slice::Iter<'static, ChordTemplate> {
        self.templates.iter()
    }

    /// Number of templates.
    pub const fn len(&self) -> usize {
        self.templates.len()
    }

    /// True for an empty catalog.
    pub const fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

impl Default for ChordTemplateCatalog {
    fn default() -> Self {
        ChordTemplateCatalog::standard()
    }
}
