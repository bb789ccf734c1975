//! Chord Detector
//!
//! Names the chord formed by a set of held MIDI notes. Candidate roots are
//! tried in the priority order of the selected key, and each root is checked
//! against the template catalog in declaration order.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::keys::{RootOrder, RootPriorityTable};
use crate::note::{pitch_class, NoteName, PitchClassSet};
use crate::templates::{ChordTemplate, ChordTemplateCatalog};

/// Label for two distinct pitch classes that form no chord.
pub const INTERVAL_LABEL: &str = "interval";

/// Label for three or more pitch classes that match no template.
pub const UNKNOWN_LABEL: &str = "unknown";

/// Root reported for `interval` and `unknown` results.
pub const NO_ROOT: i32 = -1;

/// A chord named from a set of held notes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChordResult {
    /// Root name followed by template suffix (`"Cmaj"`, `"F#m7"`), a bare
    /// note name for a single pitch class, or one of the fallback labels.
    pub label: String,
    /// Pitch class of the root, or [`NO_ROOT`] when no chord matched.
    pub root: i32,
    /// The MIDI note numbers the chord was built from.
    pub notes: BTreeSet<u8>,
}

impl ChordResult {
    /// Root as a note name; `Unknown` for fallback results.
    pub fn root_name(&self) -> NoteName {
        usize::try_from(self.root)
            .map(NoteName::from_pitch_class)
            .unwrap_or(NoteName::Unknown)
    }

    /// True for `interval` and `unknown` results.
    pub fn is_fallback(&self) -> bool {
        self.label == INTERVAL_LABEL || self.label == UNKNOWN_LABEL
    }
}

/// How to pick among several matching `(root, template)` pairs.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResolutionPolicy {
    /// Walk roots in key order and, for the first sounding root, templates in
    /// catalog order; the first full match wins.
    #[default]
    FirstMatch,
    /// Of all full matches, keep the template covering the most pitch classes.
    /// Ties go to the earliest pair in (root order, catalog order).
    MostCoverage,
}

/// Errors when configuring the chord detector
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ChordError {
    /// The key name has no entry in the root priority table. The previously
    /// active root order stays in effect.
    #[error("unrecognized key `{key}`, keeping previous root order")]
    UnrecognizedKey {
        /// The rejected key name.
        key: String,
    },
}

/// Builder for `ChordDetector`
pub struct ChordDetectorBuilder {
    key: Option<String>,
    policy: ResolutionPolicy,
    roots: RootPriorityTable,
    catalog: ChordTemplateCatalog,
}

impl ChordDetectorBuilder {
    /// Start with key "C", first-match resolution and the standard tables.
    pub fn new() -> Self {
        ChordDetectorBuilder {
            key: None,
            policy: ResolutionPolicy::default(),
            roots: RootPriorityTable::standard(),
            catalog: ChordTemplateCatalog::standard(),
        }
    }

    /// Select the key whose root order is used.
    pub fn key(mut self, name: impl Into<String>) -> Self {
        self.key = Some(name.into());
        self
    }

    /// Set the resolution policy.
    pub fn policy(mut self, policy: ResolutionPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Use a different key → root order table.
    pub fn root_table(mut self, table: RootPriorityTable) -> Self {
        self.roots = table;
        self
    }

    /// Use a different template catalog.
    pub fn catalog(mut self, catalog: ChordTemplateCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    /// Build the `ChordDetector`.
    ///
    /// Returns `Err(ChordError::UnrecognizedKey)` if the root table does not
    /// know the selected key, or "C" when no key was selected.
    pub fn build(self) -> Result<ChordDetector, ChordError> {
        let key = self
            .key
            .unwrap_or_else(|| RootPriorityTable::DEFAULT_KEY.to_string());
        let Some(order) = self.roots.order(&key) else {
            return Err(ChordError::UnrecognizedKey { key });
        };
        Ok(ChordDetector {
            key,
            order,
            policy: self.policy,
            roots: self.roots,
            catalog: self.catalog,
        })
    }
}

impl Default for ChordDetectorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Main chord detector
///
/// Holds only the active key and read-only tables, so a shared reference can
/// be used from several threads at once.
#[derive(Debug, Clone)]
pub struct ChordDetector {
    key: String,
    order: RootOrder,
    policy: ResolutionPolicy,
    roots: RootPriorityTable,
    catalog: ChordTemplateCatalog,
}

impl ChordDetector {
    /// Return a builder to customize key, policy and tables
    pub fn builder() -> ChordDetectorBuilder {
        ChordDetectorBuilder::new()
    }

    /// Create a detector in key "C" with first-match resolution.
    pub fn new() -> Self {
        ChordDetector {
            key: RootPriorityTable::DEFAULT_KEY.to_string(),
            order: RootOrder::default(),
            policy: ResolutionPolicy::default(),
            roots: RootPriorityTable::standard(),
            catalog: ChordTemplateCatalog::standard(),
        }
    }

    /// Switch the root order to that of `name`.
    ///
    /// An unknown name leaves the current order untouched and returns
    /// `Err(ChordError::UnrecognizedKey)`; callers may ignore it.
    pub fn set_key(&mut self, name: &str) -> Result<(), ChordError> {
        match self.roots.order(name) {
            Some(order) => {
                self.order = order;
                self.key = name.to_string();
                Ok(())
            }
            None => {
                log::warn!("unrecognized key {name:?}, keeping root order of {}", self.key);
                Err(ChordError::UnrecognizedKey {
                    key: name.to_string(),
                })
            }
        }
    }

    /// Name of the active key.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The active root order.
    pub fn root_order(&self) -> RootOrder {
        self.order
    }

    /// The active resolution policy.
    pub fn policy(&self) -> ResolutionPolicy {
        self.policy
    }

    /// Name the chord formed by `notes`.
    ///
    /// Returns `None` only for an empty set. One pitch class yields its bare
    /// note name; two or more that match nothing yield `"interval"` or
    /// `"unknown"` with root [`NO_ROOT`].
    pub fn detect(&self, notes: &BTreeSet<u8>) -> Option<ChordResult> {
        if notes.is_empty() {
            return None;
        }

        let pitches = PitchClassSet::from_notes(notes);
        let pressed = pitches.len();

        if pressed == 1 {
            let pc = pitches.first()?;
            return Some(ChordResult {
                label: NoteName::from_pitch_class(pc).to_string(),
                root: pc as i32,
                notes: notes.clone(),
            });
        }

        let found = match self.policy {
            ResolutionPolicy::FirstMatch => self.first_match(&pitches),
            ResolutionPolicy::MostCoverage => self.most_coverage(&pitches),
        };

        let result = match found {
            Some((root, template)) => ChordResult {
                label: format!("{}{}", NoteName::from_pitch_class(root), template.label()),
                root: root as i32,
                notes: notes.clone(),
            },
            None => ChordResult {
                label: (if pressed == 2 {
                    INTERVAL_LABEL
                } else {
                    UNKNOWN_LABEL
                })
                .to_string(),
                root: NO_ROOT,
                notes: notes.clone(),
            },
        };
        Some(result)
    }

    /// Every full match, roots in key order and templates in catalog order.
    fn candidates<'a>(
        &'a self,
        pitches: &'a PitchClassSet,
    ) -> impl Iterator<Item = (usize, ChordTemplate)> + 'a {
        self.order
            .iter()
            .filter(move |&root| pitches.contains(root))
            .flat_map(move |root| {
                self.catalog
                    .iter()
                    .filter(move |t| t.matches(pitches, root))
                    .map(move |&t| (root, t))
            })
    }

    fn first_match(&self, pitches: &PitchClassSet) -> Option<(usize, ChordTemplate)> {
        self.candidates(pitches).next()
    }

    fn most_coverage(&self, pitches: &PitchClassSet) -> Option<(usize, ChordTemplate)> {
        let mut best: Option<(usize, ChordTemplate, usize)> = None;
        for (root, template) in self.candidates(pitches) {
            let coverage = template.coverage();
            // strict comparison keeps the earliest candidate on ties
            let better = match best {
                Some((_, _, c)) => coverage > c,
                None => true,
            };
            if better {
                best = Some((root, template, coverage));
            }
        }
        best.map(|(root, template, _)| (root, template))
    }
}

impl Default for ChordDetector {
    fn default() -> Self {
        ChordDetector::new()
    }
}

/// Name of the pitch class of a MIDI note number.
pub fn note_name(note: u8) -> NoteName {
    NoteName::from_pitch_class(pitch_class(note))
}
