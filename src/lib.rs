//! # chord_difficulty
//!
//! Name chords from held MIDI notes and score how hard a MIDI performance is
//! to play.
//!
//! ## Example
//! ```rust
//! use std::collections::BTreeSet;
//! use chord_difficulty::{ChordDetector, DifficultyScorer, Event, NoteEvent};
//!
//! fn run() -> Result<(), Box<dyn std::error::Error>> {
//!     // 1) Name a chord, with roots tried in A minor priority order
//!     let detector = ChordDetector::builder().key("Am").build()?;
//!     let held: BTreeSet<u8> = [57, 60, 64].into_iter().collect();
//!     if let Some(chord) = detector.detect(&held) {
//!         println!("holding {}", chord.label); // "Amin"
//!     }
//!
//!     // 2) Score a decoded stream (480 ticks per quarter note)
//!     let scorer = DifficultyScorer::builder().detector(detector).build();
//!     let events: Vec<Event> = [57, 60, 64]
//!         .into_iter()
//!         .map(|n| NoteEvent::on(0, n, 100).into())
//!         .collect();
//!     let analysis = scorer.analyze(&events, 480);
//!     for entry in &analysis.timeline {
//!         println!("{entry}");
//!     }
//!     println!("total difficulty {}", analysis.total_difficulty);
//!
//!     // 3) Or go straight from Standard MIDI File bytes
//!     let bytes: Vec<u8> = Vec::new(); // read from disk or the network
//!     let analysis = scorer.analyze_bytes(&bytes); // all zero if undecodable
//!     assert_eq!(analysis.note_count, 0);
//!
//!     Ok(())
//! }
//! # run().unwrap();
//! ```
//!
//! ## Logging
//! Diagnostics go through the `log` facade; install any logger to see them.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rust_2018_idioms)]
#![deny(clippy::all)]

/// High‐level chord detector API.
pub use chord_detector::{
    ChordDetector, ChordDetectorBuilder, ChordError, ChordResult, ResolutionPolicy,
};

/// Stream scoring.
pub use difficulty::{
    chord_weight, AnalysisResult, DifficultyScorer, DifficultyScorerBuilder, TimelineEntry,
};

/// Event model and timing.
pub use events::{Event, NoteEvent, NoteKind, TempoEvent, TickClock};

/// Lookup tables.
pub use keys::{RootOrder, RootPriorityTable};
pub use templates::{ChordTemplate, ChordTemplateCatalog};

pub use live::{LiveChordTracker, Recording};
pub use midi::{DecodedStream, MidiError};
pub use note::{NoteName, PitchClassSet};

/// Chord detection module.
pub mod chord_detector;

/// Difficulty scoring module.
pub mod difficulty;

/// Note/tempo event types.
pub mod events;

/// Key → root priority table.
pub mod keys;

/// Live keyboard chord tracking.
pub mod live;

/// Standard MIDI File decoding.
pub mod midi;

/// Pitch classes and note names.
pub mod note;

/// Chord template catalog.
pub mod templates;
