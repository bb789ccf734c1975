//! Live chord tracking
//!
//! Keeps the set of keys currently held on a controller and names the chord
//! they form on demand. A tracker can also keep a log of the chords it has
//! shown and record the performance as a Standard MIDI File.

use std::collections::{BTreeSet, VecDeque};

use crate::chord_detector::{ChordDetector, ChordError, ChordResult};
use crate::events::NoteEvent;
use crate::midi::{self, MidiError};

/// Shown by [`LiveChordTracker::current_label`] when nothing is held.
pub const NO_CHORD_LABEL: &str = "—";

/// Ticks per quarter note of recorded performances.
pub const RECORDING_PPQ: u16 = 480;

/// Velocity written for recorded key presses.
pub const RECORDING_VELOCITY: u8 = 90;

/// Chord log entries kept unless configured otherwise.
pub const DEFAULT_HISTORY_LIMIT: usize = 256;

/// Length of a quarter note in recordings (120 BPM, the SMF default tempo).
const RECORDING_MILLIS_PER_QUARTER: u64 = 500;

/// Key presses and releases captured while recording.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Recording {
    events: Vec<NoteEvent>,
}

impl Recording {
    /// Tick of a clock reading in milliseconds since recording started.
    pub fn tick_at(elapsed_ms: u64) -> u64 {
        elapsed_ms * u64::from(RECORDING_PPQ) / RECORDING_MILLIS_PER_QUARTER
    }

    /// Captured events in the order they were played.
    pub fn events(&self) -> &[NoteEvent] {
        &self.events
    }

    /// Number of captured events.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether nothing was captured.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Encode as SMF bytes at [`RECORDING_PPQ`], ready for
    /// [`DifficultyScorer::analyze_bytes`](crate::DifficultyScorer::analyze_bytes).
    pub fn to_smf_bytes(&self) -> Result<Vec<u8>, MidiError> {
        midi::encode(RECORDING_PPQ, &self.events)
    }
}

/// Held-key state plus a chord detector.
#[derive(Debug, Clone)]
pub struct LiveChordTracker {
    detector: ChordDetector,
    held: BTreeSet<u8>,
    history: VecDeque<String>,
    history_limit: usize,
    recording: Option<Recording>,
}

impl LiveChordTracker {
    /// Tracker with no keys held.
    pub fn new(detector: ChordDetector) -> Self {
        LiveChordTracker {
            detector,
            held: BTreeSet::new(),
            history: VecDeque::new(),
            history_limit: DEFAULT_HISTORY_LIMIT,
            recording: None,
        }
    }

    /// Keep at most `limit` chord log entries; older ones are dropped first.
    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit;
        self.trim_history();
        self
    }

    /// Key down. Returns false if it was already held.
    pub fn press(&mut self, note: u8) -> bool {
        let changed = self.held.insert(note);
        self.log_chord();
        changed
    }

    /// Key up. Returns false if it was not held.
    pub fn release(&mut self, note: u8) -> bool {
        let changed = self.held.remove(&note);
        self.log_chord();
        changed
    }

    /// Key down at `elapsed_ms` on the caller's clock, recorded if a
    /// recording is running.
    pub fn press_at(&mut self, note: u8, elapsed_ms: u64) -> bool {
        if let Some(rec) = &mut self.recording {
            rec.events.push(NoteEvent::on(
                Recording::tick_at(elapsed_ms),
                note,
                RECORDING_VELOCITY,
            ));
        }
        self.press(note)
    }

    /// Key up at `elapsed_ms` on the caller's clock, recorded if a recording
    /// is running.
    pub fn release_at(&mut self, note: u8, elapsed_ms: u64) -> bool {
        if let Some(rec) = &mut self.recording {
            rec.events
                .push(NoteEvent::off(Recording::tick_at(elapsed_ms), note));
        }
        self.release(note)
    }

    /// Release everything (all-notes-off).
    pub fn clear(&mut self) {
        self.held.clear();
    }

    /// Currently held note numbers, lowest first.
    pub fn held(&self) -> &BTreeSet<u8> {
        &self.held
    }

    /// Select the key used for naming; unknown keys keep the current one.
    pub fn set_key(&mut self, name: &str) -> Result<(), ChordError> {
        self.detector.set_key(name)
    }

    /// The detector in use.
    pub fn detector(&self) -> &ChordDetector {
        &self.detector
    }

    /// Chord formed by the held keys, `None` when nothing is held.
    pub fn current_chord(&self) -> Option<ChordResult> {
        self.detector.detect(&self.held)
    }

    /// Label of the held chord, or [`NO_CHORD_LABEL`].
    pub fn current_label(&self) -> String {
        self.current_chord()
            .map(|c| c.label)
            .unwrap_or_else(|| NO_CHORD_LABEL.to_string())
    }

    /// Labels shown after each press or release, oldest first. Moments with
    /// nothing held are not logged.
    pub fn chord_history(&self) -> &VecDeque<String> {
        &self.history
    }

    /// Forget the chord log.
    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    /// Start a new recording, discarding any unfinished one. Timestamps passed
    /// to [`press_at`](Self::press_at) and [`release_at`](Self::release_at)
    /// count from this moment.
    pub fn start_recording(&mut self) {
        if self.recording.is_some() {
            log::debug!("restarting recording, previous take discarded");
        }
        self.recording = Some(Recording::default());
    }

    /// Whether a recording is running.
    pub fn is_recording(&self) -> bool {
        self.recording.is_some()
    }

    /// Finish the running recording. `None` if none was started.
    pub fn stop_recording(&mut self) -> Option<Recording> {
        let rec = self.recording.take()?;
        log::debug!("recording stopped with {} events", rec.len());
        Some(rec)
    }

    fn log_chord(&mut self) {
        if let Some(chord) = self.current_chord() {
            self.history.push_back(chord.label);
            self.trim_history();
        }
    }

    fn trim_history(&mut self) {
        while self.history.len() > self.history_limit {
            self.history.pop_front();
        }
    }
}

impl Default for LiveChordTracker {
    fn default() -> Self {
        LiveChordTracker::new(ChordDetector::new())
    }
}
