//! Difficulty Scorer
//!
//! Single chronological pass over a note/tempo stream. Tracks the held notes,
//! names the chord whenever a new note joins at least one other, filters
//! repeated or near-simultaneous detections into a timeline and accumulates
//! chord, rhythm and polyphony scores.

use std::collections::BTreeSet;
use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::chord_detector::{ChordDetector, ChordError, INTERVAL_LABEL, UNKNOWN_LABEL};
use crate::events::{first_tempo, Event, NoteEvent, TickClock, DEFAULT_MICROS_PER_QUARTER};
use crate::midi::{self, MidiError};

/// Note-ons this close (in ticks) to the previous one count as a rapid change.
const RAPID_WINDOW_TICKS: u64 = 15;

/// Chords accepted less than this many seconds after the last one are dropped.
const DEDUPE_WINDOW_SECS: f64 = 0.03;

/// Rapid changes per rhythm difficulty point.
const RAPID_CHANGES_PER_POINT: u32 = 30;

/// Ceiling for the rhythm score and for the polyphony contribution.
const SUBSCORE_CAP: u32 = 10;

/// One accepted chord change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineEntry {
    /// Tick of the note-on that completed the chord.
    pub tick: u64,
    /// Offset from the start in seconds.
    pub seconds: f64,
    /// 1-based bar number (4/4).
    pub bar: u32,
    /// 1-based fractional beat within the bar.
    pub beat_in_bar: f64,
    /// Chord label, e.g. `"Gmaj"`.
    pub chord: String,
}

impl Display for TimelineEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "t={:.2}s, Bar {}, Beat {:.2}: {}",
            self.seconds, self.bar, self.beat_in_bar, self.chord
        )
    }
}

/// Aggregate scores and chord timeline of one stream.
///
/// `Default` is the all-zero result used when a stream cannot be decoded.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Most notes held at once.
    pub max_polyphony: u32,
    /// Number of note-ons with non-zero velocity.
    pub note_count: u32,
    /// Sum of the weights of all timeline chords.
    pub chord_difficulty: u32,
    /// Rapid note-on density, 0..=10.
    pub rhythm_difficulty: u32,
    /// Chord + rhythm + capped polyphony.
    pub total_difficulty: u32,
    /// Accepted chord changes in tick order.
    pub timeline: Vec<TimelineEntry>,
}

/// Difficulty points for playing a chord with this label.
///
/// Rules are checked in order and the first hit wins, so `"Cmaj7"` scores as a
/// seventh (3) and `"C7b9"` as a ninth (4).
pub fn chord_weight(label: &str) -> u32 {
    let has = |s: &str| label.contains(s);
    if label.ends_with("maj") || label.ends_with("min") {
        1
    } else if has("sus") {
        2
    } else if has("7") && !has("9") && !has("11") && !has("13") {
        3
    } else if has("9") {
        4
    } else if has("11") {
        5
    } else if has("13") {
        6
    } else if has("dim") || has("aug") || has("#") || has("b") {
        5
    } else {
        1
    }
}

/// Builder for `DifficultyScorer`
pub struct DifficultyScorerBuilder {
    detector: ChordDetector,
    rapid_window_ticks: u64,
    dedupe_window_secs: f64,
    default_micros_per_quarter: u32,
}

impl DifficultyScorerBuilder {
    /// Defaults: key "C" detector, 15-tick rapid window, 30 ms dedupe window,
    /// 120 BPM when the stream has no tempo event.
    pub fn new() -> Self {
        DifficultyScorerBuilder {
            detector: ChordDetector::new(),
            rapid_window_ticks: RAPID_WINDOW_TICKS,
            dedupe_window_secs: DEDUPE_WINDOW_SECS,
            default_micros_per_quarter: DEFAULT_MICROS_PER_QUARTER,
        }
    }

    /// Chord detector to use (key, resolution policy, tables).
    pub fn detector(mut self, detector: ChordDetector) -> Self {
        self.detector = detector;
        self
    }

    /// Max tick distance between note-ons that counts as a rapid change.
    pub fn rapid_window_ticks(mut self, ticks: u64) -> Self {
        self.rapid_window_ticks = ticks;
        self
    }

    /// Minimum spacing in seconds between two accepted chords.
    pub fn dedupe_window_secs(mut self, secs: f64) -> Self {
        self.dedupe_window_secs = secs;
        self
    }

    /// Tempo assumed for streams without a tempo event.
    pub fn default_micros_per_quarter(mut self, micros: u32) -> Self {
        self.default_micros_per_quarter = micros;
        self
    }

    /// Build the `DifficultyScorer`
    pub fn build(self) -> DifficultyScorer {
        DifficultyScorer {
            detector: self.detector,
            rapid_window_ticks: self.rapid_window_ticks,
            dedupe_window_secs: self.dedupe_window_secs,
            default_micros_per_quarter: self.default_micros_per_quarter,
        }
    }
}

impl Default for DifficultyScorerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Scores event streams.
///
/// `analyze` borrows `self` immutably and keeps all per-stream state local,
/// so one scorer can serve concurrent analyses.
#[derive(Debug, Clone)]
pub struct DifficultyScorer {
    detector: ChordDetector,
    rapid_window_ticks: u64,
    dedupe_window_secs: f64,
    default_micros_per_quarter: u32,
}

impl DifficultyScorer {
    /// Return a builder to customize the detector and windows
    pub fn builder() -> DifficultyScorerBuilder {
        DifficultyScorerBuilder::new()
    }

    /// Scorer with default settings.
    pub fn new() -> Self {
        DifficultyScorerBuilder::new().build()
    }

    /// The chord detector driven by this scorer.
    pub fn detector(&self) -> &ChordDetector {
        &self.detector
    }

    /// Change the key used for chord naming in later analyses.
    ///
    /// An unknown key keeps the current one; see [`ChordDetector::set_key`].
    pub fn set_key(&mut self, name: &str) -> Result<(), ChordError> {
        self.detector.set_key(name)
    }

    /// Score a decoded stream with `resolution` ticks per quarter note.
    ///
    /// Events are processed in tick order; events on the same tick keep the
    /// order they were given in. Only the first tempo event is honored. A
    /// resolution of 0 yields the all-zero result.
    pub fn analyze(&self, events: &[Event], resolution: u16) -> AnalysisResult {
        let mut ordered: Vec<&Event> = events.iter().collect();
        ordered.sort_by_key(|e| e.tick());

        let tempo = first_tempo(ordered.iter().copied()).unwrap_or(self.default_micros_per_quarter);
        let Some(clock) = TickClock::new(resolution, tempo) else {
            log::warn!("resolution of 0 ticks per quarter note, returning empty analysis");
            return AnalysisResult::default();
        };

        let mut pass = Pass::new(self, clock);
        for event in ordered {
            if let Event::Note(note) = event {
                pass.note(note);
            }
        }
        let result = pass.finish();

        log::debug!(
            "scored {} events: {} notes, {} chord changes, total difficulty {}",
            events.len(),
            result.note_count,
            result.timeline.len(),
            result.total_difficulty
        );
        result
    }

    /// Decode SMF bytes and score them.
    pub fn try_analyze_bytes(&self, bytes: &[u8]) -> Result<AnalysisResult, MidiError> {
        let stream = midi::decode(bytes)?;
        Ok(self.analyze(&stream.events, stream.resolution))
    }

    /// Decode SMF bytes and score them, substituting the all-zero result when
    /// the bytes cannot be decoded.
    pub fn analyze_bytes(&self, bytes: &[u8]) -> AnalysisResult {
        self.try_analyze_bytes(bytes).unwrap_or_else(|err| {
            log::warn!("could not decode MIDI data: {err}");
            AnalysisResult::default()
        })
    }
}

impl Default for DifficultyScorer {
    fn default() -> Self {
        DifficultyScorer::new()
    }
}

/// Last chord that made it into the timeline.
struct Accepted {
    label: String,
    tick: u64,
    seconds: f64,
}

/// State of one scoring pass.
struct Pass<'a> {
    scorer: &'a DifficultyScorer,
    clock: TickClock,
    active: BTreeSet<u8>,
    last_accepted: Option<Accepted>,
    last_note_on: Option<u64>,
    rapid_changes: u32,
    result: AnalysisResult,
}

impl<'a> Pass<'a> {
    fn new(scorer: &'a DifficultyScorer, clock: TickClock) -> Self {
        Pass {
            scorer,
            clock,
            active: BTreeSet::new(),
            last_accepted: None,
            last_note_on: None,
            rapid_changes: 0,
            result: AnalysisResult::default(),
        }
    }

    fn note(&mut self, event: &NoteEvent) {
        if !event.is_press() {
            self.active.remove(&event.note);
            return;
        }

        self.active.insert(event.note);
        self.result.note_count += 1;
        self.result.max_polyphony = self.result.max_polyphony.max(self.active.len() as u32);

        if let Some(prev) = self.last_note_on {
            if event.tick.saturating_sub(prev) <= self.scorer.rapid_window_ticks {
                self.rapid_changes += 1;
            }
        }
        self.last_note_on = Some(event.tick);

        if self.active.len() >= 2 {
            if let Some(chord) = self.scorer.detector.detect(&self.active) {
                self.transition(chord.label, event.tick);
            }
        }
    }

    fn transition(&mut self, label: String, tick: u64) {
        if label == UNKNOWN_LABEL || label == INTERVAL_LABEL {
            return;
        }

        let seconds = self.clock.seconds(tick);
        if let Some(last) = &self.last_accepted {
            if last.tick == tick && last.label == label {
                return;
            }
            if seconds - last.seconds < self.scorer.dedupe_window_secs {
                return;
            }
        }

        let pos = self.clock.position(tick);
        log::trace!("t={seconds:.3}s bar {} beat {:.2}: {label}", pos.bar, pos.beat_in_bar);

        self.result.chord_difficulty += chord_weight(&label);
        self.result.timeline.push(TimelineEntry {
            tick,
            seconds,
            bar: pos.bar,
            beat_in_bar: pos.beat_in_bar,
            chord: label.clone(),
        });
        self.last_accepted = Some(Accepted {
            label,
            tick,
            seconds,
        });
    }

    fn finish(mut self) -> AnalysisResult {
        let r = &mut self.result;
        r.rhythm_difficulty = (self.rapid_changes / RAPID_CHANGES_PER_POINT).min(SUBSCORE_CAP);
        r.total_difficulty = r.chord_difficulty
            + r.rhythm_difficulty
            + r.max_polyphony.saturating_mul(2).min(SUBSCORE_CAP);
        self.result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chord_detector::ResolutionPolicy;
    use crate::events::TempoEvent;

    const PPQ: u16 = 480;

    fn on(tick: u64, note: u8) -> Event {
        NoteEvent::on(tick, note, 100).into()
    }

    fn off(tick: u64, note: u8) -> Event {
        NoteEvent::off(tick, note).into()
    }

    fn chord(tick: u64, notes: &[u8]) -> Vec<Event> {
        notes.iter().map(|&n| on(tick, n)).collect()
    }

    fn release(tick: u64, notes: &[u8]) -> Vec<Event> {
        notes.iter().map(|&n| off(tick, n)).collect()
    }

    fn labels(result: &AnalysisResult) -> Vec<&str> {
        result.timeline.iter().map(|e| e.chord.as_str()).collect()
    }

    #[test]
    fn empty_stream_scores_zero() {
        let result = DifficultyScorer::new().analyze(&[], PPQ);
        assert_eq!(result, AnalysisResult::default());
    }

    #[test]
    fn stream_without_note_ons_scores_zero() {
        let events = vec![
            TempoEvent {
                tick: 0,
                micros_per_quarter: 600_000,
            }
            .into(),
            off(10, 60),
            NoteEvent::on(20, 62, 0).into(),
        ];
        let result = DifficultyScorer::new().analyze(&events, PPQ);
        assert_eq!(result, AnalysisResult::default());
    }

    #[test]
    fn block_chord_scores_once() {
        let result = DifficultyScorer::new().analyze(&chord(0, &[60, 64, 67]), PPQ);
        assert_eq!(result.note_count, 3);
        assert_eq!(result.max_polyphony, 3);
        assert_eq!(labels(&result), ["Cmaj"]);
        assert_eq!(result.chord_difficulty, 1);
        assert_eq!(result.rhythm_difficulty, 0);
        assert_eq!(result.total_difficulty, 1 + 6);
    }

    #[test]
    fn same_tick_same_label_is_deduplicated() {
        // doubling the root an octave up still reads as Cmaj on the same tick
        let result = DifficultyScorer::new().analyze(&chord(0, &[60, 64, 67, 72]), PPQ);
        assert_eq!(labels(&result), ["Cmaj"]);
        assert_eq!(result.chord_difficulty, 1);
        assert_eq!(result.max_polyphony, 4);
    }

    #[test]
    fn same_tick_repeat_is_dropped_without_time_window() {
        let scorer = DifficultyScorer::builder().dedupe_window_secs(0.0).build();
        let result = scorer.analyze(&chord(0, &[60, 64, 67, 72]), PPQ);
        assert_eq!(labels(&result), ["Cmaj"]);
        assert_eq!(result.chord_difficulty, 1);

        // a different chord on the same tick still gets through
        let mut events = chord(0, &[60, 64, 67]);
        events.extend(release(0, &[60, 64, 67]));
        events.extend(chord(0, &[65, 69, 72]));
        assert_eq!(labels(&scorer.analyze(&events, PPQ)), ["Cmaj", "Fmaj"]);
        assert_eq!(labels(&DifficultyScorer::new().analyze(&events, PPQ)), ["Cmaj"]);
    }

    #[test]
    fn chords_inside_dedupe_window_collapse() {
        let mut events = chord(0, &[60, 64, 67]);
        events.extend(release(5, &[60, 64, 67]));
        // 10 ticks at 480 ppq / 120 BPM is ~10 ms
        events.extend(chord(10, &[65, 69, 72]));
        events.extend(release(400, &[65, 69, 72]));
        events.extend(chord(480, &[67, 71, 74]));

        let result = DifficultyScorer::new().analyze(&events, PPQ);
        assert_eq!(labels(&result), ["Cmaj", "Gmaj"]);
        assert_eq!(result.timeline[1].tick, 480);
    }

    #[test]
    fn fallback_labels_never_reach_timeline() {
        let mut events = chord(0, &[60, 64]);
        events.extend(chord(480, &[61, 62]));
        let result = DifficultyScorer::new().analyze(&events, PPQ);
        assert!(result.timeline.is_empty());
        assert_eq!(result.chord_difficulty, 0);
        assert_eq!(result.max_polyphony, 4);
    }

    #[test]
    fn velocity_zero_releases_note() {
        let events = vec![
            on(0, 60),
            NoteEvent::on(100, 60, 0).into(),
            on(200, 64),
        ];
        let result = DifficultyScorer::new().analyze(&events, PPQ);
        assert_eq!(result.max_polyphony, 1);
        assert_eq!(result.note_count, 2);
        assert!(result.timeline.is_empty());
    }

    #[test]
    fn first_tempo_drives_timeline_seconds() {
        let mut events: Vec<Event> = vec![TempoEvent {
            tick: 0,
            micros_per_quarter: 400_000,
        }
        .into()];
        events.extend(chord(960, &[60, 64, 67]));
        events.push(
            TempoEvent {
                tick: 1000,
                micros_per_quarter: 1_000_000,
            }
            .into(),
        );
        events.extend(release(1500, &[60, 64, 67]));
        events.extend(chord(1920, &[62, 65, 69]));

        let result = DifficultyScorer::new().analyze(&events, PPQ);
        let first = &result.timeline[0];
        assert!((first.seconds - 0.8).abs() < 1e-9);
        assert_eq!(first.bar, 1);
        assert!((first.beat_in_bar - 3.0).abs() < 1e-9);

        let second = &result.timeline[1];
        assert_eq!(second.chord, "Dmin");
        assert!((second.seconds - 1.6).abs() < 1e-9);
        assert_eq!(second.bar, 2);
        assert!((second.beat_in_bar - 1.0).abs() < 1e-9);
    }

    #[test]
    fn missing_tempo_defaults_to_120_bpm() {
        let result = DifficultyScorer::new().analyze(&chord(480, &[60, 64, 67]), PPQ);
        assert!((result.timeline[0].seconds - 0.5).abs() < 1e-9);
    }

    #[test]
    fn unsorted_input_is_processed_in_tick_order() {
        let mut events = chord(480, &[67, 71, 74]);
        events.extend(release(400, &[60, 64, 67]));
        events.extend(chord(0, &[60, 64, 67]));
        let result = DifficultyScorer::new().analyze(&events, PPQ);
        assert_eq!(labels(&result), ["Cmaj", "Gmaj"]);
        assert_eq!(result.max_polyphony, 3);
    }

    #[test]
    fn rhythm_score_is_capped() {
        let mut events = Vec::new();
        for i in 0..2000u64 {
            events.push(on(i * 2, 60));
            events.push(off(i * 2 + 1, 60));
        }
        let result = DifficultyScorer::new().analyze(&events, PPQ);
        assert_eq!(result.note_count, 2000);
        assert_eq!(result.rhythm_difficulty, SUBSCORE_CAP);
        assert_eq!(result.total_difficulty, SUBSCORE_CAP + 2);
    }

    #[test]
    fn rapid_changes_count_toward_rhythm() {
        // 61 note-ons 10 ticks apart -> 60 rapid changes -> 2 points
        let mut events = Vec::new();
        for i in 0..61u64 {
            events.push(on(i * 10, 60));
            events.push(off(i * 10 + 5, 60));
        }
        let result = DifficultyScorer::new().analyze(&events, PPQ);
        assert_eq!(result.rhythm_difficulty, 2);

        // 16 ticks apart is outside the window
        let spaced: Vec<Event> = (0..61u64)
            .flat_map(|i| [on(i * 16, 60), off(i * 16 + 1, 60)])
            .collect();
        let result = DifficultyScorer::new().analyze(&spaced, PPQ);
        assert_eq!(result.rhythm_difficulty, 0);
    }

    #[test]
    fn rapid_window_is_configurable() {
        // 61 note-ons 20 ticks apart
        let events: Vec<Event> = (0..61u64)
            .flat_map(|i| [on(i * 20, 60), off(i * 20 + 1, 60)])
            .collect();
        assert_eq!(DifficultyScorer::new().analyze(&events, PPQ).rhythm_difficulty, 0);

        let wide = DifficultyScorer::builder().rapid_window_ticks(20).build();
        let result = wide.analyze(&events, PPQ);
        assert_eq!(result.rhythm_difficulty, 2);
        assert_eq!(result.total_difficulty, 2 + 2);
    }

    #[test]
    fn default_tempo_applies_only_without_tempo_event() {
        let slow = DifficultyScorer::builder()
            .default_micros_per_quarter(1_000_000)
            .build();
        let result = slow.analyze(&chord(480, &[60, 64, 67]), PPQ);
        assert!((result.timeline[0].seconds - 1.0).abs() < 1e-9);

        let mut events: Vec<Event> = vec![TempoEvent {
            tick: 0,
            micros_per_quarter: 250_000,
        }
        .into()];
        events.extend(chord(480, &[60, 64, 67]));
        let result = slow.analyze(&events, PPQ);
        assert!((result.timeline[0].seconds - 0.25).abs() < 1e-9);
    }

    #[test]
    fn polyphony_contribution_is_capped() {
        let result = DifficultyScorer::new().analyze(&chord(0, &[36, 43, 48, 52, 55, 60, 64, 67]), PPQ);
        assert_eq!(result.max_polyphony, 8);
        assert_eq!(
            result.total_difficulty,
            result.chord_difficulty + result.rhythm_difficulty + SUBSCORE_CAP
        );
    }

    #[test]
    fn zero_resolution_yields_empty_analysis() {
        let result = DifficultyScorer::new().analyze(&chord(0, &[60, 64, 67]), 0);
        assert_eq!(result, AnalysisResult::default());
    }

    #[test]
    fn key_and_policy_flow_through_builder() {
        let detector = ChordDetector::builder()
            .key("Am")
            .policy(ResolutionPolicy::MostCoverage)
            .build()
            .unwrap();
        let scorer = DifficultyScorer::builder().detector(detector).build();
        // A G C match nothing, so the first chord named is the full A C E G
        let result = scorer.analyze(&chord(0, &[57, 67, 60, 64]), PPQ);
        assert_eq!(labels(&result), ["Am7"]);
        assert_eq!(result.chord_difficulty, 3);
    }

    #[test]
    fn set_key_on_scorer_keeps_order_for_unknown_names() {
        let mut scorer = DifficultyScorer::new();
        scorer.set_key("Em").unwrap();
        assert!(scorer.set_key("E minor").is_err());
        assert_eq!(scorer.detector().key(), "Em");
    }

    #[test]
    fn garbage_bytes_score_zero() {
        let scorer = DifficultyScorer::new();
        assert_eq!(scorer.analyze_bytes(b"\x00\x01\x02"), AnalysisResult::default());
        assert!(scorer.try_analyze_bytes(b"MThd").is_err());
    }

    #[test]
    fn weights_follow_rule_order() {
        let cases = [
            ("Cmaj", 1),
            ("A#min", 1),
            ("Csus2", 2),
            ("G7sus4", 2),
            ("C7", 3),
            ("Fmaj7", 3),
            ("Dm7", 3),
            ("C9", 4),
            ("C7b9", 4),
            ("C7#9", 4),
            ("Cm11", 5),
            ("C13", 6),
            ("Cmaj13", 6),
            ("Bdim", 5),
            ("Eaug", 5),
            ("C#6", 5),
            ("C6", 1),
            ("Dm6", 1),
        ];
        for (label, weight) in cases {
            assert_eq!(chord_weight(label), weight, "{label}");
        }
    }

    #[test]
    fn timeline_entry_display() {
        let entry = TimelineEntry {
            tick: 960,
            seconds: 0.8,
            bar: 1,
            beat_in_bar: 3.0,
            chord: "Cmaj".to_string(),
        };
        assert_eq!(entry.to_string(), "t=0.80s, Bar 1, Beat 3.00: Cmaj");
    }
}
