//! Decoded event stream
//!
//! Format-agnostic note and tempo events, plus the tick → seconds / bar / beat
//! conversion used when building a chord timeline.

use serde::{Deserialize, Serialize};

/// Tempo assumed when a stream carries no tempo event (120 BPM).
pub const DEFAULT_MICROS_PER_QUARTER: u32 = 500_000;

/// Bar length in quarter-note beats.
pub const BEATS_PER_BAR: u32 = 4;

/// Note-on or note-off.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum NoteKind {
    /// Key pressed (velocity 0 counts as a release)
    On,
    /// Key released
    Off,
}

/// A single note event at an absolute tick.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteEvent {
    /// Absolute position in ticks.
    pub tick: u64,
    /// On or off.
    pub kind: NoteKind,
    /// MIDI note number, 0..=127.
    pub note: u8,
    /// MIDI velocity, 0..=127.
    pub velocity: u8,
}

impl NoteEvent {
    /// Note-on with the given velocity.
    pub const fn on(tick: u64, note: u8, velocity: u8) -> Self {
        NoteEvent {
            tick,
            kind: NoteKind::On,
            note,
            velocity,
        }
    }

    /// Note-off.
    pub const fn off(tick: u64, note: u8) -> Self {
        NoteEvent {
            tick,
            kind: NoteKind::Off,
            note,
            velocity: 0,
        }
    }

    /// A note-on with non-zero velocity.
    pub const fn is_press(&self) -> bool {
        matches!(self.kind, NoteKind::On) && self.velocity > 0
    }

    /// A note-off, or a note-on with velocity 0.
    pub const fn is_release(&self) -> bool {
        !self.is_press()
    }
}

/// A set-tempo meta event.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TempoEvent {
    /// Absolute position in ticks.
    pub tick: u64,
    /// Quarter-note length in microseconds (24-bit in SMF).
    pub micros_per_quarter: u32,
}

/// One entry of a decoded stream.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Event {
    /// Note on/off
    Note(NoteEvent),
    /// Tempo change
    Tempo(TempoEvent),
}

impl Event {
    /// Absolute tick of the event.
    pub const fn tick(&self) -> u64 {
        match self {
            Event::Note(n) => n.tick,
            Event::Tempo(t) => t.tick,
        }
    }
}

impl From<NoteEvent> for Event {
    fn from(e: NoteEvent) -> Self {
        Event::Note(e)
    }
}

impl From<TempoEvent> for Event {
    fn from(e: TempoEvent) -> Self {
        Event::Tempo(e)
    }
}

/// Tempo of the first tempo event in `events`, if there is one.
///
/// Later tempo changes are ignored.
pub fn first_tempo<'a, I>(events: I) -> Option<u32>
where
    I: IntoIterator<Item = &'a Event>,
{
    events.into_iter().find_map(|e| match e {
        Event::Tempo(t) => Some(t.micros_per_quarter),
        Event::Note(_) => None,
    })
}

/// Musical position of a tick.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct BarPosition {
    /// 1-based bar number
    pub bar: u32,
    /// 1-based beat within the bar, fractional
    pub beat_in_bar: f64,
}

/// Fixed-tempo tick converter.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct TickClock {
    ppq: u16,
    micros_per_quarter: u32,
}

impl TickClock {
    /// Clock for `ppq` ticks per quarter at `micros_per_quarter`.
    ///
    /// Returns `None` if `ppq` is 0.
    pub fn new(ppq: u16, micros_per_quarter: u32) -> Option<Self> {
        (ppq > 0).then_some(TickClock {
            ppq,
            micros_per_quarter,
        })
    }

    /// Ticks per quarter note.
    pub const fn ppq(&self) -> u16 {
        self.ppq
    }

    /// Quarter-note length in microseconds.
    pub const fn micros_per_quarter(&self) -> u32 {
        self.micros_per_quarter
    }

    /// Quarter-note beats since tick 0.
    pub fn beats(&self, tick: u64) -> f64 {
        tick as f64 / f64::from(self.ppq)
    }

    /// Seconds since tick 0.
    pub fn seconds(&self, tick: u64) -> f64 {
        self.beats(tick) * (f64::from(self.micros_per_quarter) / 1_000_000.0)
    }

    /// Bar and beat of `tick` in 4/4.
    pub fn position(&self, tick: u64) -> BarPosition {
        let beat = self.beats(tick);
        let per_bar = f64::from(BEATS_PER_BAR);
        BarPosition {
            bar: (beat / per_bar).floor() as u32 + 1,
            beat_in_bar: beat % per_bar + 1.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn velocity_zero_note_on_is_release() {
        assert!(NoteEvent::on(0, 60, 90).is_press());
        assert!(NoteEvent::on(0, 60, 0).is_release());
        assert!(NoteEvent::off(0, 60).is_release());
    }

    #[test]
    fn tick_math_at_150_bpm() {
        let clock = TickClock::new(480, 400_000).unwrap();
        assert!(close(clock.beats(960), 2.0));
        assert!(close(clock.seconds(960), 0.8));
        let pos = clock.position(960);
        assert_eq!(pos.bar, 1);
        assert!(close(pos.beat_in_bar, 3.0));
    }

    #[test]
    fn bar_rolls_over_every_four_beats() {
        let clock = TickClock::new(96, DEFAULT_MICROS_PER_QUARTER).unwrap();
        let pos = clock.position(96 * 4);
        assert_eq!(pos.bar, 2);
        assert!(close(pos.beat_in_bar, 1.0));

        let pos = clock.position(96 * 9 + 48);
        assert_eq!(pos.bar, 3);
        assert!(close(pos.beat_in_bar, 2.5));
        assert!(close(clock.seconds(96 * 2), 1.0));
    }

    #[test]
    fn zero_ppq_has_no_clock() {
        assert!(TickClock::new(0, DEFAULT_MICROS_PER_QUARTER).is_none());
    }

    #[test]
    fn only_first_tempo_counts() {
        let events = [
            Event::from(NoteEvent::on(0, 60, 100)),
            Event::from(TempoEvent {
                tick: 10,
                micros_per_quarter: 600_000,
            }),
            Event::from(TempoEvent {
                tick: 20,
                micros_per_quarter: 300_000,
            }),
        ];
        assert_eq!(first_tempo(&events), Some(600_000));
        assert_eq!(first_tempo(&events[..1]), None);
    }
}
