//! Standard MIDI File decoding and encoding
//!
//! Turns SMF bytes into the flat `(resolution, events)` stream the difficulty
//! scorer consumes. Tracks are merged onto one absolute-tick timeline; events
//! sharing a tick keep file order (track by track, then within each track).
//! Recorded note events go the other way through [`encode`].

use midly::{
    Format, Header, MetaMessage, MidiMessage, Smf, Timing, Track, TrackEvent, TrackEventKind,
};
use thiserror::Error;

use crate::events::{Event, NoteEvent, NoteKind, TempoEvent};

/// Largest delta-time a track event can carry (28 bits).
const MAX_DELTA: u32 = 0x0FFF_FFFF;

/// Errors returned while decoding a MIDI file.
#[derive(Debug, Error)]
pub enum MidiError {
    /// The bytes are not a parseable Standard MIDI File.
    #[error("failed to parse MIDI data: {0}")]
    Parse(#[from] midly::Error),

    /// The file uses SMPTE timecode instead of ticks per quarter note.
    #[error("unsupported timecode timing ({fps} fps, {subframes} subframes)")]
    UnsupportedTiming {
        /// Frames per second from the header.
        fps: u8,
        /// Ticks per frame from the header.
        subframes: u8,
    },

    /// Metrical timing with 0 ticks per quarter note.
    #[error("resolution of 0 ticks per quarter note")]
    ZeroResolution,

    /// Two consecutive events are further apart than a delta-time can hold.
    #[error("gap before tick {tick} does not fit a 28-bit delta")]
    DeltaOverflow {
        /// Tick of the event that could not be placed.
        tick: u64,
    },

    /// The writer failed.
    #[error("failed to write MIDI data: {0}")]
    Write(String),
}

/// A decoded file: resolution plus chronologically merged events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedStream {
    /// Ticks (pulses) per quarter note.
    pub resolution: u16,
    /// Note and tempo events sorted by tick.
    pub events: Vec<Event>,
}

/// Decode SMF bytes.
///
/// Only note on/off and set-tempo events are kept; everything else in the
/// file is skipped.
pub fn decode(bytes: &[u8]) -> Result<DecodedStream, MidiError> {
    let smf = Smf::parse(bytes)?;

    let resolution = match smf.header.timing {
        Timing::Metrical(ppq) => ppq.as_int(),
        Timing::Timecode(fps, subframes) => {
            return Err(MidiError::UnsupportedTiming {
                fps: fps.as_int(),
                subframes,
            })
        }
    };
    if resolution == 0 {
        return Err(MidiError::ZeroResolution);
    }

    let mut events = Vec::new();
    for track in &smf.tracks {
        let mut tick: u64 = 0;
        for event in track {
            tick += u64::from(event.delta.as_int());
            match event.kind {
                TrackEventKind::Midi { message, .. } => match message {
                    MidiMessage::NoteOn { key, vel } => {
                        events.push(NoteEvent::on(tick, key.as_int(), vel.as_int()).into());
                    }
                    MidiMessage::NoteOff { key, .. } => {
                        events.push(NoteEvent::off(tick, key.as_int()).into());
                    }
                    _ => {}
                },
                TrackEventKind::Meta(MetaMessage::Tempo(tempo)) => {
                    events.push(
                        TempoEvent {
                            tick,
                            micros_per_quarter: tempo.as_int(),
                        }
                        .into(),
                    );
                }
                _ => {}
            }
        }
    }

    // stable: equal ticks stay in track order
    events.sort_by_key(Event::tick);

    log::debug!(
        "decoded {} tracks into {} events at {} ppq",
        smf.tracks.len(),
        events.len(),
        resolution
    );

    Ok(DecodedStream { resolution, events })
}

/// Encode note events as a single-track Standard MIDI File.
///
/// Events are written in tick order on channel 1; equal ticks keep the order
/// given. No tempo event is written, so readers fall back to 120 BPM.
pub fn encode(resolution: u16, events: &[NoteEvent]) -> Result<Vec<u8>, MidiError> {
    if resolution == 0 {
        return Err(MidiError::ZeroResolution);
    }

    let mut ordered: Vec<&NoteEvent> = events.iter().collect();
    ordered.sort_by_key(|e| e.tick);

    let mut track = Track::new();
    let mut last = 0;
    for event in ordered {
        let delta = u32::try_from(event.tick - last)
            .ok()
            .filter(|&d| d <= MAX_DELTA)
            .ok_or(MidiError::DeltaOverflow { tick: event.tick })?;
        let message = match event.kind {
            NoteKind::On => MidiMessage::NoteOn {
                key: event.note.into(),
                vel: event.velocity.into(),
            },
            NoteKind::Off => MidiMessage::NoteOff {
                key: event.note.into(),
                vel: event.velocity.into(),
            },
        };
        track.push(TrackEvent {
            delta: delta.into(),
            kind: TrackEventKind::Midi {
                channel: 0u8.into(),
                message,
            },
        });
        last = event.tick;
    }
    track.push(TrackEvent {
        delta: 0u32.into(),
        kind: TrackEventKind::Meta(MetaMessage::EndOfTrack),
    });

    let smf = Smf {
        header: Header {
            format: Format::Parallel,
            timing: Timing::Metrical(resolution.into()),
        },
        tracks: vec![track],
    };

    let mut bytes = Vec::new();
    smf.write(&mut bytes)
        .map_err(|e| MidiError::Write(e.to_string()))?;

    log::debug!("encoded {} note events at {} ppq", events.len(), resolution);
    Ok(bytes)
}
