//! MIDI output
//!
//! Encodes the mapped notes as a format-1 Standard MIDI File with the
//! reference's time division. Track 0 carries the reference's tempo, time
//! signature and key signature events; track 1 carries the notes.
//!
//! The whole file is encoded in memory first, so a failure never leaves a
//! half-written file behind.

use super::reader::{MetaEvent, NoteEvent, Reference};
use crate::error::MontunoError;
use log::info;
use midly::{
    num::{u24, u28, u4, u7},
    Format, Header, MetaMessage, MidiMessage, Smf, Track, TrackEvent, TrackEventKind,
};
use std::path::Path;

/// Track name used when the reference does not name one
pub const DEFAULT_TRACK_NAME: &str = "Montuno";

/// Largest delta time a track event can carry (28 bits)
const MAX_DELTA: u64 = (1 << 28) - 1;

impl MetaEvent {
    fn to_kind(self) -> TrackEventKind<'static> {
        let message = match self {
            MetaEvent::Tempo(tempo) => MetaMessage::Tempo(u24::new(tempo)),
            MetaEvent::TimeSignature(num, den, clocks, notated) => {
                MetaMessage::TimeSignature(num, den, clocks, notated)
            }
            MetaEvent::KeySignature(key, minor) => MetaMessage::KeySignature(key, minor),
        };
        TrackEventKind::Meta(message)
    }
}

/// Encode `notes` into SMF bytes
pub fn encode(reference: &Reference, notes: &[NoteEvent]) -> Result<Vec<u8>, MontunoError> {
    let smf = to_smf(reference, notes)?;
    let mut buf = Vec::new();
    smf.write(&mut buf).map_err(|e| encode_error(e.to_string()))?;
    Ok(buf)
}

fn encode_error(message: String) -> MontunoError {
    MontunoError::WriteError {
        path: "<memory>".to_string(),
        message,
    }
}

/// Write encoded bytes to `path`, removing any partial file on failure
pub fn write_midi(path: &Path, bytes: &[u8]) -> Result<(), MontunoError> {
    if let Err(e) = std::fs::write(path, bytes) {
        let _ = std::fs::remove_file(path);
        return Err(MontunoError::WriteError {
            path: path.display().to_string(),
            message: e.to_string(),
        });
    }
    info!("wrote {} bytes to {}", bytes.len(), path.display());
    Ok(())
}

fn to_smf<'a>(reference: &'a Reference, notes: &[NoteEvent]) -> Result<Smf<'a>, MontunoError> {
    let mut smf = Smf::new(Header::new(Format::Parallel, reference.timing));

    let conductor: Vec<(u64, u8, TrackEventKind<'a>)> = reference
        .meta
        .iter()
        .map(|&(tick, event)| (tick, 0, event.to_kind()))
        .collect();
    smf.tracks.push(to_track(conductor)?);

    let name = reference
        .track_name
        .as_deref()
        .unwrap_or(DEFAULT_TRACK_NAME);
    let mut events: Vec<(u64, u8, TrackEventKind<'a>)> =
        vec![(0, 0, TrackEventKind::Meta(MetaMessage::TrackName(name.as_bytes())))];

    if let Some((channel, program)) = reference.program {
        events.push((
            0,
            1,
            TrackEventKind::Midi {
                channel: u4::new(channel),
                message: MidiMessage::ProgramChange {
                    program: u7::new(program),
                },
            },
        ));
    }

    for note in notes {
        let channel = u4::new(note.channel);
        let key = u7::new(note.pitch);
        events.push((
            note.onset_tick,
            3,
            TrackEventKind::Midi {
                channel,
                message: MidiMessage::NoteOn {
                    key,
                    vel: u7::new(note.velocity),
                },
            },
        ));
        // a zero-length note is released after it sounds, not before
        let off_rank = if note.duration_ticks == 0 { 4 } else { 2 };
        events.push((
            note.onset_tick + note.duration_ticks,
            off_rank,
            TrackEventKind::Midi {
                channel,
                message: MidiMessage::NoteOff { key, vel: u7::new(0) },
            },
        ));
    }
    smf.tracks.push(to_track(events)?);

    Ok(smf)
}

/// Order absolute-tick events and convert them to delta times. At equal ticks
/// lower ranks go first, so a note-off (2) precedes a note-on (3) unless it
/// ends a zero-length note (4).
fn to_track<'a>(
    mut events: Vec<(u64, u8, TrackEventKind<'a>)>,
) -> Result<Track<'a>, MontunoError> {
    events.sort_by_key(|&(tick, rank, _)| (tick, rank));

    let mut track: Track<'a> = Vec::with_capacity(events.len() + 1);
    let mut last_tick = 0u64;
    for (tick, _, kind) in events {
        let delta = tick - last_tick;
        if delta > MAX_DELTA {
            return Err(encode_error(format!(
                "gap of {} ticks at tick {} exceeds the MIDI delta-time range",
                delta, tick
            )));
        }
        track.push(TrackEvent {
            delta: u28::new(delta as u32),
            kind,
        });
        last_tick = tick;
    }
    track.push(TrackEvent {
        delta: u28::new(0),
        kind: TrackEventKind::Meta(MetaMessage::EndOfTrack),
    });
    Ok(track)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::midi::reader::{parse_reference, ReaderOptions};
    use midly::num::u15;
    use midly::Timing;

    fn reference() -> Reference {
        Reference {
            timing: Timing::Metrical(u15::new(96)),
            meta: vec![
                (0, MetaEvent::Tempo(600_000)),
                (0, MetaEvent::TimeSignature(4, 2, 24, 8)),
                (0, MetaEvent::KeySignature(-1, false)),
            ],
            program: Some((0, 0)),
            track_name: None,
            slots: Vec::new(),
            passthrough: Vec::new(),
            average_pitch: 60.0,
        }
    }

    fn note(onset: u64, duration: u64, pitch: u8) -> NoteEvent {
        NoteEvent {
            onset_tick: onset,
            duration_ticks: duration,
            velocity: 100,
            pitch,
            channel: 0,
        }
    }

    #[test]
    fn test_two_tracks_and_timing() {
        let bytes = encode(&reference(), &[note(0, 96, 60), note(96, 96, 64)]).unwrap();
        let smf = Smf::parse(&bytes).unwrap();
        assert_eq!(smf.header.format, Format::Parallel);
        assert_eq!(smf.header.timing, Timing::Metrical(u15::new(96)));
        assert_eq!(smf.tracks.len(), 2);

        let conductor = &smf.tracks[0];
        assert!(conductor
            .iter()
            .any(|e| e.kind == TrackEventKind::Meta(MetaMessage::Tempo(u24::new(600_000)))));
        assert!(conductor
            .iter()
            .any(|e| e.kind == TrackEventKind::Meta(MetaMessage::KeySignature(-1, false))));
        assert_eq!(
            smf.tracks[1][0].kind,
            TrackEventKind::Meta(MetaMessage::TrackName(DEFAULT_TRACK_NAME.as_bytes()))
        );
    }

    #[test]
    fn test_note_off_before_note_on_at_same_tick() {
        let bytes = encode(&reference(), &[note(0, 96, 60), note(96, 96, 60)]).unwrap();
        let smf = Smf::parse(&bytes).unwrap();
        let messages: Vec<MidiMessage> = smf.tracks[1]
            .iter()
            .filter_map(|e| match e.kind {
                TrackEventKind::Midi {
                    message: m @ (MidiMessage::NoteOn { .. } | MidiMessage::NoteOff { .. }),
                    ..
                } => Some(m),
                _ => None,
            })
            .collect();
        assert!(matches!(messages[0], MidiMessage::NoteOn { .. }));
        assert!(matches!(messages[1], MidiMessage::NoteOff { .. }));
        assert!(matches!(messages[2], MidiMessage::NoteOn { .. }));
        assert!(matches!(messages[3], MidiMessage::NoteOff { .. }));
    }

    #[test]
    fn test_output_reads_back_as_reference() {
        let notes = [note(0, 48, 55), note(0, 48, 59), note(48, 24, 62)];
        let bytes = encode(&reference(), &notes).unwrap();
        let reread = parse_reference(&bytes, &ReaderOptions::default()).unwrap();
        assert_eq!(reread.slot_count(), 2);
        assert_eq!(reread.slots[0].notes.len(), 2);
        assert_eq!(reread.slots[1].notes[0].duration_ticks, 24);
        assert_eq!(reread.program, Some((0, 0)));
        assert_eq!(reread.track_name.as_deref(), Some(DEFAULT_TRACK_NAME));
    }

    #[test]
    fn test_zero_length_notes_released_after_onset() {
        let notes = [note(0, 0, 50), note(0, 0, 52), note(96, 96, 60), note(96, 96, 64)];
        let bytes = encode(&reference(), &notes).unwrap();

        let smf = Smf::parse(&bytes).unwrap();
        let first: Vec<MidiMessage> = smf.tracks[1]
            .iter()
            .filter_map(|e| match e.kind {
                TrackEventKind::Midi { message, .. } => Some(message),
                _ => None,
            })
            .skip(1)
            .take(4)
            .collect();
        assert!(matches!(first[0], MidiMessage::NoteOn { .. }));
        assert!(matches!(first[1], MidiMessage::NoteOn { .. }));
        assert!(matches!(first[2], MidiMessage::NoteOff { .. }));
        assert!(matches!(first[3], MidiMessage::NoteOff { .. }));

        let reread = parse_reference(&bytes, &ReaderOptions::default()).unwrap();
        assert_eq!(reread.slot_count(), 2);
        assert_eq!(reread.slots[0].notes.len(), 2);
        assert!(reread.slots[0].notes.iter().all(|n| n.duration_ticks == 0));
        assert_eq!(reread.slots[1].notes.len(), 2);
        assert!(reread.slots[1].notes.iter().all(|n| n.duration_ticks == 96));
    }

    #[test]
    fn test_gap_beyond_delta_range_fails() {
        let far = note(1 << 29, 96, 60);
        let result = encode(&reference(), &[note(0, 96, 60), far]);
        assert!(matches!(
            result,
            Err(MontunoError::WriteError { ref path, .. }) if path == "<memory>"
        ));
    }

    #[test]
    fn test_write_to_missing_directory_fails() {
        let path = std::env::temp_dir()
            .join("montuno-missing-dir-for-writer-test")
            .join("out.mid");
        let result = write_midi(&path, b"MThd");
        assert!(matches!(result, Err(MontunoError::WriteError { .. })));
        assert!(!path.exists());
    }
}
