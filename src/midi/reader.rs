//! Reference MIDI reader
//!
//! Pulls the timing skeleton out of a reference Standard MIDI File: every note
//! (paired note-on/note-off across all tracks), grouped into chord slots, plus
//! the tempo map and instrument details the output should keep.

use super::clave::Clave;
use crate::error::MontunoError;
use crate::voicing::DEFAULT_ANCHOR;
use log::{debug, info};
use midly::{MetaMessage, MidiMessage, Smf, Timing, TrackEventKind};
use std::collections::HashMap;
use std::path::Path;

/// A note of the reference that belongs to a chord slot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceNote {
    pub onset_tick: u64,
    pub duration_ticks: u64,
    pub velocity: u8,
    pub original_pitch: u8,
    pub channel: u8,
    /// Progression entry this note will be retextured with
    pub chord_index: usize,
    /// Onset cluster within the slot. Every stroke sounds the whole voicing.
    pub stroke: usize,
}

impl ReferenceNote {
    /// The same note sounding another pitch
    pub fn with_pitch(&self, pitch: u8) -> NoteEvent {
        NoteEvent {
            onset_tick: self.onset_tick,
            duration_ticks: self.duration_ticks,
            velocity: self.velocity,
            pitch,
            channel: self.channel,
        }
    }
}

/// A note as written to the output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoteEvent {
    pub onset_tick: u64,
    pub duration_ticks: u64,
    pub velocity: u8,
    pub pitch: u8,
    pub channel: u8,
}

/// One chord position of the reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChordSlot {
    pub chord_index: usize,
    /// Notes ordered by onset, then pitch
    pub notes: Vec<ReferenceNote>,
}

/// Meta events copied to the output's conductor track
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetaEvent {
    /// Microseconds per quarter note
    Tempo(u32),
    TimeSignature(u8, u8, u8, u8),
    KeySignature(i8, bool),
}

/// How reference notes are grouped into chord slots
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotGrouping {
    /// One slot per cluster of notes starting within `tolerance` ticks of the
    /// cluster's first onset
    Onsets { tolerance: u32 },
    /// One slot per clave group of eighth notes. Inside a group, notes
    /// starting within `tolerance` ticks of each other form one stroke.
    Clave { clave: Clave, tolerance: u32 },
}

impl Default for SlotGrouping {
    fn default() -> Self {
        SlotGrouping::Onsets { tolerance: 0 }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReaderOptions {
    pub grouping: SlotGrouping,
    /// Only these reference pitches are retextured; all others pass through.
    /// `None` retextures every note.
    pub retexture_pitches: Option<Vec<u8>>,
}

/// Everything the pipeline needs from the reference file
#[derive(Debug, Clone)]
pub struct Reference {
    pub timing: Timing,
    /// (tick, event), in tick order
    pub meta: Vec<(u64, MetaEvent)>,
    /// First program change as (channel, program)
    pub program: Option<(u8, u8)>,
    pub track_name: Option<String>,
    pub slots: Vec<ChordSlot>,
    /// Notes that are copied to the output unchanged
    pub passthrough: Vec<NoteEvent>,
    /// Mean pitch of every note in the file
    pub average_pitch: f64,
}

impl Reference {
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Fail unless there is a slot for each of `needed` chords
    pub fn require_slots(&self, needed: usize) -> Result<(), MontunoError> {
        if self.slots.len() < needed {
            return Err(MontunoError::ReferenceTooShort {
                needed,
                found: self.slots.len(),
            });
        }
        Ok(())
    }
}

/// Read and analyze a reference file
pub fn read_reference(path: &Path, options: &ReaderOptions) -> Result<Reference, MontunoError> {
    let bytes = std::fs::read(path).map_err(|e| {
        MontunoError::UnreadableReference(format!("{}: {}", path.display(), e))
    })?;
    parse_reference(&bytes, options)
}

/// Analyze reference MIDI bytes
pub fn parse_reference(bytes: &[u8], options: &ReaderOptions) -> Result<Reference, MontunoError> {
    let smf = Smf::parse(bytes).map_err(|e| MontunoError::UnreadableReference(e.to_string()))?;

    let mut notes: Vec<NoteEvent> = Vec::new();
    let mut meta: Vec<(u64, MetaEvent)> = Vec::new();
    let mut program: Option<(u8, u8)> = None;
    let mut track_name: Option<String> = None;

    for (track_index, track) in smf.tracks.iter().enumerate() {
        // (channel, key) -> onsets still sounding, oldest first
        let mut sounding: HashMap<(u8, u8), Vec<(u64, u8)>> = HashMap::new();
        let mut tick: u64 = 0;

        for event in track {
            tick += event.delta.as_int() as u64;
            match event.kind {
                TrackEventKind::Midi { channel, message } => {
                    let channel = channel.as_int();
                    match message {
                        MidiMessage::NoteOn { key, vel } if vel.as_int() > 0 => {
                            sounding
                                .entry((channel, key.as_int()))
                                .or_default()
                                .push((tick, vel.as_int()));
                        }
                        MidiMessage::NoteOn { key, .. } | MidiMessage::NoteOff { key, .. } => {
                            let pitch = key.as_int();
                            if let Some(onsets) = sounding.get_mut(&(channel, pitch)) {
                                if !onsets.is_empty() {
                                    let (onset, velocity) = onsets.remove(0);
                                    notes.push(NoteEvent {
                                        onset_tick: onset,
                                        duration_ticks: tick - onset,
                                        velocity,
                                        pitch,
                                        channel,
                                    });
                                }
                            }
                        }
                        MidiMessage::ProgramChange { program: p } => {
                            program.get_or_insert((channel, p.as_int()));
                        }
                        _ => {}
                    }
                }
                TrackEventKind::Meta(MetaMessage::Tempo(tempo)) => {
                    meta.push((tick, MetaEvent::Tempo(tempo.as_int())));
                }
                TrackEventKind::Meta(MetaMessage::TimeSignature(num, den, clocks, notated)) => {
                    meta.push((tick, MetaEvent::TimeSignature(num, den, clocks, notated)));
                }
                TrackEventKind::Meta(MetaMessage::KeySignature(key, minor)) => {
                    meta.push((tick, MetaEvent::KeySignature(key, minor)));
                }
                TrackEventKind::Meta(MetaMessage::TrackName(name)) => {
                    let name = String::from_utf8_lossy(name).trim().to_string();
                    if track_name.is_none() && !name.is_empty() {
                        track_name = Some(name);
                    }
                }
                _ => {}
            }
        }

        // Notes never released end with their track
        for ((channel, pitch), onsets) in sounding {
            for (onset, velocity) in onsets {
                debug!("track {}: unterminated note {} closed at track end", track_index, pitch);
                notes.push(NoteEvent {
                    onset_tick: onset,
                    duration_ticks: tick - onset,
                    velocity,
                    pitch,
                    channel,
                });
            }
        }
    }

    notes.sort_by_key(|n| (n.onset_tick, n.pitch, n.channel));
    meta.sort_by_key(|(tick, _)| *tick);

    let average_pitch = if notes.is_empty() {
        DEFAULT_ANCHOR
    } else {
        notes.iter().map(|n| n.pitch as f64).sum::<f64>() / notes.len() as f64
    };

    let (retextured, passthrough): (Vec<NoteEvent>, Vec<NoteEvent>) =
        notes.into_iter().partition(|n| match &options.retexture_pitches {
            Some(pitches) => pitches.contains(&n.pitch),
            None => true,
        });

    let slots = match options.grouping {
        SlotGrouping::Onsets { tolerance } => group_by_onset(&retextured, tolerance),
        SlotGrouping::Clave { clave, tolerance } => {
            let ticks_per_eighth = match smf.header.timing {
                Timing::Metrical(tpq) if tpq.as_int() >= 2 => tpq.as_int() as u64 / 2,
                _ => {
                    return Err(MontunoError::ConfigError(
                        "clave grouping needs a reference with metrical (ticks per beat) timing"
                            .to_string(),
                    ))
                }
            };
            group_by_clave(&retextured, clave, ticks_per_eighth, tolerance)
        }
    };

    info!(
        "reference: {} chord slots, {} passthrough notes, average pitch {:.1}",
        slots.len(),
        passthrough.len(),
        average_pitch
    );

    Ok(Reference {
        timing: smf.header.timing,
        meta,
        program,
        track_name,
        slots,
        passthrough,
        average_pitch,
    })
}

fn slot_note(note: &NoteEvent, chord_index: usize, stroke: usize) -> ReferenceNote {
    ReferenceNote {
        onset_tick: note.onset_tick,
        duration_ticks: note.duration_ticks,
        velocity: note.velocity,
        original_pitch: note.pitch,
        channel: note.channel,
        chord_index,
        stroke,
    }
}

/// Cluster notes (sorted by onset) whose onsets fall within `tolerance` of the
/// cluster's first onset
fn group_by_onset(notes: &[NoteEvent], tolerance: u32) -> Vec<ChordSlot> {
    let mut slots: Vec<ChordSlot> = Vec::new();
    let mut cluster_start = 0u64;
    for note in notes {
        let starts_new = match slots.last() {
            None => true,
            Some(_) => note.onset_tick > cluster_start + tolerance as u64,
        };
        if starts_new {
            cluster_start = note.onset_tick;
            slots.push(ChordSlot {
                chord_index: slots.len(),
                notes: Vec::new(),
            });
        }
        let slot = slots.len() - 1;
        slots[slot].notes.push(slot_note(note, slot, 0));
    }
    slots
}

/// One slot per clave group up to the group holding the last note. Groups
/// without notes still take up a chord.
fn group_by_clave(
    notes: &[NoteEvent],
    clave: Clave,
    ticks_per_eighth: u64,
    tolerance: u32,
) -> Vec<ChordSlot> {
    let mut slots: Vec<ChordSlot> = Vec::new();
    // (stroke index, first onset of the stroke) per slot
    let mut strokes: Vec<(usize, u64)> = Vec::new();
    for note in notes {
        let eighth = (note.onset_tick + ticks_per_eighth / 2) / ticks_per_eighth;
        let group = clave.group_of(eighth);
        while slots.len() <= group {
            slots.push(ChordSlot {
                chord_index: slots.len(),
                notes: Vec::new(),
            });
            strokes.push((0, note.onset_tick));
        }

        let (stroke, start) = &mut strokes[group];
        if slots[group].notes.is_empty() {
            *start = note.onset_tick;
        } else if note.onset_tick > *start + tolerance as u64 {
            *stroke += 1;
            *start = note.onset_tick;
        }
        slots[group].notes.push(slot_note(note, group, *stroke));
    }
    slots
}
