//! Maps voicings onto the reference rhythm
//!
//! Slot `i` of the reference is retextured with voicing `i`. Slots past the end
//! of the progression keep sounding the final voicing.
//!
//! Each stroke of a slot (its notes sharing one onset cluster) sounds the
//! whole voicing. Pitches are taken in priority order (root, third, seventh,
//! extensions, fifth, doublings) and matched to the stroke's notes low to high:
//! - more notes than pitches: the shortest notes are dropped
//! - more pitches than notes: the extra pitches become new notes with the
//!   timing and velocity of the stroke's first note

use super::reader::{ChordSlot, NoteEvent, Reference, ReferenceNote};
use crate::error::MontunoError;
use crate::voicing::Voicing;
use log::{debug, warn};

/// Produce every output note: retextured slots plus passthrough notes, ordered
/// by onset then pitch
pub fn map_voicings(
    reference: &Reference,
    voicings: &[Voicing],
) -> Result<Vec<NoteEvent>, MontunoError> {
    reference.require_slots(voicings.len())?;

    let mut notes: Vec<NoteEvent> = reference.passthrough.clone();
    if let Some(last) = voicings.last() {
        if reference.slot_count() > voicings.len() {
            warn!(
                "{} trailing slots reuse the final voicing",
                reference.slot_count() - voicings.len()
            );
        }
        for slot in &reference.slots {
            let voicing = voicings.get(slot.chord_index).unwrap_or(last);
            notes.extend(retexture_slot(slot, voicing));
        }
    }

    notes.sort_by_key(|n| (n.onset_tick, n.pitch, n.channel));
    Ok(notes)
}

/// Retexture one slot with one voicing, stroke by stroke
pub fn retexture_slot(slot: &ChordSlot, voicing: &Voicing) -> Vec<NoteEvent> {
    if slot.notes.is_empty() {
        debug!("slot {} has no notes", slot.chord_index);
        return Vec::new();
    }

    let pitches = voicing.prioritized();
    let mut out = Vec::new();
    let mut rest = slot.notes.as_slice();
    while let Some(first) = rest.first() {
        let len = rest
            .iter()
            .position(|n| n.stroke != first.stroke)
            .unwrap_or(rest.len());
        let (stroke, tail) = rest.split_at(len);
        out.extend(retexture_stroke(slot.chord_index, stroke, &pitches));
        rest = tail;
    }
    out
}

/// Retexture the notes of one onset cluster. `notes` is not empty.
fn retexture_stroke(chord_index: usize, notes: &[ReferenceNote], pitches: &[u8]) -> Vec<NoteEvent> {
    let Some(template) = notes.first() else {
        return Vec::new();
    };
    let paired = pitches.len().min(notes.len());

    let mut kept: Vec<&ReferenceNote> = notes.iter().collect();
    if kept.len() > paired {
        warn!(
            "slot {} at tick {}: {} reference notes for {} pitches, dropping the {} shortest",
            chord_index,
            template.onset_tick,
            kept.len(),
            pitches.len(),
            kept.len() - paired
        );
        // stable: equal durations keep the earlier note
        kept.sort_by(|a, b| b.duration_ticks.cmp(&a.duration_ticks));
        kept.truncate(paired);
    }
    kept.sort_by_key(|n| (n.original_pitch, n.onset_tick));

    let mut chosen: Vec<u8> = pitches[..paired].to_vec();
    chosen.sort_unstable();

    let mut out: Vec<NoteEvent> = kept
        .iter()
        .zip(&chosen)
        .map(|(note, &pitch)| note.with_pitch(pitch))
        .collect();

    for &pitch in &pitches[paired..] {
        out.push(template.with_pitch(pitch));
    }
    if pitches.len() > paired {
        debug!(
            "slot {}: {} extra pitches added at tick {}",
            chord_index,
            pitches.len() - paired,
            template.onset_tick
        );
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use midly::num::u15;
    use midly::Timing;

    fn note(onset: u64, duration: u64, pitch: u8, chord_index: usize) -> ReferenceNote {
        ReferenceNote {
            onset_tick: onset,
            duration_ticks: duration,
            velocity: 90,
            original_pitch: pitch,
            channel: 0,
            chord_index,
            stroke: 0,
        }
    }

    fn struck(onset: u64, pitch: u8, stroke: usize) -> ReferenceNote {
        ReferenceNote {
            stroke,
            ..note(onset, 200, pitch, 0)
        }
    }

    fn slot(chord_index: usize, notes: Vec<ReferenceNote>) -> ChordSlot {
        ChordSlot { chord_index, notes }
    }

    fn voicing(chord_tones: &[u8], doublings: &[u8]) -> Voicing {
        Voicing {
            root: chord_tones[0],
            chord_tones: chord_tones.to_vec(),
            doublings: doublings.to_vec(),
        }
    }

    fn reference(slots: Vec<ChordSlot>) -> Reference {
        Reference {
            timing: Timing::Metrical(u15::new(480)),
            meta: Vec::new(),
            program: None,
            track_name: None,
            slots,
            passthrough: Vec::new(),
            average_pitch: 60.0,
        }
    }

    fn pitches(notes: &[NoteEvent]) -> Vec<u8> {
        notes.iter().map(|n| n.pitch).collect()
    }

    #[test]
    fn test_equal_counts_pair_low_to_high() {
        let slot = slot(0, vec![note(0, 100, 48, 0), note(0, 100, 55, 0), note(0, 100, 52, 0)]);
        let out = retexture_slot(&slot, &voicing(&[60, 64, 67], &[]));
        assert_eq!(out.len(), 3);
        // lowest reference note gets the lowest pitch
        assert!(out.iter().all(|n| n.onset_tick == 0 && n.duration_ticks == 100));
        let mut sorted = pitches(&out);
        sorted.sort_unstable();
        assert_eq!(sorted, vec![60, 64, 67]);
    }

    #[test]
    fn test_extra_pitches_fan_out_from_first_note() {
        let slot = slot(0, vec![note(120, 240, 60, 0), note(360, 120, 64, 0)]);
        let out = retexture_slot(&slot, &voicing(&[55, 59, 62, 65], &[67]));
        assert_eq!(out.len(), 5);

        // the two highest-priority pitches keep the reference notes
        assert_eq!(out[0].pitch, 55);
        assert_eq!(out[0].onset_tick, 120);
        assert_eq!(out[1].pitch, 59);
        assert_eq!(out[1].onset_tick, 360);

        for added in &out[2..] {
            assert_eq!(added.onset_tick, 120);
            assert_eq!(added.duration_ticks, 240);
            assert_eq!(added.velocity, 90);
        }
        // the seventh outranks the fifth
        assert_eq!(pitches(&out[2..]), vec![65, 62, 67]);
    }

    #[test]
    fn test_shortest_notes_dropped() {
        let slot = slot(
            0,
            vec![
                note(0, 480, 48, 0),
                note(0, 60, 52, 0),
                note(0, 240, 55, 0),
                note(0, 30, 60, 0),
            ],
        );
        let out = retexture_slot(&slot, &voicing(&[57, 60], &[]));
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].duration_ticks, 480);
        assert_eq!(out[0].pitch, 57);
        assert_eq!(out[1].duration_ticks, 240);
        assert_eq!(out[1].pitch, 60);
    }

    #[test]
    fn test_seventh_kept_over_fifth() {
        let slot = slot(0, vec![note(0, 100, 48, 0), note(0, 100, 52, 0), note(0, 100, 55, 0)]);
        let out = retexture_slot(&slot, &voicing(&[60, 64, 67, 71], &[]));
        assert_eq!(pitches(&out), vec![60, 64, 71]);
    }

    #[test]
    fn test_every_stroke_sounds_the_voicing() {
        // four-note strokes on three eighths of one clave group
        let notes: Vec<ReferenceNote> = (0..3)
            .flat_map(|stroke| {
                [43, 45, 48, 52].map(|pitch| struck(stroke as u64 * 240, pitch, stroke))
            })
            .collect();
        let out = retexture_slot(&slot(0, notes), &voicing(&[60, 64, 67, 70], &[]));
        assert_eq!(out.len(), 12);
        for stroke in 0..3u64 {
            let mut at: Vec<u8> = out
                .iter()
                .filter(|n| n.onset_tick == stroke * 240)
                .map(|n| n.pitch)
                .collect();
            at.sort_unstable();
            assert_eq!(at, vec![60, 64, 67, 70]);
        }
    }

    #[test]
    fn test_dropping_stays_inside_a_stroke() {
        // a lone short stroke keeps its note even though a longer stroke
        // fills the voicing
        let notes = vec![
            ReferenceNote { stroke: 0, ..note(0, 400, 48, 0) },
            ReferenceNote { stroke: 0, ..note(0, 400, 52, 0) },
            ReferenceNote { stroke: 1, ..note(240, 20, 55, 0) },
        ];
        let out = retexture_slot(&slot(0, notes), &voicing(&[60, 64], &[]));
        assert_eq!(out.len(), 4);
        assert_eq!(out.iter().filter(|n| n.onset_tick == 240).count(), 2);
        assert!(out.iter().filter(|n| n.onset_tick == 240).all(|n| n.duration_ticks == 20));
    }

    #[test]
    fn test_doublings_dropped_before_chord_tones() {
        let slot = slot(0, vec![note(0, 100, 40, 0), note(0, 100, 80, 0)]);
        let out = retexture_slot(&slot, &voicing(&[60, 64, 67], &[72]));
        assert_eq!(out.len(), 3);
        assert!(!pitches(&out).contains(&72));
    }

    #[test]
    fn test_trailing_slots_reuse_last_voicing() {
        let reference = reference(vec![
            slot(0, vec![note(0, 100, 60, 0)]),
            slot(1, vec![note(480, 100, 60, 1)]),
            slot(2, vec![note(960, 100, 60, 2)]),
        ]);
        let voicings = vec![voicing(&[60], &[]), voicing(&[65], &[])];
        let out = map_voicings(&reference, &voicings).unwrap();
        assert_eq!(pitches(&out), vec![60, 65, 65]);
    }

    #[test]
    fn test_too_few_slots() {
        let reference = reference(vec![slot(0, vec![note(0, 100, 60, 0)])]);
        let voicings = vec![voicing(&[60], &[]), voicing(&[65], &[])];
        assert_eq!(
            map_voicings(&reference, &voicings),
            Err(MontunoError::ReferenceTooShort { needed: 2, found: 1 })
        );
    }

    #[test]
    fn test_passthrough_notes_unchanged() {
        let mut reference = reference(vec![slot(0, vec![note(0, 100, 48, 0)])]);
        let kept = NoteEvent {
            onset_tick: 50,
            duration_ticks: 10,
            velocity: 33,
            pitch: 90,
            channel: 9,
        };
        reference.passthrough.push(kept);
        let out = map_voicings(&reference, &[voicing(&[60], &[])]).unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out[1], kept);
    }

    #[test]
    fn test_empty_slot_sounds_nothing() {
        let out = retexture_slot(&slot(3, Vec::new()), &voicing(&[60, 64], &[]));
        assert!(out.is_empty());
    }
}
