//! # Linked Voicing Engine
//!
//! Converts each [`ProgressionEntry`] into a concrete [`Voicing`]: a set of
//! absolute MIDI pitches linked to the voicing of the chord before it.
//!
//! ## Algorithm
//! 1. **Chord tones**: root, quality tone (third, or the 2nd/4th of a sus
//!    chord), fifth, seventh when the quality has one, written extensions.
//! 2. **Placement**: candidates are the root-position stacks of those tones at
//!    every octave that keeps all chord tones inside the register.
//!    - The first chord takes the candidate whose root is nearest the
//!      reference's average pitch.
//!    - Later chords take the candidate with the least total movement: each new
//!      tone is measured against the nearest previous chord tone not already
//!      claimed by a lower tone.
//!    - Ties prefer the lower candidate.
//! 3. **Doublings**: every active directive adds one tone above the placed
//!    root (octave, double octave, tenth, thirteenth). Tenths and thirteenths
//!    are major or minor following the chord's third.
//! 4. **Deduplication**: a doubling that coincides with a chord tone is not
//!    added twice.
//!
//! Linking only looks at chord tones, so switching a directive on does not
//! drag the following chords up or down.
//!
//! The whole progression is voiced by [`voice_progression`], an explicit fold
//! carrying the previous voicing as its accumulator.

use crate::chord::pitch_name;
use crate::error::MontunoError;
use crate::interval::INTERVALS;
use crate::mode::Mode;
use crate::parser::ProgressionEntry;
use log::debug;
use serde::Serialize;

/// Fallback register anchor when the reference has no notes (C4)
pub const DEFAULT_ANCHOR: f64 = 60.0;

/// Concrete pitches sounded for one chord
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Voicing {
    /// Absolute pitch of the root
    pub root: u8,
    /// Chord tones, ascending
    pub chord_tones: Vec<u8>,
    /// Directive-implied doublings in directive order, none equal to a chord tone
    pub doublings: Vec<u8>,
}

impl Voicing {
    /// All pitches, ascending
    pub fn pitches(&self) -> Vec<u8> {
        let mut pitches: Vec<u8> = self
            .chord_tones
            .iter()
            .chain(&self.doublings)
            .copied()
            .collect();
        pitches.sort_unstable();
        pitches.dedup();
        pitches
    }

    /// Pitches in the order they should survive when a slot has fewer notes:
    /// root, third (or suspension), seventh, extensions, fifth, then doublings
    pub fn prioritized(&self) -> Vec<u8> {
        let mut tones = self.chord_tones.clone();
        tones.sort_by_key(|&pitch| (tone_rank(pitch - self.root), pitch));
        tones.extend(&self.doublings);
        tones
    }

    pub fn len(&self) -> usize {
        self.chord_tones.len() + self.doublings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chord_tones.is_empty()
    }

    /// Note names, ascending (`["C4", "E4", "G4"]`)
    pub fn note_names(&self) -> Vec<String> {
        self.pitches().into_iter().map(pitch_name).collect()
    }
}

/// Survival rank of a chord tone by its offset above the root. The fifth adds
/// the least color so it goes first.
fn tone_rank(offset: u8) -> u8 {
    match offset {
        0 => 0,
        1..=5 => 1,
        9..=11 => 2,
        12..=u8::MAX => 3,
        _ => 4,
    }
}

/// Pitch range the chord tones must fit in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Register {
    pub low: u8,
    pub high: u8,
}

impl Default for Register {
    fn default() -> Self {
        Self { low: 0, high: 127 }
    }
}

/// Inputs to voicing that come from outside the progression
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VoicingContext {
    /// Average pitch of the reference, used to place the first chord
    pub anchor: f64,
    pub register: Register,
}

impl Default for VoicingContext {
    fn default() -> Self {
        Self {
            anchor: DEFAULT_ANCHOR,
            register: Register::default(),
        }
    }
}

/// Voice a whole progression, carrying each voicing into the next call
pub fn voice_progression(
    mode: &dyn Mode,
    entries: &[ProgressionEntry],
    context: &VoicingContext,
) -> Result<Vec<Voicing>, MontunoError> {
    entries
        .iter()
        .try_fold(Vec::with_capacity(entries.len()), |mut voicings, entry| {
            let voicing = mode.compute_voicing(entry, voicings.last(), context)?;
            debug!(
                "{} ({}) [{}] -> {}",
                entry.symbol,
                entry.chord,
                entry.directives,
                voicing.note_names().join(" ")
            );
            voicings.push(voicing);
            Ok(voicings)
        })
}

/// Voicing of one chord in the traditional style
pub fn compute_voicing(
    entry: &ProgressionEntry,
    previous: Option<&Voicing>,
    context: &VoicingContext,
) -> Result<Voicing, MontunoError> {
    let chord = &entry.chord;
    let offsets = chord.tone_offsets();
    let roots = candidate_roots(chord.root, &offsets, context.register);

    let root = match previous {
        None => place_near_anchor(&roots, context.anchor),
        Some(previous) => place_linked(&roots, &offsets, &previous.chord_tones),
    };

    let chord_tones: Vec<u8> = offsets.iter().map(|offset| root + offset).collect();

    let flavor = chord.quality.flavor();
    let mut doublings: Vec<u8> = Vec::new();
    for directive in entry.directives.iter() {
        let interval = INTERVALS.lookup(directive.interval_name(), flavor)?;
        let pitch = root as u16 + interval as u16;
        if pitch > 127 {
            debug!("{} doubling above the MIDI range skipped", directive.token());
            continue;
        }
        let pitch = pitch as u8;
        if !chord_tones.contains(&pitch) && !doublings.contains(&pitch) {
            doublings.push(pitch);
        }
    }

    Ok(Voicing {
        root,
        chord_tones,
        doublings,
    })
}

/// Every root pitch whose stack fits the register, ascending. Falls back to the
/// full MIDI range when the register is too narrow for the chord.
fn candidate_roots(pitch_class: u8, offsets: &[u8], register: Register) -> Vec<u8> {
    let span = offsets.last().copied().unwrap_or(0);
    let fits = |root: u8, low: u8, high: u8| root >= low && root as u16 + span as u16 <= high as u16;

    let all: Vec<u8> = (pitch_class..=127)
        .step_by(12)
        .filter(|&root| fits(root, 0, 127))
        .collect();
    let in_register: Vec<u8> = all
        .iter()
        .copied()
        .filter(|&root| fits(root, register.low, register.high))
        .collect();

    if in_register.is_empty() {
        all
    } else {
        in_register
    }
}

/// Root nearest the anchor, lower on ties
fn place_near_anchor(roots: &[u8], anchor: f64) -> u8 {
    let mut best = roots[0];
    for &root in &roots[1..] {
        if (root as f64 - anchor).abs() < (best as f64 - anchor).abs() {
            best = root;
        }
    }
    best
}

/// Root whose stack moves least from the previous chord tones, lower on ties
fn place_linked(roots: &[u8], offsets: &[u8], previous: &[u8]) -> u8 {
    let mut best = roots[0];
    let mut best_cost = u32::MAX;
    for &root in roots {
        let tones: Vec<u8> = offsets.iter().map(|offset| root + offset).collect();
        let cost = movement(&tones, previous);
        if cost < best_cost {
            best = root;
            best_cost = cost;
        }
    }
    best
}

/// Total semitone movement from `previous` to `tones`.
///
/// Tones are taken from the lowest up; each one is charged the distance to the
/// nearest previous pitch not yet claimed. Once every previous pitch is claimed
/// the remaining tones are charged against the nearest one overall.
pub fn movement(tones: &[u8], previous: &[u8]) -> u32 {
    if previous.is_empty() {
        return 0;
    }
    let mut claimed = vec![false; previous.len()];
    let mut total = 0;
    for &tone in tones {
        let nearest = previous
            .iter()
            .enumerate()
            .filter(|(i, _)| !claimed[*i])
            .min_by_key(|(_, &p)| (p.abs_diff(tone), p))
            .map(|(i, &p)| (i, p));
        match nearest {
            Some((i, p)) => {
                claimed[i] = true;
                total += p.abs_diff(tone) as u32;
            }
            None => {
                total += previous
                    .iter()
                    .map(|p| p.abs_diff(tone) as u32)
                    .min()
                    .unwrap_or(0);
            }
        }
    }
    total
}
