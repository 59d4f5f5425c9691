//! # Public API
//!
//! Entry points for turning a chord progression and a reference MIDI file into
//! a montuno MIDI file.
//!
//! ## Generation Functions
//!
//! - [`generate()`] - Options from the text's front matter, result written to disk
//! - [`generate_with()`] - Explicit mode and options, result written to disk
//! - [`render()`] - Everything in memory: reference bytes in, MIDI bytes out
//!
//! ## Pipeline
//! 1. Parse the progression (fails before any file is touched)
//! 2. Read the reference: chord slots, tempo map, average pitch
//! 3. Voice each chord, carrying the previous voicing forward
//! 4. Map voicings onto the reference slots
//! 5. Encode, then write the file
//!
//! ## Typical Usage
//!
//! ```rust,no_run
//! use montuno::generate;
//!
//! let status = generate("Cmaj7 (8) G7 (10) Am7", "reference.mid", "montuno.mid")?;
//! assert_eq!(status, "MIDI generated: montuno.mid");
//! # Ok::<(), montuno::MontunoError>(())
//! ```

use crate::config::GenerateOptions;
use crate::error::MontunoError;
use crate::midi::{encode, map_voicings, parse_reference, read_reference, write_midi, Reference};
use crate::mode::Mode;
use crate::parser::ProgressionEntry;
use crate::voicing::{voice_progression, Voicing};
use log::info;
use std::path::Path;

/// Result of an in-memory run
#[derive(Debug, Clone)]
pub struct Rendered {
    /// Encoded Standard MIDI File
    pub bytes: Vec<u8>,
    pub entries: Vec<ProgressionEntry>,
    /// One voicing per entry
    pub voicings: Vec<Voicing>,
}

/// Generate a montuno MIDI file.
///
/// Options are read from the progression's front matter. Returns the status
/// message `MIDI generated: <output path>`.
///
/// # Errors
/// Any [`MontunoError`]. On error no output file is left behind.
pub fn generate(
    progression: &str,
    reference_path: impl AsRef<Path>,
    output_path: impl AsRef<Path>,
) -> Result<String, MontunoError> {
    let options = GenerateOptions::from_source(progression)?;
    generate_with(options.mode.mode(), progression, reference_path, output_path, &options)
}

/// Generate a montuno MIDI file with an explicit mode and options. Front
/// matter in `progression` is skipped, not read, and `options.mode` is ignored.
pub fn generate_with(
    mode: &dyn Mode,
    progression: &str,
    reference_path: impl AsRef<Path>,
    output_path: impl AsRef<Path>,
    options: &GenerateOptions,
) -> Result<String, MontunoError> {
    let output_path = output_path.as_ref();

    let entries = mode.parse_progression(progression, options.harmonization)?;
    info!("{} mode: parsed {} chords", mode.name(), entries.len());

    let reference = read_reference(reference_path.as_ref(), &options.reader_options())?;
    let rendered = render_reference(mode, entries, &reference, options)?;

    write_midi(output_path, &rendered.bytes)?;
    Ok(status_message(output_path))
}

/// `MIDI generated: <path>`
pub fn status_message(output_path: &Path) -> String {
    format!("MIDI generated: {}", output_path.display())
}

/// Run the whole pipeline in memory
pub fn render(
    mode: &dyn Mode,
    progression: &str,
    reference: &[u8],
    options: &GenerateOptions,
) -> Result<Rendered, MontunoError> {
    let entries = mode.parse_progression(progression, options.harmonization)?;
    info!("{} mode: parsed {} chords", mode.name(), entries.len());

    let reference = parse_reference(reference, &options.reader_options())?;
    render_reference(mode, entries, &reference, options)
}

fn render_reference(
    mode: &dyn Mode,
    entries: Vec<ProgressionEntry>,
    reference: &Reference,
    options: &GenerateOptions,
) -> Result<Rendered, MontunoError> {
    reference.require_slots(entries.len())?;

    let context = options.voicing_context(reference.average_pitch);
    let voicings = voice_progression(mode, &entries, &context)?;
    let notes = map_voicings(reference, &voicings)?;
    info!(
        "mapped {} chords onto {} slots: {} notes",
        voicings.len(),
        reference.slot_count(),
        notes.len()
    );

    let bytes = encode(reference, &notes)?;
    Ok(Rendered {
        bytes,
        entries,
        voicings,
    })
}
