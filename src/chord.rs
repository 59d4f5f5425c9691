//! Chord symbol parsing
//!
//! Parses lead-sheet chord symbols (`C`, `Am7`, `G7(b9)`, `F∆`, `Bbø`, ...) into
//! a root pitch class, a [`Quality`] and a list of [`Extension`]s.
//!
//! # Supported Qualities
//! - **Major**: `C`, `Cmaj` → root, major 3rd, perfect 5th
//! - **Minor**: `m`, `min`, `-` → root, minor 3rd, perfect 5th
//! - **Dominant 7th**: `7` → major triad + minor 7th
//! - **Major 7th**: `maj7`, `M7`, `∆` → major triad + major 7th
//! - **Minor 7th**: `m7`, `min7`, `-7` → minor triad + minor 7th
//! - **Diminished**: `dim`, `º`, `°` (triad), `dim7`, `º7`, `°7` (full)
//! - **Half-diminished**: `ø`, `m7b5`
//! - **Augmented**: `aug`, `+`, `+7`, `aug7`
//! - **Sixths**: `6`, `m6`
//! - **Suspended**: `sus2`, `sus4`, `7sus2`, `7sus4`, `∆sus2`, `∆sus4`
//! - **Altered fifths**: `7(b5)`, `∆(b5)`
//!
//! # Extensions
//! Any of `9`, `b9`, `#9`, `11`, `#11`, `13`, `b13`, optionally in parentheses,
//! after the quality: `G7(b9)`, `C7#11`, `Dm9`. A natural extension written on a
//! bare triad implies the seventh, so `C9` is a dominant ninth.

use crate::error::MontunoError;
use crate::interval::Flavor;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Quality {
    Major,
    Minor,
    Dominant7,
    Major7,
    Minor7,
    Diminished,
    Diminished7,
    HalfDiminished,
    Augmented,
    Augmented7,
    Major6,
    Minor6,
    MinorMajor7,
    Sus2,
    Sus4,
    Dominant7Sus2,
    Dominant7Sus4,
    Major7Sus2,
    Major7Sus4,
    Dominant7Flat5,
    Major7Flat5,
}

impl Quality {
    /// Semitone offsets of the chord tones above the root
    pub fn intervals(self) -> &'static [u8] {
        match self {
            Quality::Major => &[0, 4, 7],
            Quality::Minor => &[0, 3, 7],
            Quality::Dominant7 => &[0, 4, 7, 10],
            Quality::Major7 => &[0, 4, 7, 11],
            Quality::Minor7 => &[0, 3, 7, 10],
            Quality::Diminished => &[0, 3, 6],
            Quality::Diminished7 => &[0, 3, 6, 9],
            Quality::HalfDiminished => &[0, 3, 6, 10],
            Quality::Augmented => &[0, 4, 8],
            Quality::Augmented7 => &[0, 4, 8, 10],
            Quality::Major6 => &[0, 4, 7, 9],
            Quality::Minor6 => &[0, 3, 7, 9],
            Quality::MinorMajor7 => &[0, 3, 7, 11],
            Quality::Sus2 => &[0, 2, 7],
            Quality::Sus4 => &[0, 5, 7],
            Quality::Dominant7Sus2 => &[0, 2, 7, 10],
            Quality::Dominant7Sus4 => &[0, 5, 7, 10],
            Quality::Major7Sus2 => &[0, 2, 7, 11],
            Quality::Major7Sus4 => &[0, 5, 7, 11],
            Quality::Dominant7Flat5 => &[0, 4, 6, 10],
            Quality::Major7Flat5 => &[0, 4, 6, 11],
        }
    }

    /// Canonical suffix as written after the root
    pub fn suffix(self) -> &'static str {
        match self {
            Quality::Major => "",
            Quality::Minor => "m",
            Quality::Dominant7 => "7",
            Quality::Major7 => "maj7",
            Quality::Minor7 => "m7",
            Quality::Diminished => "dim",
            Quality::Diminished7 => "dim7",
            Quality::HalfDiminished => "m7b5",
            Quality::Augmented => "aug",
            Quality::Augmented7 => "aug7",
            Quality::Major6 => "6",
            Quality::Minor6 => "m6",
            Quality::MinorMajor7 => "mMaj7",
            Quality::Sus2 => "sus2",
            Quality::Sus4 => "sus4",
            Quality::Dominant7Sus2 => "7sus2",
            Quality::Dominant7Sus4 => "7sus4",
            Quality::Major7Sus2 => "maj7sus2",
            Quality::Major7Sus4 => "maj7sus4",
            Quality::Dominant7Flat5 => "7(b5)",
            Quality::Major7Flat5 => "maj7(b5)",
        }
    }

    /// Minor when the chord's third is minor; suspended chords count as major
    pub fn flavor(self) -> Flavor {
        if self.intervals()[1] == 3 {
            Flavor::Minor
        } else {
            Flavor::Major
        }
    }

    /// The seventh-chord form a bare triad takes when a ninth, eleventh or
    /// thirteenth is written on it
    fn with_implied_seventh(self, major_seventh: bool) -> Self {
        match self {
            Quality::Major if major_seventh => Quality::Major7,
            Quality::Major => Quality::Dominant7,
            Quality::Minor => Quality::Minor7,
            Quality::Sus4 => Quality::Dominant7Sus4,
            Quality::Sus2 => Quality::Dominant7Sus2,
            Quality::Augmented => Quality::Augmented7,
            other => other,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Extension {
    FlatNinth,
    Ninth,
    SharpNinth,
    Eleventh,
    SharpEleventh,
    FlatThirteenth,
    Thirteenth,
}

impl Extension {
    /// Offset in semitones above the root (compound, above the octave)
    pub fn offset(self) -> u8 {
        match self {
            Extension::FlatNinth => 13,
            Extension::Ninth => 14,
            Extension::SharpNinth => 15,
            Extension::Eleventh => 17,
            Extension::SharpEleventh => 18,
            Extension::FlatThirteenth => 20,
            Extension::Thirteenth => 21,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Extension::FlatNinth => "b9",
            Extension::Ninth => "9",
            Extension::SharpNinth => "#9",
            Extension::Eleventh => "11",
            Extension::SharpEleventh => "#11",
            Extension::FlatThirteenth => "b13",
            Extension::Thirteenth => "13",
        }
    }

    fn is_natural(self) -> bool {
        matches!(self, Extension::Ninth | Extension::Eleventh | Extension::Thirteenth)
    }
}

/// A parsed chord symbol
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Chord {
    /// Pitch class of the root, 0 = C
    pub root: u8,
    pub quality: Quality,
    pub extensions: Vec<Extension>,
}

impl Chord {
    /// Offsets of every chord tone above the root, ascending and unique
    pub fn tone_offsets(&self) -> Vec<u8> {
        let mut offsets: Vec<u8> = self.quality.intervals().to_vec();
        offsets.extend(self.extensions.iter().map(|e| e.offset()));
        offsets.sort_unstable();
        offsets.dedup();
        offsets
    }
}

impl fmt::Display for Chord {
    /// Lead-sheet spelling that `parse_chord` reads back: `G7(b9)`, `A#m7`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", pitch_class_name(self.root), self.quality.suffix())?;
        if !self.extensions.is_empty() {
            let written: Vec<&str> = self.extensions.iter().map(|e| e.symbol()).collect();
            write!(f, "({})", written.join(","))?;
        }
        Ok(())
    }
}

/// Quality suffixes. Matched longest-first, so `m7` wins over `m` and `7`.
const SUFFIXES: &[(&str, Quality)] = &[
    ("", Quality::Major),
    ("maj", Quality::Major),
    ("M", Quality::Major),
    ("m", Quality::Minor),
    ("min", Quality::Minor),
    ("-", Quality::Minor),
    ("7", Quality::Dominant7),
    ("maj7", Quality::Major7),
    ("M7", Quality::Major7),
    ("∆", Quality::Major7),
    ("∆7", Quality::Major7),
    ("m7", Quality::Minor7),
    ("min7", Quality::Minor7),
    ("-7", Quality::Minor7),
    ("dim", Quality::Diminished),
    ("º", Quality::Diminished),
    ("°", Quality::Diminished),
    ("dim7", Quality::Diminished7),
    ("º7", Quality::Diminished7),
    ("°7", Quality::Diminished7),
    ("ø", Quality::HalfDiminished),
    ("ø7", Quality::HalfDiminished),
    ("m7b5", Quality::HalfDiminished),
    ("m7(b5)", Quality::HalfDiminished),
    ("aug", Quality::Augmented),
    ("+", Quality::Augmented),
    ("aug7", Quality::Augmented7),
    ("+7", Quality::Augmented7),
    ("6", Quality::Major6),
    ("m6", Quality::Minor6),
    ("m∆", Quality::MinorMajor7),
    ("mMaj7", Quality::MinorMajor7),
    ("mmaj7", Quality::MinorMajor7),
    ("sus2", Quality::Sus2),
    ("sus4", Quality::Sus4),
    ("sus", Quality::Sus4),
    ("7sus2", Quality::Dominant7Sus2),
    ("7sus4", Quality::Dominant7Sus4),
    ("∆sus2", Quality::Major7Sus2),
    ("maj7sus2", Quality::Major7Sus2),
    ("∆sus4", Quality::Major7Sus4),
    ("maj7sus4", Quality::Major7Sus4),
    ("7(b5)", Quality::Dominant7Flat5),
    ("7b5", Quality::Dominant7Flat5),
    ("∆(b5)", Quality::Major7Flat5),
    ("maj7(b5)", Quality::Major7Flat5),
];

/// Parse a chord symbol
///
/// # Examples
/// ```
/// use montuno::chord::{parse_chord, Extension, Quality};
///
/// let chord = parse_chord("G7(b9)").unwrap();
/// assert_eq!(chord.root, 7);
/// assert_eq!(chord.quality, Quality::Dominant7);
/// assert_eq!(chord.extensions, vec![Extension::FlatNinth]);
///
/// assert_eq!(parse_chord("Bbm7").unwrap().root, 10);
/// assert!(parse_chord("H7").is_err());
/// ```
pub fn parse_chord(symbol: &str) -> Result<Chord, MontunoError> {
    let unrecognized = || MontunoError::UnrecognizedChordSymbol(symbol.to_string());

    let (root, rest) = parse_root(symbol).ok_or_else(unrecognized)?;

    // Longest suffix whose remainder is a valid extension list
    let mut best: Option<(usize, Quality, Vec<(Extension, bool)>)> = None;
    for &(suffix, quality) in SUFFIXES {
        if !rest.starts_with(suffix) {
            continue;
        }
        if best.as_ref().is_some_and(|(len, _, _)| *len >= suffix.len()) {
            continue;
        }
        if let Some(extensions) = parse_extensions(&rest[suffix.len()..]) {
            best = Some((suffix.len(), quality, extensions));
        }
    }
    let (suffix_len, mut quality, written) = best.ok_or_else(unrecognized)?;

    // A bare (unparenthesized) natural extension on a triad implies its seventh
    let implies_seventh = written.iter().any(|(ext, bare)| *bare && ext.is_natural());
    if implies_seventh && quality.intervals().len() == 3 {
        let major_seventh = rest[..suffix_len].starts_with("maj") || rest.starts_with('M');
        quality = quality.with_implied_seventh(major_seventh);
    }

    let mut extensions: Vec<Extension> = Vec::new();
    for (ext, _) in written {
        if !extensions.contains(&ext) {
            extensions.push(ext);
        }
    }

    Ok(Chord {
        root,
        quality,
        extensions,
    })
}

/// Root letter plus optional accidental
fn parse_root(symbol: &str) -> Option<(u8, &str)> {
    let mut chars = symbol.chars();
    let base: i8 = match chars.next()? {
        'C' => 0,
        'D' => 2,
        'E' => 4,
        'F' => 5,
        'G' => 7,
        'A' => 9,
        'B' => 11,
        _ => return None,
    };
    let rest = &symbol[1..];
    let (accidental, rest) = if let Some(stripped) = rest.strip_prefix('#') {
        (1, stripped)
    } else if let Some(stripped) = rest.strip_prefix('b') {
        (-1, stripped)
    } else {
        (0, rest)
    };
    Some(((base + accidental).rem_euclid(12) as u8, rest))
}

/// Parse a run of extensions. Each item carries whether it was written bare
/// (outside parentheses). Returns `None` if anything is left unparsed.
fn parse_extensions(mut text: &str) -> Option<Vec<(Extension, bool)>> {
    let mut extensions = Vec::new();
    while !text.is_empty() {
        if let Some(inner) = text.strip_prefix('(') {
            let close = inner.find(')')?;
            for item in inner[..close].split(',') {
                let (ext, used) = parse_one_extension(item.trim())?;
                if used != item.trim().len() {
                    return None;
                }
                extensions.push((ext, false));
            }
            text = &inner[close + 1..];
        } else {
            let (ext, used) = parse_one_extension(text)?;
            extensions.push((ext, true));
            text = &text[used..];
        }
    }
    Some(extensions)
}

/// Longest extension at the start of `text` and the number of bytes it spans
fn parse_one_extension(text: &str) -> Option<(Extension, usize)> {
    const EXTENSIONS: &[(&str, Extension)] = &[
        ("b13", Extension::FlatThirteenth),
        ("#11", Extension::SharpEleventh),
        ("13", Extension::Thirteenth),
        ("11", Extension::Eleventh),
        ("b9", Extension::FlatNinth),
        ("#9", Extension::SharpNinth),
        ("9", Extension::Ninth),
    ];
    EXTENSIONS
        .iter()
        .find(|(name, _)| text.starts_with(name))
        .map(|(name, ext)| (*ext, name.len()))
}

/// Sharp-spelled name of a pitch class
pub fn pitch_class_name(pitch_class: u8) -> &'static str {
    const NAMES: [&str; 12] = [
        "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
    ];
    NAMES[(pitch_class % 12) as usize]
}

/// Scientific name of a MIDI pitch (60 = C4)
pub fn pitch_name(pitch: u8) -> String {
    let octave = pitch as i16 / 12 - 1;
    format!("{}{}", pitch_class_name(pitch), octave)
}
