//! Interval dictionary
//!
//! Named harmonic intervals and their size in semitones. Intervals that come
//! in a major and a minor form (third, seventh, tenth, thirteenth) are resolved
//! with a [`Flavor`] chosen from the chord quality.

use crate::error::MontunoError;

/// Which form of a quality-dependent interval to use
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flavor {
    Major,
    Minor,
}

#[derive(Debug, Clone, Copy)]
enum Size {
    Fixed(u8),
    ByFlavor { major: u8, minor: u8 },
}

/// Static interval table
pub struct IntervalTable {
    entries: &'static [(&'static str, Size)],
}

/// The process-wide interval table
pub static INTERVALS: IntervalTable = IntervalTable {
    entries: &[
        ("third", Size::ByFlavor { major: 4, minor: 3 }),
        ("fifth", Size::Fixed(7)),
        ("seventh", Size::ByFlavor { major: 11, minor: 10 }),
        ("ninth", Size::Fixed(14)),
        ("tenth", Size::ByFlavor { major: 16, minor: 15 }),
        ("thirteenth", Size::ByFlavor { major: 21, minor: 20 }),
        ("octave", Size::Fixed(12)),
        ("double-octave", Size::Fixed(24)),
    ],
};

impl IntervalTable {
    /// Semitone distance of the named interval.
    ///
    /// Names are matched case-insensitively; `doubleOctave`, `double_octave`
    /// and `double-octave` all resolve to the same entry.
    ///
    /// # Examples
    /// ```
    /// use montuno::interval::{Flavor, INTERVALS};
    ///
    /// assert_eq!(INTERVALS.lookup("octave", Flavor::Major).unwrap(), 12);
    /// assert_eq!(INTERVALS.lookup("tenth", Flavor::Major).unwrap(), 16);
    /// assert_eq!(INTERVALS.lookup("tenth", Flavor::Minor).unwrap(), 15);
    /// assert!(INTERVALS.lookup("eleventh-and-a-half", Flavor::Major).is_err());
    /// ```
    pub fn lookup(&self, name: &str, flavor: Flavor) -> Result<u8, MontunoError> {
        let key = normalize(name);
        let size = self
            .entries
            .iter()
            .find(|(entry, _)| *entry == key)
            .map(|(_, size)| *size)
            .ok_or_else(|| MontunoError::UnknownInterval(name.to_string()))?;

        Ok(match (size, flavor) {
            (Size::Fixed(semitones), _) => semitones,
            (Size::ByFlavor { major, .. }, Flavor::Major) => major,
            (Size::ByFlavor { minor, .. }, Flavor::Minor) => minor,
        })
    }
}

/// Lowercase with `-` separators (`doubleOctave` -> `double-octave`)
fn normalize(name: &str) -> String {
    let mut key = String::with_capacity(name.len() + 2);
    for c in name.trim().chars() {
        if c.is_ascii_uppercase() {
            if !key.is_empty() && !key.ends_with('-') {
                key.push('-');
            }
            key.push(c.to_ascii_lowercase());
        } else if c == '_' || c == ' ' {
            key.push('-');
        } else {
            key.push(c);
        }
    }
    key
}
