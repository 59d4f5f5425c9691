//! Clave groupings
//!
//! In a traditional montuno each chord lasts a number of eighth notes that
//! follows the clave. The first bar pair uses an opening block, every later
//! pair repeats the same four groups.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Clave {
    TwoThree,
    ThreeTwo,
}

impl Clave {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "2-3" | "clave 2-3" | "two-three" => Some(Clave::TwoThree),
            "3-2" | "clave 3-2" | "three-two" => Some(Clave::ThreeTwo),
            _ => None,
        }
    }

    /// Eighth-note groups of the opening block
    pub fn first_block(self) -> [u32; 4] {
        match self {
            Clave::TwoThree => [3, 4, 4, 3],
            Clave::ThreeTwo => [3, 3, 5, 4],
        }
    }

    /// Eighth-note groups repeated after the opening block
    pub fn repeated_block(self) -> [u32; 4] {
        match self {
            Clave::TwoThree => [5, 4, 4, 3],
            Clave::ThreeTwo => [4, 3, 5, 4],
        }
    }

    /// Endless sequence of group lengths in eighth notes
    pub fn groups(self) -> impl Iterator<Item = u32> {
        self.first_block()
            .into_iter()
            .chain(std::iter::repeat(self.repeated_block()).flatten())
    }

    /// Index of the group containing the given eighth note (0-based)
    pub fn group_of(self, eighth: u64) -> usize {
        let mut end = 0u64;
        for (index, len) in self.groups().enumerate() {
            end += len as u64;
            if eighth < end {
                return index;
            }
        }
        unreachable!("clave groups never run out")
    }
}

impl fmt::Display for Clave {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Clave::TwoThree => write!(f, "2-3"),
            Clave::ThreeTwo => write!(f, "3-2"),
        }
    }
}
