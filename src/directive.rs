//! Voicing directives
//!
//! Directives are inline tokens in the progression text that switch on a
//! doubling style for every chord that follows them:
//!
//! | Token  | Directive       | Added tone                  |
//! |--------|-----------------|-----------------------------|
//! | `(8)`  | `Octaves`       | root one octave up          |
//! | `(15)` | `DoubleOctaves` | root two octaves up         |
//! | `(10)` | `Tenths`        | a tenth above the root      |
//! | `(13)` | `Thirteenths`   | a thirteenth above the root |
//!
//! A [`DirectiveSet`] only ever grows: once a directive is active it stays
//! active until the end of the progression.

use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Directive {
    Octaves,
    DoubleOctaves,
    Tenths,
    Thirteenths,
}

impl Directive {
    pub const ALL: [Directive; 4] = [
        Directive::Octaves,
        Directive::DoubleOctaves,
        Directive::Tenths,
        Directive::Thirteenths,
    ];

    /// Parse a directive token such as `(8)`
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "(8)" => Some(Directive::Octaves),
            "(15)" => Some(Directive::DoubleOctaves),
            "(10)" => Some(Directive::Tenths),
            "(13)" => Some(Directive::Thirteenths),
            _ => None,
        }
    }

    /// Parse a harmonization name (`octaves`, `double-octaves`, `tenths`,
    /// `thirteenths`) as used by the options and the CLI
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "octaves" | "8" => Some(Directive::Octaves),
            "double-octaves" | "double_octaves" | "15" => Some(Directive::DoubleOctaves),
            "tenths" | "10" => Some(Directive::Tenths),
            "thirteenths" | "13" => Some(Directive::Thirteenths),
            _ => None,
        }
    }

    pub fn token(self) -> &'static str {
        match self {
            Directive::Octaves => "(8)",
            Directive::DoubleOctaves => "(15)",
            Directive::Tenths => "(10)",
            Directive::Thirteenths => "(13)",
        }
    }

    /// Name of the interval this directive adds above the root
    pub fn interval_name(self) -> &'static str {
        match self {
            Directive::Octaves => "octave",
            Directive::DoubleOctaves => "double-octave",
            Directive::Tenths => "tenth",
            Directive::Thirteenths => "thirteenth",
        }
    }

    fn bit(self) -> u8 {
        match self {
            Directive::Octaves => 1,
            Directive::DoubleOctaves => 1 << 1,
            Directive::Tenths => 1 << 2,
            Directive::Thirteenths => 1 << 3,
        }
    }
}

/// Set of active directives
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct DirectiveSet {
    bits: u8,
}

impl DirectiveSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, directive: Directive) {
        self.bits |= directive.bit();
    }

    /// Copy of this set with `directive` added
    pub fn with(mut self, directive: Directive) -> Self {
        self.insert(directive);
        self
    }

    pub fn contains(&self, directive: Directive) -> bool {
        self.bits & directive.bit() != 0
    }

    pub fn is_empty(&self) -> bool {
        self.bits == 0
    }

    pub fn len(&self) -> usize {
        self.bits.count_ones() as usize
    }

    /// Active directives in canonical order
    pub fn iter(&self) -> impl Iterator<Item = Directive> + '_ {
        Directive::ALL.into_iter().filter(|d| self.contains(*d))
    }
}

impl FromIterator<Directive> for DirectiveSet {
    fn from_iter<I: IntoIterator<Item = Directive>>(iter: I) -> Self {
        let mut set = DirectiveSet::new();
        for directive in iter {
            set.insert(directive);
        }
        set
    }
}

impl fmt::Display for DirectiveSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "-");
        }
        for directive in self.iter() {
            write!(f, "{}", directive.token())?;
        }
        Ok(())
    }
}

impl Serialize for DirectiveSet {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_round_trip() {
        for directive in Directive::ALL {
            assert_eq!(Directive::from_token(directive.token()), Some(directive));
        }
        assert_eq!(Directive::from_token("(9)"), None);
        assert_eq!(Directive::from_token("8"), None);
    }

    #[test]
    fn test_names() {
        assert_eq!(Directive::from_name("Octaves"), Some(Directive::Octaves));
        assert_eq!(Directive::from_name("double-octaves"), Some(Directive::DoubleOctaves));
        assert_eq!(Directive::from_name("10"), Some(Directive::Tenths));
        assert_eq!(Directive::from_name("sixths"), None);
    }

    #[test]
    fn test_set_accumulates() {
        let mut set = DirectiveSet::new();
        assert!(set.is_empty());
        set.insert(Directive::Tenths);
        set.insert(Directive::Octaves);
        set.insert(Directive::Octaves);
        assert_eq!(set.len(), 2);
        assert!(set.contains(Directive::Octaves));
        assert!(!set.contains(Directive::Thirteenths));
        assert_eq!(
            set.iter().collect::<Vec<_>>(),
            vec![Directive::Octaves, Directive::Tenths]
        );
        assert_eq!(set.to_string(), "(8)(10)");
    }
}
