//! # Progression Parser
//!
//! Turns progression text into an ordered list of [`ProgressionEntry`] values.
//!
//! ## Grammar
//! Whitespace-separated tokens. A token starting with `(` must be one of the
//! directive tokens `(8)`, `(15)`, `(10)`, `(13)`; every other token is a chord
//! symbol (see [`crate::chord`]). Text may start with a YAML front matter block
//! between `---` lines, which is skipped here and read by [`crate::config`].
//!
//! ## Directive Stickiness
//! The active [`DirectiveSet`] is threaded through the scan as a plain value.
//! A directive token adds to it, a chord token takes a snapshot of it. Nothing
//! removes a directive, so every chord after `(8)` carries `Octaves`.
//!
//! ## Example
//! ```rust
//! use montuno::directive::{Directive, DirectiveSet};
//! use montuno::parse_progression;
//!
//! let entries = parse_progression("Cmaj7 (8) G7 (10) Am7", DirectiveSet::new()).unwrap();
//! assert_eq!(entries.len(), 3);
//! assert!(entries[0].directives.is_empty());
//! assert!(entries[1].directives.contains(Directive::Octaves));
//! assert!(entries[2].directives.contains(Directive::Octaves));
//! assert!(entries[2].directives.contains(Directive::Tenths));
//! ```

use crate::chord::{parse_chord, Chord};
use crate::directive::DirectiveSet;
use crate::error::MontunoError;
use crate::lexer::{Lexer, Token};
use serde::Serialize;

/// One chord of the progression with the directives active at that point
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressionEntry {
    /// The chord symbol as written
    pub symbol: String,
    pub chord: Chord,
    pub directives: DirectiveSet,
}

/// Parse progression text, starting from `initial` active directives
pub fn parse_progression(
    source: &str,
    initial: DirectiveSet,
) -> Result<Vec<ProgressionEntry>, MontunoError> {
    let tokens = Lexer::new(source).tokenize()?;

    let mut active = initial;
    let mut entries = Vec::new();
    for located in tokens {
        match located.token {
            Token::Directive(directive) => active.insert(directive),
            Token::Chord(symbol) => {
                let chord = parse_chord(&symbol)?;
                entries.push(ProgressionEntry {
                    symbol,
                    chord,
                    directives: active,
                });
            }
        }
    }

    if entries.is_empty() {
        return Err(MontunoError::EmptyProgression);
    }
    Ok(entries)
}
