//! # Error Types
//!
//! Every failure the generator can produce is a variant of [`MontunoError`].
//! Errors propagate unchanged from the component that raised them up to
//! [`generate`](crate::generate), where their `Display` text becomes the status
//! message shown to the user.
//!
//! ## Error Types
//! - `MalformedToken` - a parenthesized token that is not a known directive
//! - `EmptyProgression` - the progression text holds no chord symbols
//! - `UnrecognizedChordSymbol` - a chord token that cannot be parsed
//! - `UnknownInterval` - an interval name missing from the interval table
//! - `ReferenceTooShort` - the reference has fewer chord slots than chords
//! - `UnreadableReference` - the reference is missing or not a valid MIDI file
//! - `WriteError` - the output file could not be written
//! - `ConfigError` - invalid front matter or generation options
//!
//! ## Usage
//! ```rust,ignore
//! use montuno::{generate, MontunoError};
//!
//! match generate("Cmaj7 G7", "ref.mid", "out.mid") {
//!     Ok(status) => println!("{}", status),
//!     Err(MontunoError::MalformedToken { line, column, token }) => {
//!         eprintln!("Bad directive {} at {}:{}", token, line, column);
//!     }
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MontunoError {
    /// A parenthesized token that is not one of `(8)`, `(15)`, `(10)`, `(13)`.
    ///
    /// # Example
    /// ```
    /// # use montuno::MontunoError;
    /// let err = MontunoError::MalformedToken {
    ///     line: 1,
    ///     column: 1,
    ///     token: "(9)".to_string(),
    /// };
    /// assert_eq!(
    ///     err.to_string(),
    ///     "Malformed token '(9)' at line 1, column 1: expected (8), (15), (10) or (13)"
    /// );
    /// ```
    #[error("Malformed token '{token}' at line {line}, column {column}: expected (8), (15), (10) or (13)")]
    MalformedToken {
        line: usize,
        column: usize,
        token: String,
    },

    #[error("The progression contains no chords")]
    EmptyProgression,

    #[error("Unrecognized chord symbol: {0}")]
    UnrecognizedChordSymbol(String),

    #[error("Unknown interval: {0}")]
    UnknownInterval(String),

    /// The reference yields fewer chord slots than the progression has chords.
    #[error("Reference MIDI is too short: {needed} chords need {needed} slots, found {found}")]
    ReferenceTooShort { needed: usize, found: usize },

    #[error("Unreadable reference MIDI: {0}")]
    UnreadableReference(String),

    #[error("Could not write '{path}': {message}")]
    WriteError { path: String, message: String },

    #[error("Invalid options: {0}")]
    ConfigError(String),
}
