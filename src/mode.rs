//! Harmonic modes
//!
//! A mode decides how progression text is read and how each chord is voiced.
//! Modes register as a [`ModeKind`] variant; the pipeline only ever talks to
//! the [`Mode`] trait, so adding a mode never touches the pipeline itself.

use crate::directive::DirectiveSet;
use crate::error::MontunoError;
use crate::parser::{self, ProgressionEntry};
use crate::voicing::{self, Voicing, VoicingContext};

pub trait Mode {
    /// Display name, e.g. `Traditional`
    fn name(&self) -> &'static str;

    fn parse_progression(
        &self,
        source: &str,
        initial: DirectiveSet,
    ) -> Result<Vec<ProgressionEntry>, MontunoError>;

    fn compute_voicing(
        &self,
        entry: &ProgressionEntry,
        previous: Option<&Voicing>,
        context: &VoicingContext,
    ) -> Result<Voicing, MontunoError>;
}

/// Traditional montuno: directive grammar and root-position linked voicings
#[derive(Debug, Clone, Copy, Default)]
pub struct TraditionalMode;

impl Mode for TraditionalMode {
    fn name(&self) -> &'static str {
        "Traditional"
    }

    fn parse_progression(
        &self,
        source: &str,
        initial: DirectiveSet,
    ) -> Result<Vec<ProgressionEntry>, MontunoError> {
        parser::parse_progression(source, initial)
    }

    fn compute_voicing(
        &self,
        entry: &ProgressionEntry,
        previous: Option<&Voicing>,
        context: &VoicingContext,
    ) -> Result<Voicing, MontunoError> {
        voicing::compute_voicing(entry, previous, context)
    }
}

/// Registered modes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ModeKind {
    #[default]
    Traditional,
}

impl ModeKind {
    pub const ALL: [ModeKind; 1] = [ModeKind::Traditional];

    pub fn mode(self) -> &'static dyn Mode {
        match self {
            ModeKind::Traditional => &TraditionalMode,
        }
    }

    /// Look a mode up by name, case-insensitively
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.mode().name().eq_ignore_ascii_case(name.trim()))
    }
}
