//! # Options
//!
//! Generation options come from three places, later ones winning:
//! 1. Defaults ([`GenerateOptions::default`])
//! 2. YAML front matter at the top of the progression text
//! 3. Command-line flags
//!
//! Front matter uses kebab-case keys:
//!
//! ```text
//! ---
//! mode: traditional
//! clave: 2-3
//! harmonization: octaves, tenths
//! register-low: 48
//! register-high: 84
//! onset-tolerance: 10
//! retexture-pitches: [43, 45, 48, 52]
//! ---
//! Cmaj7 G7 Am7
//! ```

use crate::directive::{Directive, DirectiveSet};
use crate::error::MontunoError;
use crate::midi::{Clave, ReaderOptions, SlotGrouping};
use crate::mode::ModeKind;
use crate::voicing::{Register, VoicingContext};
use serde::Deserialize;

/// Options as written, before validation
#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct RawOptions {
    pub mode: Option<String>,
    pub clave: Option<String>,
    /// Comma or space separated directive names
    pub harmonization: Option<String>,
    pub register_low: Option<u8>,
    pub register_high: Option<u8>,
    pub onset_tolerance: Option<u32>,
    pub retexture_pitches: Option<Vec<u8>>,
}

impl RawOptions {
    pub fn from_yaml(content: &str) -> Result<Self, MontunoError> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content).map_err(|e| MontunoError::ConfigError(e.to_string()))
    }
}

/// Validated options for one generation run
#[derive(Debug, Clone, PartialEq)]
pub struct GenerateOptions {
    pub mode: ModeKind,
    /// Group slots by clave instead of by onset; `onset_tolerance` then
    /// clusters strokes inside each clave group
    pub clave: Option<Clave>,
    /// Directives active before the first token
    pub harmonization: DirectiveSet,
    pub register: Register,
    pub onset_tolerance: u32,
    pub retexture_pitches: Option<Vec<u8>>,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            mode: ModeKind::default(),
            clave: None,
            harmonization: DirectiveSet::new(),
            register: Register::default(),
            onset_tolerance: 0,
            retexture_pitches: None,
        }
    }
}

impl GenerateOptions {
    /// Defaults overlaid with the source's front matter, if any
    pub fn from_source(source: &str) -> Result<Self, MontunoError> {
        let mut options = Self::default();
        if let Some(content) = front_matter(source) {
            options.apply(&RawOptions::from_yaml(content)?)?;
        }
        Ok(options)
    }

    /// Overlay every option `raw` sets
    pub fn apply(&mut self, raw: &RawOptions) -> Result<(), MontunoError> {
        if let Some(name) = &raw.mode {
            self.mode = ModeKind::from_name(name)
                .ok_or_else(|| MontunoError::ConfigError(format!("Unknown mode: {}", name)))?;
        }

        if let Some(name) = &raw.clave {
            self.clave = Some(
                Clave::from_name(name)
                    .ok_or_else(|| MontunoError::ConfigError(format!("Unknown clave: {}", name)))?,
            );
        }

        if let Some(list) = &raw.harmonization {
            self.harmonization = parse_harmonization(list)?;
        }

        let register = Register {
            low: raw.register_low.unwrap_or(self.register.low),
            high: raw.register_high.unwrap_or(self.register.high),
        };
        if register.high > 127 || register.low > register.high {
            return Err(MontunoError::ConfigError(format!(
                "Invalid register: {}..{}",
                register.low, register.high
            )));
        }
        self.register = register;

        if let Some(tolerance) = raw.onset_tolerance {
            self.onset_tolerance = tolerance;
        }

        if let Some(pitches) = &raw.retexture_pitches {
            if let Some(bad) = pitches.iter().find(|&&p| p > 127) {
                return Err(MontunoError::ConfigError(format!(
                    "Retexture pitch out of range: {}",
                    bad
                )));
            }
            self.retexture_pitches = Some(pitches.clone());
        }

        Ok(())
    }

    pub fn reader_options(&self) -> ReaderOptions {
        let grouping = match self.clave {
            Some(clave) => SlotGrouping::Clave {
                clave,
                tolerance: self.onset_tolerance,
            },
            None => SlotGrouping::Onsets {
                tolerance: self.onset_tolerance,
            },
        };
        ReaderOptions {
            grouping,
            retexture_pitches: self.retexture_pitches.clone(),
        }
    }

    pub fn voicing_context(&self, anchor: f64) -> VoicingContext {
        VoicingContext {
            anchor,
            register: self.register,
        }
    }
}

/// Directive names separated by commas or whitespace
pub fn parse_harmonization(list: &str) -> Result<DirectiveSet, MontunoError> {
    list.split(|c: char| c == ',' || c.is_whitespace())
        .filter(|name| !name.is_empty())
        .map(|name| {
            Directive::from_name(name)
                .ok_or_else(|| MontunoError::ConfigError(format!("Unknown harmonization: {}", name)))
        })
        .collect()
}

/// Body of a leading `---` ... `---` block
pub fn front_matter(source: &str) -> Option<&str> {
    let body = source.trim_start().strip_prefix("---")?;
    let end = body.find("\n---")?;
    Some(&body[..end])
}
