pub mod api;
pub mod chord;
pub mod config;
pub mod directive;
pub mod error;
pub mod interval;
pub mod lexer;
pub mod midi;
pub mod mode;
pub mod parser;
pub mod voicing;

pub use api::{generate, generate_with, render, Rendered};
pub use chord::{parse_chord, Chord, Extension, Quality};
pub use config::GenerateOptions;
pub use directive::{Directive, DirectiveSet};
pub use error::*;
pub use mode::{Mode, ModeKind, TraditionalMode};
pub use parser::{parse_progression, ProgressionEntry};
pub use voicing::{voice_progression, Voicing};
