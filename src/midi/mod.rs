//! # MIDI
//!
//! Reference analysis, rhythm mapping and file output.
//!
//! - [`reader`] - Pair note events and group them into chord slots
//! - [`clave`] - Eighth-note groupings for clave-based slots
//! - [`mapper`] - Fit each voicing onto its slot's notes
//! - [`writer`] - Encode and write the result

pub mod clave;
pub mod mapper;
pub mod reader;
pub mod writer;

pub use clave::Clave;
pub use mapper::map_voicings;
pub use reader::{
    parse_reference, read_reference, ChordSlot, NoteEvent, ReaderOptions, Reference,
    ReferenceNote, SlotGrouping,
};
pub use writer::{encode, write_midi};
