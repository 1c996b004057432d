// Canonical chord model and tolerant chord-symbol parsing

pub mod parser;
pub mod symbol;

// Re-export main types
pub use parser::{parse, AllInvalid};
pub use symbol::{pitch_class_name, ChordProgression, ChordSymbol, Quality, SongMeta};
