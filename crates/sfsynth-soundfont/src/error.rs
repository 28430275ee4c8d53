//! Error types for sfsynth-soundfont.

use thiserror::Error;

/// Result type alias for sfsynth-soundfont operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while decoding or querying a SoundFont.
#[derive(Debug, Error)]
pub enum Error {
    /// The buffer ended before a chunk header or payload was complete.
    #[error("Malformed container at offset {offset}: needed {needed} bytes, {available} available")]
    MalformedContainer {
        offset: usize,
        needed: usize,
        available: usize,
    },

    /// A tag did not match what the SoundFont2 layout requires at this point.
    #[error("Invalid format at offset {offset}: expected \"{expected}\", found \"{found}\"")]
    InvalidFormat {
        offset: usize,
        expected: &'static str,
        found: String,
    },

    /// A hydra record references data outside its chunk, or a terminal record is missing.
    #[error("Corrupt {chunk} record {index}: {reason}")]
    CorruptHydra {
        chunk: &'static str,
        index: usize,
        reason: String,
    },

    /// No preset matched a lookup. Lookups fall back to the first preset,
    /// so this is reported as a diagnostic rather than returned.
    #[error("Preset not found: {query}")]
    PresetNotFound { query: String },

    /// A catalog must hold at least one preset.
    #[error("SoundFont contains no presets")]
    EmptyCatalog,

    /// I/O error (file operations).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
