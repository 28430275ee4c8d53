//! Error types for sfsynth-render.

use thiserror::Error;

/// Result type alias for sfsynth-render operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in sfsynth-render.
///
/// None of these cross the render boundary. The renderer degrades the
/// affected voice instead and only the control side sees an `Err`.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    /// A voice referenced a sample that was never uploaded to its channel.
    #[error("Sample {sample_id} not uploaded to channel")]
    SampleMissing { sample_id: usize },

    /// Lowpass coefficients would be unstable or non-finite.
    #[error("Unstable filter configuration (cutoff {cutoff_hz} Hz, Q {q})")]
    UnstableFilterConfiguration { cutoff_hz: f32, q: f32 },

    /// The channel's control queue is full.
    #[error("Channel queue full")]
    ChannelFull,

    /// The render side of the channel was dropped.
    #[error("Channel closed")]
    ChannelClosed,
}
