//! Centralized error type for the sfsynth umbrella crate.
//!
//! Wraps all subsystem errors so `?` propagates naturally across crate boundaries.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Core(#[from] sfsynth_core::Error),

    #[error("SoundFont: {0}")]
    SoundFont(#[from] sfsynth_soundfont::Error),

    #[error("Render: {0}")]
    Render(#[from] sfsynth_render::Error),

    #[error("Unknown channel {0}")]
    UnknownChannel(usize),

    #[error("No SoundFont is registered under that handle")]
    UnknownSoundFont,
}

pub type Result<T> = std::result::Result<T, Error>;
