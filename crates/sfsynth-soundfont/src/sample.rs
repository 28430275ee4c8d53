//! Sample headers.

/// Sample header as stored in `shdr`. Offsets are in frames from the start
/// of the `smpl` payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sample {
    /// Position in the file's sample header list.
    pub id: usize,
    pub name: String,
    pub start: u32,
    pub end: u32,
    pub loop_start: u32,
    pub loop_end: u32,
    pub sample_rate: u32,
    /// MIDI key the sample was recorded at.
    pub original_pitch: u8,
    /// Pitch correction in cents.
    pub pitch_correction: i8,
    pub sample_link: u16,
    pub sample_type: u16,
}

impl Sample {
    /// Length in frames.
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// ROM samples have no data in the file.
    pub fn is_rom(&self) -> bool {
        self.sample_type & 0x8000 != 0
    }

    /// Loop points relative to `start`.
    pub fn relative_loop(&self) -> (u32, u32) {
        (
            self.loop_start.saturating_sub(self.start),
            self.loop_end.saturating_sub(self.start),
        )
    }
}

/// Playback mode from the `sampleModes` generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoopMode {
    #[default]
    NoLoop,
    Loop,
    LoopUntilRelease,
}

impl LoopMode {
    /// Mode 2 is unused in SoundFont2 and plays without looping.
    pub fn from_generator(value: i32) -> Self {
        match value {
            1 => LoopMode::Loop,
            3 => LoopMode::LoopUntilRelease,
            _ => LoopMode::NoLoop,
        }
    }

    /// Whether the loop is active given the voice's release state.
    #[inline]
    pub fn loops(self, releasing: bool) -> bool {
        match self {
            LoopMode::Loop => true,
            LoopMode::LoopUntilRelease => !releasing,
            LoopMode::NoLoop => false,
        }
    }
}
