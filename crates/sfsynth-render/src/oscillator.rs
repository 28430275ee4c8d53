//! Wavetable oscillator: plays sample PCM at an arbitrary rate.

use sfsynth_core::Interpolation;
use sfsynth_soundfont::LoopMode;

/// Playback window within a sample's PCM, in frames from its first frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleWindow {
    pub start: usize,
    pub end: usize,
    pub loop_start: usize,
    pub loop_end: usize,
    pub loop_mode: LoopMode,
}

/// Fractional read cursor over one sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WavetableOscillator {
    cursor: f64,
    window: SampleWindow,
}

impl WavetableOscillator {
    pub fn new(window: SampleWindow) -> Self {
        Self {
            cursor: window.start as f64,
            window,
        }
    }

    pub fn cursor(&self) -> f64 {
        self.cursor
    }

    pub fn window(&self) -> &SampleWindow {
        &self.window
    }

    /// Fill `out` from `data`, advancing by `step` frames per output sample.
    ///
    /// Returns `true` once a non-looping voice runs past its end. Slots
    /// after that point are left untouched.
    pub fn render(
        &mut self,
        data: &[f32],
        step: f64,
        releasing: bool,
        interpolation: Interpolation,
        out: &mut [f32],
    ) -> bool {
        let loop_end = self.window.loop_end.min(data.len());
        let loop_start = self.window.loop_start;
        if self.window.loop_mode.loops(releasing) && loop_end > loop_start {
            self.render_looped(data, step, loop_start, loop_end, interpolation, out);
            false
        } else {
            self.render_one_shot(data, step, interpolation, out)
        }
    }

    fn render_looped(
        &mut self,
        data: &[f32],
        step: f64,
        loop_start: usize,
        loop_end: usize,
        interpolation: Interpolation,
        out: &mut [f32],
    ) {
        let start = loop_start as f64;
        let end = loop_end as f64;
        let length = end - start;
        let wrap = |cursor: f64| {
            if cursor >= end {
                start + (cursor - start) % length
            } else {
                cursor
            }
        };

        let mut cur = wrap(self.cursor);
        for slot in out.iter_mut() {
            let floor = cur as usize;
            let mut ceil = floor + 1;
            if ceil >= loop_end {
                ceil -= loop_end - loop_start;
            }

            *slot = match interpolation {
                Interpolation::Linear => {
                    let fraction = (cur - floor as f64) as f32;
                    let lower = data[floor];
                    lower + (data[ceil] - lower) * fraction
                }
                Interpolation::NearestNeighbor => {
                    if cur - floor as f64 >= 0.5 {
                        data[ceil]
                    } else {
                        data[floor]
                    }
                }
            };

            cur = wrap(cur + step);
        }
        self.cursor = cur;
    }

    fn render_one_shot(
        &mut self,
        data: &[f32],
        step: f64,
        interpolation: Interpolation,
        out: &mut [f32],
    ) -> bool {
        let end = self.window.end.min(data.len().saturating_sub(1));
        let mut cur = self.cursor;

        for slot in out.iter_mut() {
            let floor = cur as usize;
            let ceil = floor + 1;
            if ceil >= end {
                self.cursor = cur;
                return true;
            }

            let fraction = (cur - floor as f64) as f32;
            *slot = match interpolation {
                Interpolation::Linear => {
                    let lower = data[floor];
                    lower + (data[ceil] - lower) * fraction
                }
                Interpolation::NearestNeighbor => {
                    if fraction >= 0.5 {
                        data[ceil]
                    } else {
                        data[floor]
                    }
                }
            };

            cur += step;
        }
        self.cursor = cur;
        false
    }
}
