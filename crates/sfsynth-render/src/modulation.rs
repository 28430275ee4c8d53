//! Modulator evaluation.
//!
//! Turns a voice's base generators and modulator list into effective
//! generator values. Runs at control rate: once on note-on and again when a
//! controller the voice's modulators read changes.
//!
//! RT-safe: no allocations.

use crate::controller::ControllerTable;
use sfsynth_core::units::{concave, convex};
use sfsynth_soundfont::{
    CurveType, GeneratorType, GeneratorValues, Modulator, ModulatorSource, SourceController,
    TransformType,
};

/// Per-voice inputs a modulator source can read.
#[derive(Debug, Clone, Copy)]
pub struct ModulationInputs<'a> {
    pub controllers: &'a ControllerTable,
    pub key: u8,
    pub velocity: u8,
}

/// Normalized value of a source after direction, polarity and curve.
///
/// "No controller" reads as 1. Links and undefined sources read as 0.
pub fn source_value(source: ModulatorSource, inputs: &ModulationInputs<'_>) -> f32 {
    let raw = match source.controller() {
        SourceController::NoController => return 1.0,
        SourceController::Link => return 0.0,
        SourceController::NoteOnVelocity => (inputs.velocity as i16) << 7,
        SourceController::NoteOnKey => (inputs.key as i16) << 7,
        other => match inputs.controllers.source_value(other) {
            Some(value) => value,
            None => return 0.0,
        },
    };
    shape(source, raw as f32 / 16384.0)
}

/// Apply direction, polarity and curve to a value in `0..=1`.
fn shape(source: ModulatorSource, x: f32) -> f32 {
    let x = if source.is_negative() { 1.0 - x } else { x };
    let curve = source.curve();

    if !source.is_bipolar() {
        return unipolar(curve, x);
    }

    if curve == CurveType::Switch {
        return if x >= 0.5 { 1.0 } else { -1.0 };
    }
    if x >= 0.5 {
        unipolar(curve, 2.0 * x - 1.0)
    } else {
        -unipolar(curve, 1.0 - 2.0 * x)
    }
}

fn unipolar(curve: CurveType, x: f32) -> f32 {
    match curve {
        CurveType::Linear => x,
        CurveType::Concave => concave(x),
        CurveType::Convex => convex(x),
        CurveType::Switch => {
            if x >= 0.5 {
                1.0
            } else {
                0.0
            }
        }
    }
}

/// Output of one modulator, in the destination generator's units.
pub fn modulator_output(modulator: &Modulator, inputs: &ModulationInputs<'_>) -> f32 {
    let value = modulator.amount as f32
        * source_value(modulator.source, inputs)
        * source_value(modulator.amount_source, inputs);
    match modulator.transform {
        TransformType::Linear => value,
        TransformType::Absolute => value.abs(),
    }
}

/// Effective generators: `base` plus the summed output of every modulator
/// on its destination, truncated and clamped to each generator's range.
pub fn compute_modulated(
    base: &GeneratorValues,
    modulators: &[Modulator],
    inputs: &ModulationInputs<'_>,
) -> GeneratorValues {
    let mut sums = [0.0f32; GeneratorType::COUNT];
    for modulator in modulators {
        sums[modulator.destination.index()] += modulator_output(modulator, inputs);
    }

    let mut modulated = *base;
    for ty in GeneratorType::all() {
        let sum = sums[ty.index()];
        if sum != 0.0 {
            modulated.add(ty, sum as i32);
        }
    }
    modulated.clamp_to_limits();
    modulated
}

/// Whether any modulator reads `controller`.
pub fn reads_controller(modulators: &[Modulator], controller: SourceController) -> bool {
    modulators.iter().any(|m| m.reads(controller))
}
