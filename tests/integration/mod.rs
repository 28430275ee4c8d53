//! Integration test modules for sfsynth

pub mod engine;
pub mod events;
pub mod rendering;
