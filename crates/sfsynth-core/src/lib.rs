//! Core building blocks shared by the sfsynth crates.
//!
//! - [`SynthConfig`]: engine configuration (sample rate, block size, voice cap)
//! - [`UnitTables`]: precomputed timecent, absolute-cent and decibel tables
//!
//! The tables are owned by an engine instance and shared with its render
//! channels through an `Arc`, so several engines can coexist in one process.

pub mod error;
pub use error::{Error, Result};

mod config;
pub use config::{AttackCurve, Interpolation, SynthConfig};

pub mod units;
pub use units::{UnitTables, DB_SILENCE};

pub use std::sync::Arc;
