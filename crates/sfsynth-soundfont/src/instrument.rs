//! Instruments.

use crate::zone::{split_global, InstrumentZone};

#[derive(Debug, Clone)]
pub struct Instrument {
    pub name: String,
    /// Zones in file order. A global zone, if present, comes first.
    pub zones: Vec<InstrumentZone>,
}

impl Instrument {
    pub fn global_zone(&self) -> Option<&InstrumentZone> {
        split_global(&self.zones).0
    }

    /// Zones that reference a sample.
    pub fn sample_zones(&self) -> &[InstrumentZone] {
        split_global(&self.zones).1
    }
}
