//! Service-mode sub-sequence.
//!
//! CalibrateOffset → CalibrateReference → SelftestSensors →
//! SelftestActuators → (Standby), advanced by start presses.

use sorter_common::event::Barrier;
use sorter_common::role::Side;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceStep {
    CalibrateOffset,
    CalibrateReference,
    SelftestSensors(SensorChecklist),
    SelftestActuators,
}

/// Light barriers seen blocked during the sensor self-test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SensorChecklist {
    seen: [[bool; 4]; 2],
}

impl SensorChecklist {
    pub const TOTAL: usize = 8;

    /// Check off a barrier. Returns `true` if it was not seen before.
    pub fn mark(&mut self, side: Side, barrier: Barrier) -> bool {
        let slot = &mut self.seen[side.index()][barrier as usize];
        !std::mem::replace(slot, true)
    }

    pub fn seen(&self, side: Side, barrier: Barrier) -> bool {
        self.seen[side.index()][barrier as usize]
    }

    pub fn missing(&self) -> usize {
        self.seen.iter().flatten().filter(|seen| !**seen).count()
    }

    #[inline]
    pub fn is_complete(&self) -> bool {
        self.missing() == 0
    }
}
