//! Optional analytic trackers (feature `analytics`)
//!
//! All trackers are advisory: they inform stats surfaces and rest
//! recommendations but never veto the Judge's verdict. The whole module can
//! be compiled out without affecting correctness.

mod antifragility;
mod girsanov;
mod noncommutative;
mod temporal;

pub use antifragility::{AntifragilityIndex, FragilityLabel};
pub use girsanov::{Measure, MeasureSwitch};
pub use noncommutative::{NonCommutativeTracker, OrderDependentPair};
pub use temporal::TemporalSpectrum;

use parking_lot::Mutex;
use serde::Serialize;

/// The tracker bundle owned by the Learner
#[derive(Default)]
pub struct Trackers {
    pub antifragility: Mutex<AntifragilityIndex>,
    pub temporal: Mutex<TemporalSpectrum>,
    pub measures: Mutex<MeasureSwitch>,
    pub noncommutative: Mutex<NonCommutativeTracker>,
}

/// Snapshot for the stats surface
#[derive(Debug, Clone, Serialize)]
pub struct TrackerReport {
    pub fragility: FragilityLabel,
    pub stress_gain: f64,
    pub dominant_period_hours: Option<f64>,
    pub rest_windows: Vec<u32>,
    pub active_measure: Measure,
    pub measure_confidence: f64,
    pub order_dependent_pairs: Vec<OrderDependentPair>,
}

impl Trackers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one reward observation into every tracker
    pub fn record_reward(&self, reward: f64, hour: u32, under_stress: bool) {
        self.antifragility.lock().record(reward, under_stress);
        self.temporal.lock().record(hour, reward);
        self.measures.lock().record(reward > 0.0);
    }

    pub fn report(&self) -> TrackerReport {
        let antifragility = self.antifragility.lock();
        let temporal = self.temporal.lock();
        let measures = self.measures.lock();
        let noncommutative = self.noncommutative.lock();
        TrackerReport {
            fragility: antifragility.label(),
            stress_gain: antifragility.stress_gain(),
            dominant_period_hours: temporal.dominant_period_hours(),
            rest_windows: temporal.rest_windows(),
            active_measure: measures.active_measure(),
            measure_confidence: measures.confidence(),
            order_dependent_pairs: noncommutative.flagged_pairs(),
        }
    }
}
