//! Girsanov measure switch
//!
//! Maintains three risk-adjusted posteriors over outcome probability: the
//! neutral measure P, a risk-averse tilt, and a risk-seeking tilt. The
//! measure with the best recent Brier score is used for confidence
//! reporting. Advisory only; never touches the verdict.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

/// Recent predictions scored per measure
const BRIER_WINDOW: usize = 50;

/// Tilt applied to the pseudo-counts by the risk-adjusted measures
const RISK_TILT: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Measure {
    Neutral,
    RiskAverse,
    RiskSeeking,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct TiltedPosterior {
    measure: Measure,
    alpha: f64,
    beta: f64,
    /// Squared errors of recent predictions
    brier_window: VecDeque<f64>,
}

impl TiltedPosterior {
    fn new(measure: Measure) -> Self {
        Self {
            measure,
            alpha: 1.0,
            beta: 1.0,
            brier_window: VecDeque::with_capacity(BRIER_WINDOW),
        }
    }

    /// Probability of a positive outcome under this measure
    fn predict(&self) -> f64 {
        match self.measure {
            Measure::Neutral => self.alpha / (self.alpha + self.beta),
            Measure::RiskAverse => self.alpha / (self.alpha + self.beta + RISK_TILT),
            Measure::RiskSeeking => (self.alpha + RISK_TILT) / (self.alpha + self.beta + RISK_TILT),
        }
    }

    fn record(&mut self, positive: bool) {
        let prediction = self.predict();
        let actual = if positive { 1.0 } else { 0.0 };
        let error = prediction - actual;
        if self.brier_window.len() == BRIER_WINDOW {
            self.brier_window.pop_front();
        }
        self.brier_window.push_back(error * error);

        if positive {
            self.alpha += 1.0;
        } else {
            self.beta += 1.0;
        }
    }

    /// Mean squared prediction error over the window; lower is better
    fn brier_score(&self) -> f64 {
        if self.brier_window.is_empty() {
            return 0.25; // prior score of a 0.5 predictor
        }
        self.brier_window.iter().sum::<f64>() / self.brier_window.len() as f64
    }
}

/// The three-measure switch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeasureSwitch {
    posteriors: Vec<TiltedPosterior>,
}

impl Default for MeasureSwitch {
    fn default() -> Self {
        Self::new()
    }
}

impl MeasureSwitch {
    pub fn new() -> Self {
        Self {
            posteriors: vec![
                TiltedPosterior::new(Measure::Neutral),
                TiltedPosterior::new(Measure::RiskAverse),
                TiltedPosterior::new(Measure::RiskSeeking),
            ],
        }
    }

    /// Record one outcome under every measure
    pub fn record(&mut self, positive: bool) {
        for posterior in &mut self.posteriors {
            posterior.record(positive);
        }
    }

    /// The measure currently winning on Brier score
    pub fn active_measure(&self) -> Measure {
        self.posteriors
            .iter()
            .min_by(|a, b| a.brier_score().total_cmp(&b.brier_score()))
            .map_or(Measure::Neutral, |p| p.measure)
    }

    /// Confidence in a positive outcome, reported under the active measure
    pub fn confidence(&self) -> f64 {
        let active = self.active_measure();
        self.posteriors
            .iter()
            .find(|p| p.measure == active)
            .map_or(0.5, TiltedPosterior::predict)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confidence_tracks_outcomes() {
        let mut switch = MeasureSwitch::new();
        for _ in 0..30 {
            switch.record(true);
        }
        assert!(switch.confidence() > 0.8);
        for _ in 0..60 {
            switch.record(false);
        }
        assert!(switch.confidence() < 0.5);
    }

    #[test]
    fn test_all_measures_bounded() {
        let mut switch = MeasureSwitch::new();
        for i in 0..100 {
            switch.record(i % 3 == 0);
        }
        for posterior in &switch.posteriors {
            let p = posterior.predict();
            assert!((0.0..=1.0).contains(&p));
        }
    }

    #[test]
    fn test_active_measure_is_one_of_three() {
        let mut switch = MeasureSwitch::new();
        for i in 0..40 {
            switch.record(i % 2 == 0);
        }
        let measure = switch.active_measure();
        assert!(matches!(
            measure,
            Measure::Neutral | Measure::RiskAverse | Measure::RiskSeeking
        ));
    }
}
