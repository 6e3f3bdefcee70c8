//! Temporal reward spectrum
//!
//! Accumulates reward by hour of day and runs a low-rate DFT over the
//! 24-point mean series. The dominant period hints at daily rhythm; the
//! lowest-reward hours are recommended as rest windows. Advisory only.

use serde::{Deserialize, Serialize};

/// Minimum observations before the spectrum means anything
const MIN_OBSERVATIONS: u64 = 24;

/// Hours recommended as rest windows
const REST_WINDOW_COUNT: usize = 3;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct HourBucket {
    sum: f64,
    count: u64,
}

/// Hour-of-day reward series with a tiny DFT on top
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemporalSpectrum {
    buckets: Vec<HourBucket>,
    total_observations: u64,
}

impl Default for TemporalSpectrum {
    fn default() -> Self {
        Self::new()
    }
}

impl TemporalSpectrum {
    pub fn new() -> Self {
        Self {
            buckets: (0..24).map(|_| HourBucket::default()).collect(),
            total_observations: 0,
        }
    }

    /// Record a reward at the given hour of day (0–23)
    pub fn record(&mut self, hour: u32, reward: f64) {
        let bucket = &mut self.buckets[(hour % 24) as usize];
        bucket.sum += reward;
        bucket.count += 1;
        self.total_observations += 1;
    }

    /// Mean reward per hour; hours without data read as the global mean
    fn hourly_means(&self) -> [f64; 24] {
        let global = self.global_mean();
        let mut means = [global; 24];
        for (hour, bucket) in self.buckets.iter().enumerate() {
            if bucket.count > 0 {
                means[hour] = bucket.sum / bucket.count as f64;
            }
        }
        means
    }

    fn global_mean(&self) -> f64 {
        let total_sum: f64 = self.buckets.iter().map(|b| b.sum).sum();
        if self.total_observations == 0 {
            0.0
        } else {
            total_sum / self.total_observations as f64
        }
    }

    /// DFT magnitude at each frequency k = 1..=12 over the hourly means
    pub fn spectrum(&self) -> Vec<f64> {
        let means = self.hourly_means();
        let n = means.len() as f64;
        (1..=12)
            .map(|k| {
                let mut re = 0.0;
                let mut im = 0.0;
                for (t, &value) in means.iter().enumerate() {
                    let angle = -2.0 * std::f64::consts::PI * (k as f64) * (t as f64) / n;
                    re += value * angle.cos();
                    im += value * angle.sin();
                }
                (re * re + im * im).sqrt() / n
            })
            .collect()
    }

    /// Dominant cycle length in hours (24/k for the strongest k), if the
    /// series carries enough data
    pub fn dominant_period_hours(&self) -> Option<f64> {
        if self.total_observations < MIN_OBSERVATIONS {
            return None;
        }
        let spectrum = self.spectrum();
        let (best_k, _) = spectrum
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))?;
        Some(24.0 / (best_k + 1) as f64)
    }

    /// The lowest-reward hours, recommended as rest windows
    pub fn rest_windows(&self) -> Vec<u32> {
        if self.total_observations < MIN_OBSERVATIONS {
            return Vec::new();
        }
        let means = self.hourly_means();
        let mut hours: Vec<u32> = (0..24).collect();
        hours.sort_by(|&a, &b| means[a as usize].total_cmp(&means[b as usize]));
        hours.truncate(REST_WINDOW_COUNT);
        hours.sort_unstable();
        hours
    }
}
