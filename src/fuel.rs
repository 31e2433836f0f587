//! Fuel consumption estimated from mass air flow

use std::collections::VecDeque;

use crate::config::FuelConfig;

/// One fuel statistics update
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FuelReading {
    pub fuel_level_percent: i32,
    /// Mean of the samples in the smoothing window, in L/100km
    pub smoothed_l_per_100km: f64,
    pub liters_per_hour: f64,
    pub speed_kmh: f64,
}

/// Turns speed and mass air flow into a smoothed L/100km figure
///
/// Instantaneous consumption is kept in a FIFO window of `window_size` samples; the reported
/// consumption is the mean of that window.
#[derive(Debug, Clone)]
pub struct FuelEstimator {
    config: FuelConfig,
    window: VecDeque<f64>,
}

impl FuelEstimator {
    pub fn new(config: FuelConfig) -> Self {
        FuelEstimator {
            window: VecDeque::with_capacity(config.window_size.max(1)),
            config,
        }
    }

    pub fn capacity(&self) -> usize {
        self.config.window_size.max(1)
    }

    /// Fuel flow in L/h for a mass air flow in g/s
    pub fn liters_per_hour(&self, maf_g_s: f64) -> f64 {
        (maf_g_s * 3600.0) / (self.config.fuel_density_g_per_l * self.config.air_fuel_ratio)
    }

    /// Add an instantaneous sample, evicting the oldest when full, and return the new mean
    pub fn push(&mut self, l_per_100km: f64) -> f64 {
        self.window.push_back(l_per_100km);
        while self.window.len() > self.capacity() {
            self.window.pop_front();
        }
        self.smoothed()
    }

    /// Mean of the window, 0 while empty
    pub fn smoothed(&self) -> f64 {
        if self.window.is_empty() {
            return 0.0;
        }
        self.window.iter().sum::<f64>() / self.window.len() as f64
    }

    /// Samples oldest first
    pub fn samples(&self) -> impl Iterator<Item = f64> + '_ {
        self.window.iter().copied()
    }

    /// Fold one tick's measurements into the window
    pub fn update(&mut self, speed_kmh: f64, maf_g_s: f64, fuel_level_percent: i32) -> FuelReading {
        let liters_per_hour = self.liters_per_hour(maf_g_s);
        let instantaneous = if speed_kmh > 0.0 {
            liters_per_hour / speed_kmh * 100.0
        } else {
            0.0
        };

        FuelReading {
            fuel_level_percent,
            smoothed_l_per_100km: self.push(instantaneous),
            liters_per_hour,
            speed_kmh,
        }
    }

    pub fn reset(&mut self) {
        self.window.clear();
    }
}
