//! Per-channel exponential smoothing with outlier rejection.

use std::collections::{HashMap, VecDeque};
use std::hash::Hash;

use crate::error::{ConfigError, Result};

/// Tuning for a single [`AngleSmoother`] channel.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SmoothingConfig {
    /// Responsiveness, `alpha` in `smoothed = alpha*raw + (1-alpha)*prev`.
    pub alpha: f32,
    /// Size of the ring buffer of recent raw values used for outlier
    /// rejection.
    pub window_size: usize,
    /// Samples more than `outlier_threshold` standard deviations from the
    /// window mean are rejected.
    pub outlier_threshold: f32,
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self {
            alpha: 0.3,
            window_size: 10,
            outlier_threshold: 2.5,
        }
    }
}

impl SmoothingConfig {
    pub fn new(alpha: f32, window_size: usize, outlier_threshold: f32) -> Result<Self> {
        if !(0.0 < alpha && alpha <= 1.0) {
            return Err(ConfigError::InvalidAlpha(alpha));
        }
        if window_size < 1 {
            return Err(ConfigError::InvalidWindowSize(window_size));
        }
        if outlier_threshold <= 0.0 {
            return Err(ConfigError::InvalidOutlierThreshold(outlier_threshold));
        }
        Ok(Self {
            alpha,
            window_size,
            outlier_threshold,
        })
    }
}

/// Result of smoothing a single raw sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SmoothedSample {
    pub smoothed_value: f32,
    pub is_outlier: bool,
}

/// One channel's exponential moving average state, with a bounded history
/// window used only to detect outliers before they enter the EMA.
#[derive(Debug, Clone)]
pub struct AngleSmoother {
    config: SmoothingConfig,
    prev: Option<f32>,
    history: VecDeque<f32>,
    pub outliers_rejected: u32,
}

impl AngleSmoother {
    #[must_use]
    pub fn new(config: SmoothingConfig) -> Self {
        Self {
            config,
            prev: None,
            history: VecDeque::with_capacity(config.window_size),
            outliers_rejected: 0,
        }
    }

    /// Feed one raw sample through the smoother.
    ///
    /// On the first call, `prev` is seeded and the input is returned
    /// unchanged (smoothers never lead the true signal, and
    /// never alter an unsmoothed first sample).
    pub fn smooth(&mut self, raw: f32) -> SmoothedSample {
        let Some(prev) = self.prev else {
            self.prev = Some(raw);
            self.history.push_back(raw);
            return SmoothedSample {
                smoothed_value: raw,
                is_outlier: false,
            };
        };

        if self.is_outlier(raw) {
            self.outliers_rejected += 1;
            tracing::debug!(raw, prev, "rejecting outlier angle sample");
            return SmoothedSample {
                smoothed_value: prev,
                is_outlier: true,
            };
        }

        let smoothed = self.config.alpha * raw + (1.0 - self.config.alpha) * prev;
        self.prev = Some(smoothed);
        self.push_history(raw);

        SmoothedSample {
            smoothed_value: smoothed,
            is_outlier: false,
        }
    }

    fn is_outlier(&self, raw: f32) -> bool {
        if self.history.len() < 2 {
            return false;
        }
        let mean = self.history.iter().sum::<f32>() / self.history.len() as f32;
        let variance = self
            .history
            .iter()
            .map(|v| (v - mean).powi(2))
            .sum::<f32>()
            / self.history.len() as f32;
        let stddev = variance.sqrt();
        if stddev == 0.0 {
            return false;
        }
        (raw - mean).abs() > self.config.outlier_threshold * stddev
    }

    fn push_history(&mut self, raw: f32) {
        if self.history.len() >= self.config.window_size {
            self.history.pop_front();
        }
        self.history.push_back(raw);
    }

    /// The most recently smoothed value, if any sample has been seen.
    #[must_use]
    pub fn current(&self) -> Option<f32> {
        self.prev
    }
}

/// A set of per-channel smoothers keyed by a small closed channel enum
/// (e.g. one variant per joint angle an exercise tracks).
#[derive(Debug, Clone)]
pub struct AngleSmootherSet<C> {
    config: SmoothingConfig,
    smoothers: HashMap<C, AngleSmoother>,
}

impl<C: Copy + Eq + Hash> AngleSmootherSet<C> {
    #[must_use]
    pub fn new(config: SmoothingConfig) -> Self {
        Self {
            config,
            smoothers: HashMap::new(),
        }
    }

    /// Smooth every `(channel, raw value)` pair, lazily creating smoothers
    /// for channels seen for the first time.
    pub fn smooth_all(&mut self, values: &[(C, f32)]) -> HashMap<C, SmoothedSample> {
        values
            .iter()
            .map(|&(channel, raw)| {
                let smoother = self
                    .smoothers
                    .entry(channel)
                    .or_insert_with(|| AngleSmoother::new(self.config));
                (channel, smoother.smooth(raw))
            })
            .collect()
    }

    #[must_use]
    pub fn channel(&self, channel: &C) -> Option<&AngleSmoother> {
        self.smoothers.get(channel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_rejects_bad_alpha() {
        assert!(SmoothingConfig::new(0.0, 10, 2.5).is_err());
        assert!(SmoothingConfig::new(1.1, 10, 2.5).is_err());
        assert!(SmoothingConfig::new(1.0, 10, 2.5).is_ok());
    }

    #[test]
    fn config_rejects_zero_window() {
        assert!(SmoothingConfig::new(0.3, 0, 2.5).is_err());
    }

    #[test]
    fn first_sample_passes_through_unchanged() {
        let mut smoother = AngleSmoother::new(SmoothingConfig::default());
        let sample = smoother.smooth(123.4);
        assert_eq!(sample.smoothed_value, 123.4);
        assert!(!sample.is_outlier);
    }

    #[test]
    fn ema_moves_toward_raw() {
        let mut smoother = AngleSmoother::new(
            SmoothingConfig::new(0.5, 10, 100.0).unwrap(), // huge threshold disables rejection
        );
        smoother.smooth(0.0);
        let second = smoother.smooth(10.0);
        assert!((second.smoothed_value - 5.0).abs() < 1e-4);
    }

    #[test]
    fn gross_outlier_is_rejected_and_flagged() {
        let mut smoother = AngleSmoother::new(SmoothingConfig::new(0.3, 10, 2.0).unwrap());
        for v in [90.0, 91.0, 89.0, 90.5, 89.5, 90.0] {
            smoother.smooth(v);
        }
        let before = smoother.current().unwrap();
        let sample = smoother.smooth(500.0);
        assert!(sample.is_outlier);
        assert_eq!(sample.smoothed_value, before);
        assert_eq!(smoother.outliers_rejected, 1);
    }

    #[test]
    fn history_stays_bounded() {
        let mut smoother = AngleSmoother::new(SmoothingConfig::new(0.5, 3, 100.0).unwrap());
        for v in 0..20 {
            smoother.smooth(v as f32);
        }
        assert!(smoother.history.len() <= 3);
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    enum Channel {
        LeftKnee,
        RightKnee,
    }

    #[test]
    fn smoother_set_keeps_channels_independent() {
        let mut set = AngleSmootherSet::<Channel>::new(SmoothingConfig::default());
        let first = set.smooth_all(&[(Channel::LeftKnee, 90.0), (Channel::RightKnee, 95.0)]);
        assert_eq!(first[&Channel::LeftKnee].smoothed_value, 90.0);
        assert_eq!(first[&Channel::RightKnee].smoothed_value, 95.0);
    }
}
