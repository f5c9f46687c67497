//! Rolling angle prediction with look-ahead threshold crossing.

use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::hash::Hash;

use crate::error::{ConfigError, Result};
use crate::velocity::VelocitySmoother;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PredictionConfig {
    /// How far ahead, in milliseconds, to extrapolate.
    pub look_ahead_ms: u64,
    /// Samples needed before confidence saturates at `1.0`.
    pub min_samples_for_prediction: usize,
    /// Bound on the per-channel sample ring buffer.
    pub history_capacity: usize,
    /// A threshold crossing must persist this long before being reported.
    pub hysteresis_ms: u64,
    /// Confidence at or above which a prediction is considered reliable.
    pub reliability_threshold: f32,
}

impl Default for PredictionConfig {
    fn default() -> Self {
        Self {
            look_ahead_ms: 200,
            min_samples_for_prediction: 5,
            history_capacity: 30,
            hysteresis_ms: 150,
            reliability_threshold: 0.5,
        }
    }
}

impl PredictionConfig {
    pub fn new(
        look_ahead_ms: u64,
        min_samples_for_prediction: usize,
        history_capacity: usize,
        hysteresis_ms: u64,
        reliability_threshold: f32,
    ) -> Result<Self> {
        if min_samples_for_prediction < 1 {
            return Err(ConfigError::InvalidWindowSize(min_samples_for_prediction));
        }
        if history_capacity < min_samples_for_prediction {
            return Err(ConfigError::InvalidWindowSize(history_capacity));
        }
        if !(0.0..=1.0).contains(&reliability_threshold) {
            return Err(ConfigError::InvalidConfidenceThreshold(reliability_threshold));
        }
        Ok(Self {
            look_ahead_ms,
            min_samples_for_prediction,
            history_capacity,
            hysteresis_ms,
            reliability_threshold,
        })
    }
}

/// The band a channel is considered "critical" inside; used to flag
/// predicted threshold crossings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CriticalBand {
    pub min: f32,
    pub max: f32,
}

impl CriticalBand {
    #[must_use]
    pub fn contains(&self, value: f32) -> bool {
        value < self.min || value > self.max
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChannelPrediction {
    pub predicted_value: f32,
    pub angular_velocity: f32,
    pub confidence: f32,
    pub is_reliable: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiskLevel {
    Good,
    Warning,
    Danger,
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Good => "good",
            Self::Warning => "warning",
            Self::Danger => "danger",
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PredictionResult<C> {
    pub predictions: HashMap<C, ChannelPrediction>,
    pub threshold_crossings: Vec<C>,
    pub overall_risk_level: RiskLevel,
}

struct ChannelState {
    history: VecDeque<(u64, f32)>,
    velocity_smoother: VelocitySmoother,
    pending_crossing_since: Option<u64>,
}

impl ChannelState {
    fn new() -> Self {
        Self {
            history: VecDeque::new(),
            velocity_smoother: VelocitySmoother::new(),
            pending_crossing_since: None,
        }
    }
}

/// Per-channel bounded history of recent angles, producing a short-horizon
/// linear prediction and risk-banded threshold-crossing alerts.
pub struct AnglePredictionEngine<C: Copy + Eq + Hash> {
    config: PredictionConfig,
    critical_bands: HashMap<C, CriticalBand>,
    channels: HashMap<C, ChannelState>,
}

impl<C: Copy + Eq + Hash> AnglePredictionEngine<C> {
    #[must_use]
    pub fn new(config: PredictionConfig, critical_bands: Vec<(C, CriticalBand)>) -> Self {
        Self {
            config,
            critical_bands: critical_bands.into_iter().collect(),
            channels: HashMap::new(),
        }
    }

    /// Resets all per-channel history. Configuration and critical bands are
    /// retained.
    pub fn reset(&mut self) {
        self.channels.clear();
    }

    /// Feed one frame of angles and produce a prediction for every channel
    /// present.
    pub fn predict(&mut self, angles: &[(C, f32)], timestamp_ms: u64) -> PredictionResult<C> {
        let mut predictions = HashMap::with_capacity(angles.len());
        let mut threshold_crossings = Vec::new();
        let mut any_pending = false;

        for &(channel, angle) in angles {
            let state = self
                .channels
                .entry(channel)
                .or_insert_with(ChannelState::new);

            push_bounded(&mut state.history, timestamp_ms, angle, self.config.history_capacity);

            let history_len = state.history.len();
            let (predicted_value, signed_rate) = if history_len < 2 {
                (angle, 0.0)
            } else {
                let mut iter = state.history.iter().rev();
                let (t_curr, v_curr) = *iter.next().unwrap();
                let (t_prev, v_prev) = *iter.next().unwrap();
                let dt_ms = (t_curr as i64 - t_prev as i64).max(0) as f32;
                let rate = if dt_ms <= 0.0 {
                    0.0
                } else {
                    (v_curr - v_prev) * 1000.0 / dt_ms
                };
                let predicted = angle + rate * (self.config.look_ahead_ms as f32 / 1000.0);
                (predicted, rate)
            };

            let angular_velocity = state.velocity_smoother.smooth(signed_rate.abs());

            let confidence =
                (history_len as f32 / self.config.min_samples_for_prediction as f32).min(1.0);
            let is_reliable =
                history_len >= 2 && confidence >= self.config.reliability_threshold;

            predictions.insert(
                channel,
                ChannelPrediction {
                    predicted_value,
                    angular_velocity,
                    confidence,
                    is_reliable,
                },
            );

            if let Some(band) = self.critical_bands.get(&channel) {
                let currently_critical = band.contains(angle);
                let predicted_critical = band.contains(predicted_value);
                let crossing_now = !currently_critical && predicted_critical;

                if crossing_now {
                    let since = *state.pending_crossing_since.get_or_insert(timestamp_ms);
                    if timestamp_ms.saturating_sub(since) >= self.config.hysteresis_ms {
                        threshold_crossings.push(channel);
                    } else {
                        any_pending = true;
                    }
                } else {
                    state.pending_crossing_since = None;
                }
            }
        }

        let overall_risk_level = if !threshold_crossings.is_empty() {
            RiskLevel::Danger
        } else if any_pending {
            RiskLevel::Warning
        } else {
            RiskLevel::Good
        };

        PredictionResult {
            predictions,
            threshold_crossings,
            overall_risk_level,
        }
    }
}

fn push_bounded(history: &mut VecDeque<(u64, f32)>, timestamp_ms: u64, value: f32, capacity: usize) {
    if history.len() >= capacity {
        history.pop_front();
    }
    history.push_back((timestamp_ms, value));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    enum Channel {
        LeftKnee,
    }

    #[test]
    fn stationary_signal_predicts_itself_reliably() {
        let config = PredictionConfig::default();
        let mut engine = AnglePredictionEngine::new(
            config,
            vec![(
                Channel::LeftKnee,
                CriticalBand {
                    min: 0.0,
                    max: 200.0,
                },
            )],
        );

        let mut t = 1000u64;
        let mut last = None;
        for _ in 0..10 {
            last = Some(engine.predict(&[(Channel::LeftKnee, 90.0)], t));
            t += 33;
        }
        let result = engine.predict(&[(Channel::LeftKnee, 90.0)], t);
        let prediction = result.predictions[&Channel::LeftKnee];
        assert!((prediction.predicted_value - 90.0).abs() < 1e-3);
        assert!(result.threshold_crossings.is_empty());
        assert!(prediction.is_reliable);
        assert!(prediction.confidence > 0.5);
        assert!(last.is_some());
    }

    #[test]
    fn first_sample_has_low_confidence() {
        let mut engine =
            AnglePredictionEngine::<Channel>::new(PredictionConfig::default(), Vec::new());
        let result = engine.predict(&[(Channel::LeftKnee, 90.0)], 0);
        let prediction = result.predictions[&Channel::LeftKnee];
        assert!(!prediction.is_reliable);
        assert_eq!(prediction.predicted_value, 90.0);
    }

    #[test]
    fn reset_clears_history() {
        let mut engine =
            AnglePredictionEngine::<Channel>::new(PredictionConfig::default(), Vec::new());
        engine.predict(&[(Channel::LeftKnee, 90.0)], 0);
        engine.predict(&[(Channel::LeftKnee, 95.0)], 33);
        engine.reset();
        let result = engine.predict(&[(Channel::LeftKnee, 95.0)], 66);
        assert!(!result.predictions[&Channel::LeftKnee].is_reliable);
    }

    #[test]
    fn rapidly_approaching_critical_band_eventually_crosses_after_hysteresis() {
        let config = PredictionConfig {
            hysteresis_ms: 50,
            ..PredictionConfig::default()
        };
        let mut engine = AnglePredictionEngine::new(
            config,
            vec![(
                Channel::LeftKnee,
                CriticalBand {
                    min: 150.0,
                    max: 999.0,
                },
            )],
        );
        engine.predict(&[(Channel::LeftKnee, 100.0)], 0);
        let mut last_risk = RiskLevel::Good;
        for (t, angle) in [(33, 140.0), (66, 180.0), (99, 220.0), (132, 260.0)] {
            last_risk = engine.predict(&[(Channel::LeftKnee, angle)], t).overall_risk_level;
        }
        assert_ne!(last_risk, RiskLevel::Good);
    }
}
