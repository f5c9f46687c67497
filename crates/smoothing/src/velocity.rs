//! Angular velocity from successive smoothed-angle samples.

/// `|curr - prev| * 1000 / dt_ms`, in degrees per second.
///
/// Returns `0` whenever `dt_ms <= 0` (a non-monotonic or duplicate
/// timestamp is treated as zero elapsed time, never as an error).
#[must_use]
pub fn calculate_angular_velocity(prev: Option<f32>, curr: f32, dt_ms: f32) -> f32 {
    let Some(prev) = prev else {
        return 0.0;
    };
    if dt_ms <= 0.0 {
        return 0.0;
    }
    (curr - prev).abs() * 1000.0 / dt_ms
}

/// EMA smoother over a velocity stream, `alpha = 0.3`.
#[derive(Debug, Clone, Copy, Default)]
pub struct VelocitySmoother {
    prev: Option<f32>,
}

const VELOCITY_SMOOTHING_ALPHA: f32 = 0.3;

impl VelocitySmoother {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn smooth(&mut self, raw: f32) -> f32 {
        let value = match self.prev {
            None => raw,
            Some(prev) => VELOCITY_SMOOTHING_ALPHA * raw + (1.0 - VELOCITY_SMOOTHING_ALPHA) * prev,
        };
        self.prev = Some(value);
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_or_negative_dt_yields_zero_velocity() {
        assert_eq!(calculate_angular_velocity(Some(10.0), 20.0, 0.0), 0.0);
        assert_eq!(calculate_angular_velocity(Some(10.0), 20.0, -5.0), 0.0);
    }

    #[test]
    fn missing_previous_sample_yields_zero() {
        assert_eq!(calculate_angular_velocity(None, 20.0, 33.0), 0.0);
    }

    #[test]
    fn velocity_scales_with_delta_over_dt() {
        // 10 degrees over 1000 ms == 10 deg/s
        assert!((calculate_angular_velocity(Some(0.0), 10.0, 1000.0) - 10.0).abs() < 1e-4);
    }

    #[test]
    fn first_sample_of_smoother_passes_through() {
        let mut smoother = VelocitySmoother::new();
        assert_eq!(smoother.smooth(42.0), 42.0);
    }
}
