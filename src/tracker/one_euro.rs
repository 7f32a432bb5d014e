use crate::config::SmoothConfig;

/// Fallback frame interval when timestamps repeat or go backwards (30 fps).
const DEFAULT_DT: f64 = 1.0 / 30.0;

/// Low-pass filter component
struct LowPassFilter {
    prev: Option<f64>,
}

impl LowPassFilter {
    fn new() -> Self {
        Self { prev: None }
    }

    fn filter(&mut self, value: f64, alpha: f64) -> f64 {
        match self.prev {
            Some(prev) => {
                let result = alpha * value + (1.0 - alpha) * prev;
                self.prev = Some(result);
                result
            }
            None => {
                self.prev = Some(value);
                value
            }
        }
    }

    fn reset(&mut self) {
        self.prev = None;
    }
}

/// alpha = 1 / (1 + tau/Te), tau = 1/(2*pi*fc)
fn smoothing_factor(te: f64, cutoff: f64) -> f64 {
    let r = 2.0 * std::f64::consts::PI * cutoff * te;
    r / (r + 1.0)
}

/// One Euro Filter for a joint angle, timed by frame timestamps.
pub struct AngleFilter {
    min_cutoff: f64,
    beta: f64,
    d_cutoff: f64,
    x_filter: LowPassFilter,
    dx_filter: LowPassFilter,
    prev_value: Option<f64>,
    last_timestamp_us: Option<u64>,
}

impl AngleFilter {
    pub fn new(min_cutoff: f64, beta: f64, d_cutoff: f64) -> Self {
        Self {
            min_cutoff,
            beta,
            d_cutoff,
            x_filter: LowPassFilter::new(),
            dx_filter: LowPassFilter::new(),
            prev_value: None,
            last_timestamp_us: None,
        }
    }

    pub fn from_config(config: &SmoothConfig) -> Self {
        Self::new(config.min_cutoff, config.beta, config.d_cutoff)
    }

    pub fn apply(&mut self, value: f64, timestamp_us: u64) -> f64 {
        let dt = match self.last_timestamp_us {
            Some(t) if timestamp_us > t => (timestamp_us - t) as f64 / 1_000_000.0,
            Some(_) => DEFAULT_DT,
            None => {
                self.last_timestamp_us = Some(timestamp_us);
                self.prev_value = Some(value);
                return self.x_filter.filter(value, 1.0);
            }
        };
        self.last_timestamp_us = Some(timestamp_us);

        let dx = match self.prev_value {
            Some(prev) => (value - prev) / dt,
            None => 0.0,
        };
        self.prev_value = Some(value);

        let edx = self
            .dx_filter
            .filter(dx, smoothing_factor(dt, self.d_cutoff));
        let cutoff = self.min_cutoff + self.beta * edx.abs();
        self.x_filter.filter(value, smoothing_factor(dt, cutoff))
    }

    pub fn reset(&mut self) {
        self.x_filter.reset();
        self.dx_filter.reset();
        self.prev_value = None;
        self.last_timestamp_us = None;
    }
}
