//! Biquad filter (low-pass, high-pass, band-pass) for single voices

use std::f32::consts::PI;

/// Filter type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilterType {
    #[default]
    LowPass,
    HighPass,
    BandPass,
}

/// Filter settings attached to a tone
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterSpec {
    pub filter_type: FilterType,
    /// Cutoff in Hz
    pub cutoff: f32,
    /// Q factor
    pub q: f32,
}

impl FilterSpec {
    pub const fn lowpass(cutoff: f32) -> Self {
        Self {
            filter_type: FilterType::LowPass,
            cutoff,
            q: 0.707,
        }
    }

    pub const fn highpass(cutoff: f32) -> Self {
        Self {
            filter_type: FilterType::HighPass,
            cutoff,
            q: 0.707,
        }
    }

    pub const fn bandpass(cutoff: f32, q: f32) -> Self {
        Self {
            filter_type: FilterType::BandPass,
            cutoff,
            q,
        }
    }
}

/// Mono biquad filter
#[derive(Debug, Clone)]
pub struct Biquad {
    filter_type: FilterType,
    sample_rate: f32,
    cutoff: f32,
    resonance: f32,

    // Normalized coefficients
    a0: f32,
    a1: f32,
    a2: f32,
    b1: f32,
    b2: f32,

    // State
    x1: f32,
    x2: f32,
    y1: f32,
    y2: f32,
}

impl Biquad {
    pub fn new(spec: FilterSpec, sample_rate: f32) -> Self {
        let mut filter = Self {
            filter_type: spec.filter_type,
            sample_rate,
            cutoff: 1000.0,
            resonance: 0.707,
            a0: 1.0,
            a1: 0.0,
            a2: 0.0,
            b1: 0.0,
            b2: 0.0,
            x1: 0.0,
            x2: 0.0,
            y1: 0.0,
            y2: 0.0,
        };
        filter.resonance = clamp_q(spec.q);
        filter.set_cutoff(spec.cutoff);
        filter
    }

    /// Set cutoff frequency (20 Hz up to just below Nyquist)
    pub fn set_cutoff(&mut self, cutoff: f32) {
        let max = (self.sample_rate * 0.49).min(20000.0);
        let cutoff = if cutoff.is_finite() { cutoff } else { 1000.0 };
        self.cutoff = cutoff.clamp(20.0, max);
        self.calculate_coefficients();
    }

    pub fn cutoff(&self) -> f32 {
        self.cutoff
    }

    pub fn filter_type(&self) -> FilterType {
        self.filter_type
    }

    fn calculate_coefficients(&mut self) {
        let omega = 2.0 * PI * self.cutoff / self.sample_rate;
        let sin_omega = omega.sin();
        let cos_omega = omega.cos();
        let alpha = sin_omega / (2.0 * self.resonance);

        let (b0, b1, b2) = match self.filter_type {
            FilterType::LowPass => {
                let b = (1.0 - cos_omega) / 2.0;
                (b, 1.0 - cos_omega, b)
            }
            FilterType::HighPass => {
                let b = (1.0 + cos_omega) / 2.0;
                (b, -(1.0 + cos_omega), b)
            }
            FilterType::BandPass => (alpha, 0.0, -alpha),
        };
        let a0 = 1.0 + alpha;
        let a1 = -2.0 * cos_omega;
        let a2 = 1.0 - alpha;

        self.a0 = b0 / a0;
        self.a1 = b1 / a0;
        self.a2 = b2 / a0;
        self.b1 = a1 / a0;
        self.b2 = a2 / a0;
    }

    #[inline]
    pub fn process_sample(&mut self, input: f32) -> f32 {
        let output = self.a0 * input + self.a1 * self.x1 + self.a2 * self.x2
            - self.b1 * self.y1
            - self.b2 * self.y2;

        self.x2 = self.x1;
        self.x1 = input;
        self.y2 = self.y1;
        self.y1 = output;

        output
    }
}

fn clamp_q(q: f32) -> f32 {
    if q.is_finite() {
        q.clamp(0.1, 20.0)
    } else {
        0.707
    }
}
