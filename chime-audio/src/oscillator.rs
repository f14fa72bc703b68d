//! Oscillators - periodic waveforms and a white noise source

use std::f32::consts::PI;

/// Oscillator waveform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Waveform {
    #[default]
    Sine,
    Square,
    Triangle,
    Sawtooth,
    /// White noise (frequency is ignored)
    Noise,
}

impl Waveform {
    pub fn name(&self) -> &'static str {
        match self {
            Waveform::Sine => "sine",
            Waveform::Square => "square",
            Waveform::Triangle => "triangle",
            Waveform::Sawtooth => "sawtooth",
            Waveform::Noise => "noise",
        }
    }
}

/// Convert a detune in cents to a frequency ratio
#[inline]
pub fn cents_to_ratio(cents: f32) -> f32 {
    (cents / 1200.0).exp2()
}

/// Single-use oscillator
#[derive(Debug, Clone)]
pub struct Oscillator {
    waveform: Waveform,
    sample_rate: f32,
    frequency: f32,
    /// Normalized phase (0.0-1.0)
    phase: f32,
    noise_state: u32,
}

impl Oscillator {
    pub fn new(waveform: Waveform, frequency: f32, sample_rate: f32) -> Self {
        Self {
            waveform,
            sample_rate,
            frequency: frequency.clamp(0.0, sample_rate * 0.5),
            phase: 0.0,
            noise_state: 0x9E37_79B9,
        }
    }

    /// Start at an offset into the cycle (0.0-1.0)
    pub fn with_phase(mut self, phase: f32) -> Self {
        self.phase = phase.rem_euclid(1.0);
        self
    }

    pub fn waveform(&self) -> Waveform {
        self.waveform
    }

    pub fn frequency(&self) -> f32 {
        self.frequency
    }

    /// xorshift32, mapped to [-1, 1]
    #[inline]
    fn next_noise(&mut self) -> f32 {
        self.noise_state ^= self.noise_state << 13;
        self.noise_state ^= self.noise_state >> 17;
        self.noise_state ^= self.noise_state << 5;
        (self.noise_state as f32 / u32::MAX as f32) * 2.0 - 1.0
    }

    /// Produce the next sample in [-1, 1]
    #[inline]
    pub fn next_sample(&mut self) -> f32 {
        let p = self.phase;
        let out = match self.waveform {
            Waveform::Sine => (p * 2.0 * PI).sin(),
            Waveform::Square => {
                if p < 0.5 {
                    1.0
                } else {
                    -1.0
                }
            }
            Waveform::Triangle => 1.0 - 4.0 * (p - 0.5).abs(),
            Waveform::Sawtooth => 2.0 * p - 1.0,
            Waveform::Noise => self.next_noise(),
        };

        self.phase += self.frequency / self.sample_rate;
        if self.phase >= 1.0 {
            self.phase -= self.phase.floor();
        }

        out
    }
}
