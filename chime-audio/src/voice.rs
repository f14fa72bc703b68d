//! Tone primitive - one oscillator, envelope, optional filter and pan
//!
//! A `ToneSpec` is an immutable description. Each time it is played the
//! graph builds a fresh `Voice` from it; voices are never restarted.

use crate::envelope::{finite_or, Envelope, EnvelopeSchedule};
use crate::filter::{Biquad, FilterSpec};
use crate::oscillator::{cents_to_ratio, Oscillator, Waveform};
use crate::param::Param;
use std::f32::consts::FRAC_PI_4;

/// Lowest/highest oscillator frequency accepted
pub const MIN_FREQUENCY: f32 = 20.0;
pub const MAX_FREQUENCY: f32 = 20000.0;
/// Longest hold time for a single tone
pub const MAX_DURATION: f32 = 2.0;

/// Description of one sound
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToneSpec {
    pub waveform: Waveform,
    /// Hz
    pub frequency: f32,
    /// Hold time between decay and release, in seconds
    pub duration: f32,
    /// Peak gain (0.0-1.0, master-relative)
    pub gain: f32,
    pub envelope: Envelope,
    /// Detune in cents
    pub detune: f32,
    /// Stereo position (-1.0 left, 1.0 right); `None` feeds both channels equally
    pub pan: Option<f32>,
    pub filter: Option<FilterSpec>,
}

impl ToneSpec {
    pub fn new(waveform: Waveform, frequency: f32, duration: f32, gain: f32) -> Self {
        Self {
            waveform,
            frequency,
            duration,
            gain,
            envelope: Envelope::default(),
            detune: 0.0,
            pan: None,
            filter: None,
        }
    }

    pub fn with_envelope(mut self, envelope: Envelope) -> Self {
        self.envelope = envelope;
        self
    }

    pub fn with_detune(mut self, cents: f32) -> Self {
        self.detune = cents;
        self
    }

    pub fn with_pan(mut self, pan: f32) -> Self {
        self.pan = Some(pan);
        self
    }

    pub fn with_filter(mut self, filter: FilterSpec) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Same tone at a different pitch
    pub fn at(mut self, frequency: f32) -> Self {
        self.frequency = frequency;
        self
    }

    /// Copy with every field forced into its documented range
    pub fn sanitized(&self) -> Self {
        Self {
            waveform: self.waveform,
            frequency: finite_or(self.frequency, 440.0).clamp(MIN_FREQUENCY, MAX_FREQUENCY),
            duration: finite_or(self.duration, 0.0).clamp(0.0, MAX_DURATION),
            gain: finite_or(self.gain, 0.0).clamp(0.0, 1.0),
            envelope: self.envelope.sanitized(),
            detune: finite_or(self.detune, 0.0).clamp(-1200.0, 1200.0),
            pan: self.pan.map(|p| finite_or(p, 0.0).clamp(-1.0, 1.0)),
            filter: self.filter,
        }
    }

    /// Audible length: attack + decay + duration + release
    pub fn length(&self) -> f64 {
        let tone = self.sanitized();
        tone.envelope.length(tone.duration)
    }

    /// Envelope breakpoints for this tone starting at `start`
    pub fn schedule(&self, start: f64) -> EnvelopeSchedule {
        let tone = self.sanitized();
        tone.envelope.schedule(start, tone.duration, tone.gain)
    }
}

/// Equal-power pan law
fn pan_gains(pan: Option<f32>) -> (f32, f32) {
    match pan {
        None => (1.0, 1.0),
        Some(p) => {
            let angle = (p + 1.0) * FRAC_PI_4;
            (angle.cos(), angle.sin())
        }
    }
}

/// Live voice owned by the render graph
pub(crate) struct Voice {
    oscillator: Oscillator,
    filter: Option<Biquad>,
    gain: Param,
    pan: (f32, f32),
    start: f64,
    stop: f64,
}

impl Voice {
    pub(crate) fn new(spec: &ToneSpec, start: f64, sample_rate: f32) -> Self {
        let tone = spec.sanitized();
        let frequency = tone.frequency * cents_to_ratio(tone.detune);
        let schedule = tone.envelope.schedule(start, tone.duration, tone.gain);

        let mut gain = Param::new(0.0);
        schedule.apply(&mut gain);

        Self {
            oscillator: Oscillator::new(tone.waveform, frequency, sample_rate),
            filter: tone.filter.map(|f| Biquad::new(f, sample_rate)),
            gain,
            pan: pan_gains(tone.pan),
            start,
            stop: schedule.stop_time,
        }
    }

    pub(crate) fn start_time(&self) -> f64 {
        self.start
    }

    pub(crate) fn stop_time(&self) -> f64 {
        self.stop
    }

    /// Whether the voice has passed its scheduled stop
    pub(crate) fn is_finished(&self, time: f64) -> bool {
        time >= self.stop
    }

    /// Render one stereo frame at `time`
    #[inline]
    pub(crate) fn render(&mut self, time: f64) -> (f32, f32) {
        if time < self.start || time >= self.stop {
            return (0.0, 0.0);
        }
        let mut s = self.oscillator.next_sample();
        if let Some(filter) = self.filter.as_mut() {
            s = filter.process_sample(s);
        }
        let s = s * self.gain.value_at(time);
        (s * self.pan.0, s * self.pan.1)
    }
}
