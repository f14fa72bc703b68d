//! ADSR envelope scheduling against the audio clock
//!
//! An envelope does not run per sample. It is turned into a list of
//! breakpoints on a gain `Param`:
//!
//! ```text
//! peak      /\
//!          /  \______________
//! sustain /                  \
//! floor  /                    \___
//!       |att|dec|   duration  |rel|
//! ```

use crate::param::{Curve, Param, FLOOR};

/// Extra time an oscillator keeps running after its release ends
pub const STOP_MARGIN: f64 = 0.02;

/// Shortest attack/release allowed (avoids clicks from instant jumps)
const MIN_RAMP: f32 = 0.002;

/// Attack/decay/sustain/release shape (times in seconds, sustain as fraction of peak)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Envelope {
    pub attack: f32,
    pub decay: f32,
    pub sustain: f32,
    pub release: f32,
}

impl Default for Envelope {
    fn default() -> Self {
        Self::new(0.01, 0.05, 0.7, 0.15)
    }
}

impl Envelope {
    pub const fn new(attack: f32, decay: f32, sustain: f32, release: f32) -> Self {
        Self {
            attack,
            decay,
            sustain,
            release,
        }
    }

    /// Percussive: near-instant attack, no decay stage
    pub const fn pluck(release: f32) -> Self {
        Self::new(0.002, 0.0, 1.0, release)
    }

    /// Gentle swell for pads and hints
    pub const fn soft(attack: f32, release: f32) -> Self {
        Self::new(attack, 0.0, 1.0, release)
    }

    /// Same envelope with every time and level forced into a usable range
    pub fn sanitized(&self) -> Self {
        Self {
            attack: finite_or(self.attack, MIN_RAMP).clamp(MIN_RAMP, 2.0),
            decay: finite_or(self.decay, 0.0).clamp(0.0, 2.0),
            sustain: finite_or(self.sustain, 1.0).clamp(0.0, 1.0),
            release: finite_or(self.release, MIN_RAMP).clamp(MIN_RAMP, 4.0),
        }
    }

    /// Audible length of a note that holds for `duration` seconds
    pub fn length(&self, duration: f32) -> f64 {
        let env = self.sanitized();
        (env.attack + env.decay + finite_or(duration, 0.0).max(0.0) + env.release) as f64
    }

    /// Compute breakpoints for a note starting at `start`
    pub fn schedule(&self, start: f64, duration: f32, peak: f32) -> EnvelopeSchedule {
        let env = self.sanitized();
        let duration = finite_or(duration, 0.0).max(0.0) as f64;
        let peak = finite_or(peak, 0.0).max(FLOOR);
        let sustain_level = (peak * env.sustain).max(FLOOR);

        let attack_end = start + env.attack as f64;
        let decay_end = attack_end + env.decay as f64;
        let hold_end = decay_end + duration;
        let release_end = hold_end + env.release as f64;

        let mut breakpoints = Vec::with_capacity(5);
        breakpoints.push(Breakpoint::new(start, FLOOR, Curve::Set));
        breakpoints.push(Breakpoint::new(attack_end, peak, Curve::Exponential));
        if env.decay > 0.0 {
            breakpoints.push(Breakpoint::new(decay_end, sustain_level, Curve::Exponential));
        }
        // Hold: a set to the level it already has keeps the segment flat
        breakpoints.push(Breakpoint::new(hold_end, sustain_level, Curve::Set));
        breakpoints.push(Breakpoint::new(release_end, FLOOR, Curve::Exponential));

        EnvelopeSchedule {
            breakpoints,
            start,
            release_end,
            stop_time: release_end + STOP_MARGIN,
        }
    }
}

#[inline]
pub(crate) fn finite_or(value: f32, fallback: f32) -> f32 {
    if value.is_finite() {
        value
    } else {
        fallback
    }
}

/// One gain breakpoint
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Breakpoint {
    pub time: f64,
    pub value: f32,
    pub curve: Curve,
}

impl Breakpoint {
    fn new(time: f64, value: f32, curve: Curve) -> Self {
        Self { time, value, curve }
    }
}

/// Breakpoints plus the oscillator stop time for one note
#[derive(Debug, Clone, PartialEq)]
pub struct EnvelopeSchedule {
    pub breakpoints: Vec<Breakpoint>,
    pub start: f64,
    pub release_end: f64,
    pub stop_time: f64,
}

impl EnvelopeSchedule {
    /// Write the breakpoints onto a gain parameter
    pub fn apply(&self, param: &mut Param) {
        for bp in &self.breakpoints {
            match bp.curve {
                Curve::Set => param.set_value_at_time(bp.value, bp.time),
                Curve::Linear => param.linear_ramp_to_value_at_time(bp.value, bp.time),
                Curve::Exponential => param.exponential_ramp_to_value_at_time(bp.value, bp.time),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schedule_times_are_ordered() {
        let env = Envelope::new(0.01, 0.05, 0.6, 0.2);
        let sched = env.schedule(1.0, 0.1, 0.2);
        for pair in sched.breakpoints.windows(2) {
            assert!(pair[0].time <= pair[1].time);
        }
        assert!((sched.release_end - 1.36).abs() < 1e-6);
        assert!((sched.stop_time - (1.36 + STOP_MARGIN)).abs() < 1e-6);
    }

    #[test]
    fn test_applied_envelope_shape() {
        let env = Envelope::new(0.01, 0.05, 0.5, 0.1);
        let sched = env.schedule(0.0, 0.1, 0.2);
        let mut gain = Param::new(0.0);
        sched.apply(&mut gain);

        assert_eq!(gain.value_at(0.0), FLOOR);
        assert!((gain.value_at(0.01) - 0.2).abs() < 1e-5);
        // Sustain holds through the duration
        assert!((gain.value_at(0.08) - 0.1).abs() < 1e-5);
        assert!((gain.value_at(0.15) - 0.1).abs() < 1e-5);
        // Released back to the floor
        assert_eq!(gain.value_at(0.3), FLOOR);
    }

    #[test]
    fn test_sanitize_rejects_nan_and_negative() {
        let env = Envelope::new(f32::NAN, -1.0, 3.0, f32::INFINITY).sanitized();
        assert_eq!(env.attack, MIN_RAMP);
        assert_eq!(env.decay, 0.0);
        assert_eq!(env.sustain, 1.0);
        assert_eq!(env.release, MIN_RAMP);
    }

    #[test]
    fn test_zero_peak_stays_at_floor() {
        let sched = Envelope::default().schedule(0.0, 0.1, 0.0);
        assert!(sched.breakpoints.iter().all(|bp| bp.value == FLOOR));
    }
}
