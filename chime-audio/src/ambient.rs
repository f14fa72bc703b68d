//! Ambient bed - long-running pad with a breathing lowpass
//!
//! A bed is 1-3 slightly detuned oscillators summed into one lowpass filter.
//! A sub-1 Hz LFO sweeps the cutoff up and down. The pad fades in when
//! started and fades out before it is removed from the graph.

use crate::filter::{Biquad, FilterSpec};
use crate::graph::{Graph, NodeId};
use crate::oscillator::{cents_to_ratio, Oscillator, Waveform};
use crate::param::{Param, FLOOR};
use tracing::debug;

/// Fade-in time when a bed starts
pub const AMBIENT_FADE_IN: f64 = 1.0;
/// Fade-out time before a bed is disconnected
pub const AMBIENT_FADE_OUT: f64 = 0.4;

/// Frames between filter coefficient updates
const CONTROL_INTERVAL: u32 = 64;

/// Built-in ambient beds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AmbientBed {
    /// Warm low drone
    #[default]
    Calm,
    /// Buzzier hum for the machine/gear scenes
    Machine,
    /// Airy open fifth for the sky/drone-delivery scenes
    Sky,
}

/// One oscillator in a pad
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PadVoice {
    pub waveform: Waveform,
    pub frequency: f32,
    pub detune: f32,
}

/// Description of a pad
#[derive(Debug, Clone, PartialEq)]
pub struct AmbientSpec {
    pub voices: Vec<PadVoice>,
    /// Center cutoff of the lowpass
    pub cutoff: f32,
    pub q: f32,
    /// LFO rate in Hz (kept below 1 Hz)
    pub lfo_rate: f32,
    /// Cutoff sweep depth in octaves
    pub lfo_depth: f32,
    /// Target gain after the fade-in
    pub gain: f32,
}

impl AmbientBed {
    pub const ALL: [AmbientBed; 3] = [AmbientBed::Calm, AmbientBed::Machine, AmbientBed::Sky];

    pub fn name(&self) -> &'static str {
        match self {
            AmbientBed::Calm => "calm",
            AmbientBed::Machine => "machine",
            AmbientBed::Sky => "sky",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|bed| bed.name().eq_ignore_ascii_case(name.trim()))
    }

    pub fn spec(&self) -> AmbientSpec {
        let voice = |waveform, frequency, detune| PadVoice {
            waveform,
            frequency,
            detune,
        };
        match self {
            AmbientBed::Calm => AmbientSpec {
                voices: vec![
                    voice(Waveform::Sine, 110.0, 0.0),
                    voice(Waveform::Triangle, 110.0, 7.0),
                    voice(Waveform::Sine, 164.81, -5.0),
                ],
                cutoff: 600.0,
                q: 0.9,
                lfo_rate: 0.12,
                lfo_depth: 0.8,
                gain: 0.05,
            },
            AmbientBed::Machine => AmbientSpec {
                voices: vec![
                    voice(Waveform::Sawtooth, 55.0, 0.0),
                    voice(Waveform::Square, 82.41, 4.0),
                ],
                cutoff: 420.0,
                q: 1.4,
                lfo_rate: 0.25,
                lfo_depth: 1.0,
                gain: 0.035,
            },
            AmbientBed::Sky => AmbientSpec {
                voices: vec![
                    voice(Waveform::Sine, 220.0, -4.0),
                    voice(Waveform::Sine, 329.63, 4.0),
                ],
                cutoff: 1400.0,
                q: 0.707,
                lfo_rate: 0.08,
                lfo_depth: 0.6,
                gain: 0.04,
            },
        }
    }
}

/// Live pad owned by the render graph
pub(crate) struct Pad {
    oscillators: Vec<Oscillator>,
    filter: Biquad,
    lfo: Oscillator,
    base_cutoff: f32,
    lfo_depth: f32,
    gain: Param,
    /// Scheduled disconnect time, set by `release`
    stop: Option<f64>,
    frames_until_control: u32,
}

impl Pad {
    pub(crate) fn new(spec: &AmbientSpec, start: f64, sample_rate: f32) -> Self {
        let oscillators = spec
            .voices
            .iter()
            .take(3)
            .enumerate()
            .map(|(i, v)| {
                Oscillator::new(v.waveform, v.frequency * cents_to_ratio(v.detune), sample_rate)
                    .with_phase(i as f32 * 0.33)
            })
            .collect();

        let mut gain = Param::new(0.0);
        gain.set_value_at_time(0.0, start);
        gain.linear_ramp_to_value_at_time(spec.gain.clamp(0.0, 0.2), start + AMBIENT_FADE_IN);

        let filter = FilterSpec {
            q: spec.q,
            ..FilterSpec::lowpass(spec.cutoff)
        };

        Self {
            oscillators,
            filter: Biquad::new(filter, sample_rate),
            lfo: Oscillator::new(Waveform::Sine, spec.lfo_rate.clamp(0.01, 0.99), sample_rate),
            base_cutoff: spec.cutoff,
            lfo_depth: spec.lfo_depth.clamp(0.0, 2.0),
            gain,
            stop: None,
            frames_until_control: 0,
        }
    }

    pub(crate) fn oscillator_count(&self) -> usize {
        self.oscillators.len()
    }

    pub(crate) fn is_releasing(&self) -> bool {
        self.stop.is_some()
    }

    /// Fade to the floor starting at `time`, then stop
    pub(crate) fn release(&mut self, time: f64, fade: f64) {
        if self.stop.is_some() {
            return;
        }
        self.gain.cancel_and_hold_at_time(time);
        self.gain.linear_ramp_to_value_at_time(FLOOR, time + fade);
        self.stop = Some(time + fade);
    }

    pub(crate) fn is_finished(&self, time: f64) -> bool {
        self.stop.is_some_and(|stop| time >= stop)
    }

    pub(crate) fn gain_at(&self, time: f64) -> f32 {
        self.gain.value_at(time)
    }

    /// Render one frame (mono pad, same on both channels)
    #[inline]
    pub(crate) fn render(&mut self, time: f64) -> f32 {
        if self.is_finished(time) {
            return 0.0;
        }

        // The LFO runs every frame so it keeps phase; the filter only updates at control rate
        let lfo = self.lfo.next_sample();
        if self.frames_until_control == 0 {
            self.filter.set_cutoff(self.base_cutoff * (lfo * self.lfo_depth).exp2());
            self.frames_until_control = CONTROL_INTERVAL;
        }
        self.frames_until_control -= 1;

        let count = self.oscillators.len().max(1) as f32;
        let sum: f32 = self.oscillators.iter_mut().map(|o| o.next_sample()).sum();
        self.filter.process_sample(sum / count) * self.gain.value_at(time)
    }

    pub(crate) fn prune(&mut self, time: f64) {
        self.gain.prune_before(time);
    }
}

/// Tracks the single active bed of an engine
#[derive(Debug, Default)]
pub struct AmbientManager {
    active: Option<(AmbientBed, NodeId)>,
}

impl AmbientManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_running(&self) -> bool {
        self.active.is_some()
    }

    pub fn active_bed(&self) -> Option<AmbientBed> {
        self.active.map(|(bed, _)| bed)
    }

    /// Start a bed, replacing (and fading out) any bed already running
    pub fn start(&mut self, graph: &mut Graph, bed: AmbientBed) -> NodeId {
        if self.is_running() {
            self.stop(graph);
        }
        let now = graph.current_time();
        let id = graph.add_pad(&bed.spec(), now);
        debug!(bed = bed.name(), node = id.0, "ambient bed started");
        self.active = Some((bed, id));
        id
    }

    /// Fade the active bed out; the graph disconnects it when the fade ends
    pub fn stop(&mut self, graph: &mut Graph) {
        let Some((bed, id)) = self.active.take() else {
            return;
        };
        let now = graph.current_time();
        graph.release_pad(id, now, AMBIENT_FADE_OUT);
        debug!(bed = bed.name(), node = id.0, "ambient bed fading out");
    }

    /// Forget the active bed without touching any graph (the graph is gone)
    pub fn clear(&mut self) {
        self.active = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn advance(graph: &mut Graph, seconds: f64) {
        let frames = (seconds * graph.sample_rate() as f64).ceil() as usize;
        let mut buf = vec![0.0f32; 512 * 2];
        let mut left = frames;
        while left > 0 {
            let n = left.min(512);
            graph.process(&mut buf[..n * 2]);
            left -= n;
        }
    }

    #[test]
    fn test_bed_specs_are_gentle() {
        for bed in AmbientBed::ALL {
            let spec = bed.spec();
            assert!((1..=3).contains(&spec.voices.len()), "{}", bed.name());
            assert!(spec.lfo_rate < 1.0);
            assert!(spec.gain <= 0.2);
        }
    }

    #[test]
    fn test_bed_names_roundtrip() {
        for bed in AmbientBed::ALL {
            assert_eq!(AmbientBed::from_name(bed.name()), Some(bed));
        }
        assert_eq!(AmbientBed::from_name(" SKY "), Some(AmbientBed::Sky));
        assert_eq!(AmbientBed::from_name("ocean"), None);
    }

    #[test]
    fn test_fade_in() {
        let mut graph = Graph::new(48000);
        let mut manager = AmbientManager::new();
        manager.start(&mut graph, AmbientBed::Calm);
        let (_, id) = manager.active.expect("running");

        assert!(graph.pad_gain_at(id, 0.0).unwrap_or(1.0) < 0.001);
        let target = AmbientBed::Calm.spec().gain;
        let full = graph.pad_gain_at(id, AMBIENT_FADE_IN).unwrap_or(0.0);
        assert!((full - target).abs() < 1e-6);
    }

    #[test]
    fn test_stop_when_stopped_is_noop() {
        let mut graph = Graph::new(48000);
        let mut manager = AmbientManager::new();
        manager.stop(&mut graph);
        assert!(!manager.is_running());
        assert_eq!(graph.pad_count(), 0);
    }

    #[test]
    fn test_restart_replaces_bed() {
        let mut graph = Graph::new(48000);
        let mut manager = AmbientManager::new();
        manager.start(&mut graph, AmbientBed::Calm);
        manager.start(&mut graph, AmbientBed::Sky);
        assert_eq!(manager.active_bed(), Some(AmbientBed::Sky));
        // Old bed still fading, new bed live
        assert_eq!(graph.pad_count(), 2);
        advance(&mut graph, AMBIENT_FADE_OUT + 0.05);
        assert_eq!(graph.pad_count(), 1);
    }

    #[test]
    fn test_start_stop_cycles_leave_no_nodes() {
        let mut graph = Graph::new(48000);
        let mut manager = AmbientManager::new();
        for _ in 0..10 {
            manager.start(&mut graph, AmbientBed::Machine);
            advance(&mut graph, 0.05);
            manager.stop(&mut graph);
        }
        advance(&mut graph, AMBIENT_FADE_OUT + 0.05);
        assert!(!manager.is_running());
        assert_eq!(graph.pad_count(), 0);
        assert_eq!(graph.oscillator_count(), 0);
    }
}
