//! Render graph - the node set behind an audio context
//!
//! The graph owns the audio clock, the master gain and every live node.
//! Voices and pads are tracked by `NodeId` and disconnected (dropped) as soon
//! as the clock passes their stop time, so the tracked set only ever holds
//! nodes that can still make sound.

use crate::ambient::{AmbientSpec, Pad};
use crate::error::AudioError;
use crate::param::Param;
use crate::voice::{ToneSpec, Voice};
use tracing::debug;

/// Maximum simultaneous voices (ambient pads not included)
pub const MAX_VOICES: usize = 64;

/// Identifier of a node in the graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u64);

/// Audio render graph
pub struct Graph {
    sample_rate: u32,
    /// Frames rendered so far (the audio clock)
    frame: u64,
    master: Param,
    voices: Vec<(NodeId, Voice)>,
    pads: Vec<(NodeId, Pad)>,
    next_id: u64,
}

impl Graph {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate: sample_rate.max(1),
            frame: 0,
            master: Param::new(1.0),
            voices: Vec::with_capacity(MAX_VOICES),
            pads: Vec::with_capacity(4),
            next_id: 1,
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Current audio clock in seconds
    pub fn current_time(&self) -> f64 {
        self.frame as f64 / self.sample_rate as f64
    }

    pub fn frames_rendered(&self) -> u64 {
        self.frame
    }

    pub fn master(&self) -> &Param {
        &self.master
    }

    pub fn master_mut(&mut self) -> &mut Param {
        &mut self.master
    }

    pub fn master_gain_at(&self, time: f64) -> f32 {
        self.master.value_at(time)
    }

    fn allocate_id(&mut self) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Fail unless `count` more voices fit
    pub fn ensure_capacity(&self, count: usize) -> Result<(), AudioError> {
        if self.voices.len() + count > MAX_VOICES {
            return Err(AudioError::VoiceLimit(self.voices.len()));
        }
        Ok(())
    }

    /// Build a new voice from `spec` starting at `start` (audio clock seconds)
    pub fn add_voice(&mut self, spec: &ToneSpec, start: f64) -> Result<NodeId, AudioError> {
        self.ensure_capacity(1)?;
        let id = self.allocate_id();
        let voice = Voice::new(spec, start, self.sample_rate as f32);
        debug!(
            node = id.0,
            waveform = spec.waveform.name(),
            frequency = spec.frequency,
            start,
            stop = voice.stop_time(),
            "voice scheduled"
        );
        self.voices.push((id, voice));
        Ok(id)
    }

    pub fn add_pad(&mut self, spec: &AmbientSpec, start: f64) -> NodeId {
        let id = self.allocate_id();
        self.pads.push((id, Pad::new(spec, start, self.sample_rate as f32)));
        id
    }

    /// Schedule a pad fade-out; returns false if the pad is unknown or already releasing
    pub fn release_pad(&mut self, id: NodeId, time: f64, fade: f64) -> bool {
        match self.pads.iter_mut().find(|(pid, _)| *pid == id) {
            Some((_, pad)) if !pad.is_releasing() => {
                pad.release(time, fade);
                true
            }
            _ => false,
        }
    }

    pub fn pad_gain_at(&self, id: NodeId, time: f64) -> Option<f32> {
        self.pads
            .iter()
            .find(|(pid, _)| *pid == id)
            .map(|(_, pad)| pad.gain_at(time))
    }

    pub fn voice_count(&self) -> usize {
        self.voices.len()
    }

    pub fn pad_count(&self) -> usize {
        self.pads.len()
    }

    /// Every oscillator still referenced by the graph
    pub fn oscillator_count(&self) -> usize {
        self.voices.len() + self.pads.iter().map(|(_, p)| p.oscillator_count()).sum::<usize>()
    }

    /// Tracked voices and pads
    pub fn node_count(&self) -> usize {
        self.voices.len() + self.pads.len()
    }

    /// `(start, stop)` of every live voice, in scheduling order
    pub fn voice_windows(&self) -> Vec<(f64, f64)> {
        self.voices
            .iter()
            .map(|(_, v)| (v.start_time(), v.stop_time()))
            .collect()
    }

    /// Drop every node immediately
    pub fn clear(&mut self) {
        self.voices.clear();
        self.pads.clear();
    }

    /// Render interleaved stereo into `output` and advance the clock
    pub fn process(&mut self, output: &mut [f32]) {
        let sample_rate = self.sample_rate as f64;

        for frame in output.chunks_mut(2) {
            let time = self.frame as f64 / sample_rate;
            let mut left = 0.0;
            let mut right = 0.0;

            for (_, voice) in self.voices.iter_mut() {
                let (l, r) = voice.render(time);
                left += l;
                right += r;
            }
            for (_, pad) in self.pads.iter_mut() {
                let s = pad.render(time);
                left += s;
                right += s;
            }

            let master = self.master.value_at(time);
            frame[0] = soft_clip(left * master);
            if let Some(r) = frame.get_mut(1) {
                *r = soft_clip(right * master);
            }
            self.frame += 1;
        }

        self.collect_finished();
    }

    /// Disconnect nodes past their stop time and forget settled automation
    fn collect_finished(&mut self) {
        let now = self.current_time();

        let before = self.node_count();
        self.voices.retain(|(_, v)| !v.is_finished(now));
        self.pads.retain(|(_, p)| !p.is_finished(now));
        let removed = before - self.node_count();
        if removed > 0 {
            debug!(removed, remaining = self.node_count(), "nodes disconnected");
        }

        self.master.prune_before(now);
        for (_, pad) in self.pads.iter_mut() {
            pad.prune(now);
        }
    }
}

/// Soft clip threshold
const SOFT_CLIP_THRESHOLD: f32 = 0.75;
/// Soft clip ceiling
const SOFT_CLIP_CEILING: f32 = 0.89;

/// Gentle soft clipper for the master bus
///
/// Transparent below the threshold, asymptotic approach to the ceiling above.
#[inline(always)]
fn soft_clip(x: f32) -> f32 {
    let abs_x = x.abs();
    if abs_x <= SOFT_CLIP_THRESHOLD {
        return x;
    }

    let knee_width = SOFT_CLIP_CEILING - SOFT_CLIP_THRESHOLD;
    let ratio = (abs_x - SOFT_CLIP_THRESHOLD) / knee_width;
    let compressed = SOFT_CLIP_THRESHOLD + knee_width * (1.0 - (-ratio * 3.0).exp());
    x.signum() * compressed.min(SOFT_CLIP_CEILING)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oscillator::Waveform;

    fn tone() -> ToneSpec {
        ToneSpec::new(Waveform::Sine, 440.0, 0.05, 0.2)
    }

    #[test]
    fn test_clock_advances_with_frames() {
        let mut graph = Graph::new(48000);
        let mut buf = vec![0.0; 960];
        graph.process(&mut buf);
        assert_eq!(graph.frames_rendered(), 480);
        assert!((graph.current_time() - 0.01).abs() < 1e-9);
    }

    #[test]
    fn test_voice_removed_after_stop() {
        let mut graph = Graph::new(48000);
        graph.add_voice(&tone(), 0.0).expect("capacity");
        assert_eq!(graph.voice_count(), 1);

        let stop = graph.voice_windows()[0].1;
        let frames = (stop * 48000.0).ceil() as usize + 1;
        let mut buf = vec![0.0; frames * 2];
        graph.process(&mut buf);
        assert_eq!(graph.voice_count(), 0);
        assert!(buf.iter().any(|s| s.abs() > 0.01));
    }

    #[test]
    fn test_voice_limit() {
        let mut graph = Graph::new(48000);
        for _ in 0..MAX_VOICES {
            graph.add_voice(&tone(), 0.0).expect("capacity");
        }
        assert_eq!(
            graph.add_voice(&tone(), 0.0),
            Err(AudioError::VoiceLimit(MAX_VOICES))
        );
        assert!(graph.ensure_capacity(1).is_err());
    }

    #[test]
    fn test_master_gain_scales_output() {
        let mut graph = Graph::new(48000);
        graph.master_mut().set_value_at_time(0.0, 0.0);
        graph.add_voice(&tone(), 0.0).expect("capacity");
        let mut buf = vec![0.0; 4800];
        graph.process(&mut buf);
        assert!(buf.iter().all(|s| *s == 0.0));
    }

    #[test]
    fn test_soft_clip() {
        assert_eq!(soft_clip(0.5), 0.5);
        assert!(soft_clip(5.0) <= SOFT_CLIP_CEILING);
        assert!(soft_clip(-5.0) >= -SOFT_CLIP_CEILING);
    }
}
