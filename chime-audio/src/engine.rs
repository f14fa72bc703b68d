//! Audio engine - lifecycle guard in front of the render graph
//!
//! The engine owns at most one audio context, created lazily on the first
//! user gesture. Every sound request passes the gate (enabled, not muted,
//! context available) and every fallible step goes through `attempt`, which
//! logs and swallows the error. Nothing here returns an error to the game.

use crate::ambient::{AmbientBed, AmbientManager};
use crate::config::Config;
use crate::context::{AudioContext, Backend, ContextState};
use crate::effects::{resolve, Effect};
use crate::error::AudioError;
use crate::graph::Graph;
use crate::param::FLOOR;
use crate::voice::ToneSpec;
use tracing::{debug, info, warn};

/// Master gain ramp time for mute/unmute and volume changes
pub const MUTE_RAMP: f64 = 0.05;

/// Frames per block when rendering offline
const BLOCK_FRAMES: usize = 512;

/// Whether sound may play
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GateState {
    /// User-facing sound toggle
    pub enabled: bool,
    /// Mute toggle
    pub muted: bool,
    /// Cleared for the rest of the session when the context cannot be created
    pub context_available: bool,
}

impl Default for GateState {
    fn default() -> Self {
        Self {
            enabled: true,
            muted: false,
            context_available: true,
        }
    }
}

impl GateState {
    pub fn is_open(&self) -> bool {
        self.enabled && !self.muted && self.context_available
    }
}

/// Procedural audio feedback engine for one game instance
pub struct AudioEngine {
    backend: Box<dyn Backend>,
    context: Option<AudioContext>,
    init_attempted: bool,
    gate: GateState,
    master_volume: f32,
    ambient: AmbientManager,
    scratch: Vec<f32>,
}

impl AudioEngine {
    pub fn new(backend: Box<dyn Backend>) -> Self {
        Self::with_config(backend, &Config::default())
    }

    pub fn with_config(backend: Box<dyn Backend>, config: &Config) -> Self {
        Self {
            backend,
            context: None,
            init_attempted: false,
            gate: GateState {
                enabled: config.enabled,
                muted: config.muted,
                context_available: true,
            },
            master_volume: config.master_volume.clamp(0.0, 1.0),
            ambient: AmbientManager::new(),
            scratch: vec![0.0; BLOCK_FRAMES * 2],
        }
    }

    pub fn gate(&self) -> GateState {
        self.gate
    }

    pub fn is_enabled(&self) -> bool {
        self.gate.enabled
    }

    pub fn is_muted(&self) -> bool {
        self.gate.muted
    }

    /// False once context creation has failed
    pub fn is_available(&self) -> bool {
        self.gate.context_available
    }

    pub fn has_context(&self) -> bool {
        self.context.is_some()
    }

    pub fn context_state(&self) -> Option<ContextState> {
        self.context.as_ref().map(|c| c.state())
    }

    pub fn master_volume(&self) -> f32 {
        self.master_volume
    }

    fn master_level(&self) -> f32 {
        if self.gate.muted {
            FLOOR
        } else {
            self.master_volume.max(FLOOR)
        }
    }

    /// Create the audio context. Only the first call does anything.
    pub fn init(&mut self) {
        if self.init_attempted {
            return;
        }
        self.init_attempted = true;

        let backend = self.backend.name();
        match attempt("init", self.backend.open()) {
            Some(ctx) => {
                let level = self.master_level();
                {
                    let mut graph = ctx.graph();
                    let now = graph.current_time();
                    graph.master_mut().set_value_at_time(level, now);
                }
                info!(backend, sample_rate = ctx.sample_rate(), "audio context created");
                self.context = Some(ctx);
            }
            None => {
                self.gate.context_available = false;
                info!(backend, "continuing without sound");
            }
        }
    }

    /// Resume a suspended context
    pub fn resume(&mut self) {
        let Some(ctx) = self.context.as_mut() else {
            return;
        };
        if ctx.state() == ContextState::Suspended && attempt("resume", ctx.resume()).is_some() {
            debug!("audio context resumed");
        }
    }

    /// Handle a user gesture: create and resume the context if sound is on
    pub fn unlock(&mut self) {
        if !self.gate.enabled {
            return;
        }
        self.init();
        self.resume();
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        if !enabled {
            self.stop_ambient();
        }
        self.gate.enabled = enabled;
        info!(enabled, "sound toggled");
    }

    /// Flip the mute flag and ramp the master gain; returns the new flag
    pub fn toggle_mute(&mut self) -> bool {
        self.gate.muted = !self.gate.muted;
        let target = self.master_level();
        self.ramp_master(target);
        debug!(muted = self.gate.muted, "mute toggled");
        self.gate.muted
    }

    /// Set the unmuted master level; while muted the ramp waits for unmute
    pub fn set_master_volume(&mut self, volume: f32) {
        self.master_volume = if volume.is_finite() {
            volume.clamp(0.0, 1.0)
        } else {
            self.master_volume
        };
        if !self.gate.muted {
            let target = self.master_level();
            self.ramp_master(target);
        }
    }

    fn ramp_master(&mut self, target: f32) {
        if let Some(ctx) = &self.context {
            let mut graph = ctx.graph();
            let now = graph.current_time();
            let master = graph.master_mut();
            master.cancel_and_hold_at_time(now);
            master.exponential_ramp_to_value_at_time(target, now + MUTE_RAMP);
        }
    }

    /// Play a named effect
    pub fn play(&mut self, effect: Effect) {
        if !self.prepare() {
            return;
        }
        let schedule = effect.schedule();
        guarded(self.context.as_ref(), effect.name(), |graph| {
            graph.ensure_capacity(schedule.len())?;
            let now = graph.current_time();
            for tone in resolve(now, &schedule) {
                graph.add_voice(&tone.tone, tone.start)?;
            }
            Ok(())
        });
    }

    /// Play a single custom tone now
    pub fn play_tone(&mut self, tone: &ToneSpec) {
        if !self.prepare() {
            return;
        }
        guarded(self.context.as_ref(), "tone", |graph| {
            let now = graph.current_time();
            graph.add_voice(tone, now).map(|_| ())
        });
    }

    pub fn play_click(&mut self) {
        self.play(Effect::Click);
    }

    pub fn play_correct(&mut self) {
        self.play(Effect::Correct);
    }

    pub fn play_incorrect(&mut self) {
        self.play(Effect::Incorrect);
    }

    pub fn play_hint(&mut self) {
        self.play(Effect::Hint);
    }

    pub fn play_victory(&mut self) {
        self.play(Effect::Victory);
    }

    pub fn play_gameover(&mut self) {
        self.play(Effect::GameOver);
    }

    /// Gate check plus lazy init; true if sound may be scheduled
    fn prepare(&mut self) -> bool {
        if !self.gate.is_open() {
            return false;
        }
        self.init();
        self.resume();
        self.gate.is_open() && self.context.is_some()
    }

    /// Start (or restart) the ambient bed
    pub fn start_ambient(&mut self, bed: AmbientBed) {
        if !self.prepare() {
            return;
        }
        let ambient = &mut self.ambient;
        guarded(self.context.as_ref(), "ambient", |graph| {
            ambient.start(graph, bed);
            Ok(())
        });
    }

    /// Fade out the ambient bed. Safe to call when nothing is running.
    pub fn stop_ambient(&mut self) {
        match self.context.as_ref() {
            Some(ctx) => self.ambient.stop(&mut ctx.graph()),
            None => self.ambient.clear(),
        }
    }

    pub fn is_ambient_running(&self) -> bool {
        self.ambient.is_running()
    }

    pub fn ambient_bed(&self) -> Option<AmbientBed> {
        self.ambient.active_bed()
    }

    /// Tracked voices and pads (zero without a context)
    pub fn node_count(&self) -> usize {
        self.context
            .as_ref()
            .map_or(0, |ctx| ctx.graph().node_count())
    }

    pub fn oscillator_count(&self) -> usize {
        self.context
            .as_ref()
            .map_or(0, |ctx| ctx.graph().oscillator_count())
    }

    pub fn current_time(&self) -> Option<f64> {
        self.context.as_ref().map(|ctx| ctx.current_time())
    }

    pub fn master_gain_at(&self, time: f64) -> Option<f32> {
        self.context
            .as_ref()
            .map(|ctx| ctx.graph().master_gain_at(time))
    }

    /// Short note for the screen when sound is not playing
    pub fn status_note(&self) -> Option<&'static str> {
        if !self.gate.context_available {
            Some("Audio unavailable")
        } else if self.init_attempted && self.context.is_none() {
            Some("Audio closed")
        } else if !self.gate.enabled {
            Some("Sound off")
        } else if self.gate.muted {
            Some("Muted")
        } else {
            None
        }
    }

    /// Render interleaved stereo from an offline context (silence otherwise)
    pub fn render(&mut self, output: &mut [f32]) {
        match &self.context {
            Some(ctx) => ctx.render(output),
            None => output.fill(0.0),
        }
    }

    /// Advance an offline context's clock by `seconds`
    pub fn advance(&mut self, seconds: f64) {
        let Some(ctx) = &self.context else {
            return;
        };
        let frames = (seconds.max(0.0) * ctx.sample_rate() as f64).ceil() as usize;
        let mut remaining = frames;
        while remaining > 0 {
            let n = remaining.min(BLOCK_FRAMES);
            ctx.render(&mut self.scratch[..n * 2]);
            remaining -= n;
        }
    }

    /// Log errors reported by the output stream
    pub fn poll(&mut self) {
        let Some(ctx) = &self.context else {
            return;
        };
        for err in ctx.drain_errors() {
            warn!(error = %err, "audio stream reported an error");
        }
    }

    /// Tear down the context. Later play calls are no-ops.
    pub fn shutdown(&mut self) {
        self.stop_ambient();
        if let Some(mut ctx) = self.context.take() {
            ctx.close();
            info!("audio context closed");
        }
    }
}

impl Drop for AudioEngine {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Log and swallow a failed audio operation
fn attempt<T>(op: &str, result: Result<T, AudioError>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(err) => {
            warn!(op, error = %err, "audio operation failed");
            None
        }
    }
}

/// Run `f` against the graph if a context exists, swallowing its error
fn guarded<F>(context: Option<&AudioContext>, op: &str, f: F)
where
    F: FnOnce(&mut Graph) -> Result<(), AudioError>,
{
    let Some(ctx) = context else {
        return;
    };
    let mut graph = ctx.graph();
    attempt(op, f(&mut graph));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ambient::AMBIENT_FADE_OUT;
    use crate::context::{OfflineBackend, OutputSink, UnavailableBackend};
    use crate::graph::MAX_VOICES;
    use crate::oscillator::Waveform;
    use crossbeam_channel::bounded;
    use parking_lot::Mutex;
    use std::sync::Arc;

    /// Sink whose stream refuses to start
    struct StuckSink;

    impl OutputSink for StuckSink {
        fn play(&self) -> Result<(), AudioError> {
            Err(AudioError::PlayStream("device busy".to_string()))
        }

        fn pause(&self) -> Result<(), AudioError> {
            Ok(())
        }
    }

    struct StuckBackend;

    impl Backend for StuckBackend {
        fn name(&self) -> &'static str {
            "stuck"
        }

        fn open(&self) -> Result<AudioContext, AudioError> {
            let (_tx, rx) = bounded(1);
            let graph = Arc::new(Mutex::new(Graph::new(48000)));
            Ok(AudioContext::with_sink(graph, Box::new(StuckSink), rx))
        }
    }

    fn offline() -> (AudioEngine, OfflineBackend) {
        let backend = OfflineBackend::new(48000);
        let probe = backend.clone();
        (AudioEngine::new(Box::new(backend)), probe)
    }

    fn play_everything(engine: &mut AudioEngine) {
        engine.play_click();
        engine.play_correct();
        engine.play_incorrect();
        engine.play_hint();
        engine.play_victory();
        engine.play_gameover();
        engine.start_ambient(AmbientBed::Calm);
    }

    #[test]
    fn test_init_is_idempotent() {
        let (mut engine, probe) = offline();
        for _ in 0..10 {
            engine.init();
        }
        assert_eq!(probe.opened(), 1);
        assert!(engine.has_context());
        // One master gain at the configured volume, not compounded
        assert_eq!(engine.master_gain_at(0.0), Some(0.8));
    }

    #[test]
    fn test_first_play_resumes_context() {
        let (mut engine, _) = offline();
        assert_eq!(engine.context_state(), None);
        engine.play_click();
        assert_eq!(engine.context_state(), Some(ContextState::Running));
        assert_eq!(engine.node_count(), 1);
    }

    #[test]
    fn test_unavailable_audio_is_silent_noop() {
        let mut engine = AudioEngine::new(Box::new(UnavailableBackend));
        for _ in 0..100 {
            engine.play_correct();
        }
        assert!(!engine.is_available());
        assert!(!engine.has_context());
        assert_eq!(engine.node_count(), 0);
        assert_eq!(engine.status_note(), Some("Audio unavailable"));

        // Stays unavailable; mute still toggles without a context
        engine.init();
        assert!(!engine.is_available());
        assert!(engine.toggle_mute());
    }

    #[test]
    fn test_disabled_engine_is_pure_noop() {
        let (mut engine, probe) = offline();
        engine.set_enabled(false);
        let before = engine.gate();

        for _ in 0..5 {
            play_everything(&mut engine);
            engine.play_tone(&ToneSpec::new(Waveform::Sine, 440.0, 0.1, 0.1));
            engine.unlock();
        }

        assert_eq!(engine.gate(), before);
        assert_eq!(probe.opened(), 0);
        assert_eq!(engine.node_count(), 0);
        assert!(!engine.is_ambient_running());
    }

    #[test]
    fn test_muted_play_is_noop() {
        let (mut engine, _) = offline();
        engine.unlock();
        engine.toggle_mute();
        play_everything(&mut engine);
        assert_eq!(engine.node_count(), 0);
        assert_eq!(engine.status_note(), Some("Muted"));
    }

    #[test]
    fn test_mute_ramps_master_to_floor_and_back() {
        let (mut engine, _) = offline();
        engine.start_ambient(AmbientBed::Sky);
        engine.advance(1.2);

        // Odd number of toggles: silent after one ramp window
        for toggles in 1..=5 {
            let muted = engine.toggle_mute();
            let now = engine.current_time().unwrap_or_default();
            let gain = engine.master_gain_at(now + MUTE_RAMP).unwrap_or(1.0);
            if toggles % 2 == 1 {
                assert!(muted);
                assert!(gain <= FLOOR * 1.01, "gain {} after {} toggles", gain, toggles);
            } else {
                assert!(!muted);
                assert!((gain - engine.master_volume()).abs() < 1e-6);
            }
            engine.advance(MUTE_RAMP + 0.01);
        }

        // Muted now: nothing audible reaches the output
        let mut buf = vec![0.0; 2048];
        engine.render(&mut buf);
        assert!(buf.iter().all(|s| s.abs() < 0.001));
        // Nodes were ramped, not removed
        assert!(engine.is_ambient_running());
        assert!(engine.node_count() > 0);
    }

    #[test]
    fn test_ambient_start_stop_leaves_no_nodes() {
        let (mut engine, _) = offline();
        for _ in 0..8 {
            engine.start_ambient(AmbientBed::Calm);
            engine.advance(0.1);
            engine.stop_ambient();
        }
        // Stopping again is harmless
        engine.stop_ambient();
        engine.advance(AMBIENT_FADE_OUT + 0.05);
        assert!(!engine.is_ambient_running());
        assert_eq!(engine.oscillator_count(), 0);
        assert_eq!(engine.node_count(), 0);
    }

    #[test]
    fn test_effect_voices_clean_up() {
        let (mut engine, _) = offline();
        engine.play_correct();
        assert_eq!(engine.node_count(), Effect::Correct.schedule().len());
        engine.advance(Effect::Correct.length() + 0.1);
        assert_eq!(engine.node_count(), 0);
    }

    #[test]
    fn test_voice_limit_is_swallowed() {
        let (mut engine, _) = offline();
        for _ in 0..20 {
            engine.play_victory();
        }
        assert!(engine.node_count() <= MAX_VOICES);
        // Still usable afterwards
        engine.advance(Effect::Victory.length() + 0.1);
        engine.play_click();
        assert_eq!(engine.node_count(), 1);
    }

    #[test]
    fn test_any_tone_in_range_renders_finite() {
        let (mut engine, _) = offline();
        for frequency in [20.0, 440.0, 20000.0, -5.0, f32::NAN] {
            for duration in [0.0, 1.0, 2.0, 10.0] {
                for gain in [0.0, 0.5, 1.0, 5.0] {
                    for waveform in [Waveform::Sine, Waveform::Square, Waveform::Noise] {
                        engine.play_tone(&ToneSpec::new(waveform, frequency, duration, gain));
                    }
                    let mut buf = vec![0.0; 256];
                    engine.render(&mut buf);
                    assert!(buf.iter().all(|s| s.is_finite()));
                }
            }
        }
    }

    #[test]
    fn test_shutdown_then_play() {
        let (mut engine, probe) = offline();
        engine.play_hint();
        engine.start_ambient(AmbientBed::Machine);
        engine.shutdown();
        assert!(!engine.has_context());
        assert!(!engine.is_ambient_running());

        engine.play_correct();
        assert_eq!(engine.node_count(), 0);
        assert_eq!(probe.opened(), 1);
        assert_eq!(engine.status_note(), Some("Audio closed"));
    }

    #[test]
    fn test_resume_failure_is_swallowed() {
        let mut engine = AudioEngine::new(Box::new(StuckBackend));
        for _ in 0..30 {
            engine.play_correct();
        }
        assert!(engine.has_context());
        assert!(engine.is_available());
        assert_eq!(engine.context_state(), Some(ContextState::Suspended));
        // The stream never pulls frames, so voices pile up to the cap and stop there
        assert!(engine.node_count() > 0);
        assert!(engine.node_count() <= MAX_VOICES);
    }

    #[test]
    fn test_master_volume_ramps_and_clamps() {
        let (mut engine, _) = offline();
        engine.unlock();

        engine.set_master_volume(0.5);
        let now = engine.current_time().unwrap_or_default();
        let gain = engine.master_gain_at(now + MUTE_RAMP).unwrap_or_default();
        assert!((gain - 0.5).abs() < 1e-6);

        engine.set_master_volume(f32::NAN);
        assert_eq!(engine.master_volume(), 0.5);
        engine.set_master_volume(3.0);
        assert_eq!(engine.master_volume(), 1.0);
        engine.advance(MUTE_RAMP + 0.01);

        // While muted the master stays at the floor until unmute
        engine.toggle_mute();
        engine.advance(MUTE_RAMP + 0.01);
        engine.set_master_volume(0.2);
        let now = engine.current_time().unwrap_or_default();
        assert!(engine.master_gain_at(now + MUTE_RAMP).unwrap_or(1.0) <= FLOOR * 1.01);

        engine.toggle_mute();
        let now = engine.current_time().unwrap_or_default();
        let gain = engine.master_gain_at(now + MUTE_RAMP).unwrap_or_default();
        assert!((gain - 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_set_enabled_false_stops_ambient() {
        let (mut engine, _) = offline();
        engine.start_ambient(AmbientBed::Calm);
        assert!(engine.is_ambient_running());
        engine.set_enabled(false);
        assert!(!engine.is_ambient_running());
        assert_eq!(engine.status_note(), Some("Sound off"));
    }

    #[test]
    fn test_config_applied() {
        let config = Config {
            muted: true,
            master_volume: 0.3,
            ..Config::default()
        };
        let mut engine = AudioEngine::with_config(Box::new(OfflineBackend::default()), &config);
        engine.unlock();
        assert!(engine.is_muted());
        assert_eq!(engine.master_gain_at(0.0), Some(FLOOR));
        engine.toggle_mute();
        let now = engine.current_time().unwrap_or_default();
        let gain = engine.master_gain_at(now + MUTE_RAMP).unwrap_or_default();
        assert!((gain - 0.3).abs() < 1e-6);
    }
}
