//! Procedural audio feedback for CHIME arithmetic games
//!
//! Turns discrete game events into short synthesized sounds without any
//! audio assets:
//! - Tone primitive: one oscillator + envelope + optional filter/pan voice
//! - Envelope scheduler: ADSR breakpoints against the audio clock
//! - Effect composer: click, correct, incorrect, hint, victory, gameover
//! - Ambient bed: long-running pad with an LFO-swept lowpass
//! - Engine: lazy context creation, enabled/muted gate, failure swallowing

mod ambient;
mod backend;
mod config;
mod context;
mod effects;
mod engine;
mod envelope;
mod error;
mod filter;
mod graph;
mod oscillator;
mod param;
mod voice;

pub use ambient::{AmbientBed, AmbientManager, AmbientSpec, PadVoice, AMBIENT_FADE_IN, AMBIENT_FADE_OUT};
pub use backend::CpalBackend;
pub use config::Config;
pub use context::{AudioContext, Backend, ContextState, OfflineBackend, OutputSink, UnavailableBackend, DEFAULT_SAMPLE_RATE};
pub use effects::{arpeggio, chord, resolve, Effect, ResolvedTone, ScheduledTone, MAX_EFFECT_LENGTH, MAX_TONE_GAIN};
pub use engine::{AudioEngine, GateState, MUTE_RAMP};
pub use envelope::{Breakpoint, Envelope, EnvelopeSchedule, STOP_MARGIN};
pub use error::AudioError;
pub use filter::{Biquad, FilterSpec, FilterType};
pub use graph::{Graph, NodeId, MAX_VOICES};
pub use oscillator::{Oscillator, Waveform};
pub use param::{AutomationEvent, Curve, Param, FLOOR};
pub use voice::{ToneSpec, MAX_DURATION, MAX_FREQUENCY, MIN_FREQUENCY};
