//! Audio context and the backends that open one

use crate::error::AudioError;
use crate::graph::Graph;
use crossbeam_channel::Receiver;
use parking_lot::{Mutex, MutexGuard};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Default sample rate for offline contexts
pub const DEFAULT_SAMPLE_RATE: u32 = 48000;

/// Lifecycle state of a context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextState {
    /// Created but not producing sound (before the first gesture)
    Suspended,
    Running,
    Closed,
}

/// Device-side half of a context (an output stream)
pub trait OutputSink {
    fn play(&self) -> Result<(), AudioError>;
    fn pause(&self) -> Result<(), AudioError>;
}

/// Shared render graph plus the output driving it
pub struct AudioContext {
    graph: Arc<Mutex<Graph>>,
    state: ContextState,
    sink: Option<Box<dyn OutputSink>>,
    errors: Option<Receiver<AudioError>>,
}

impl AudioContext {
    /// Context with no device; the owner advances the clock through `render`
    pub fn offline(sample_rate: u32) -> Self {
        Self {
            graph: Arc::new(Mutex::new(Graph::new(sample_rate))),
            state: ContextState::Suspended,
            sink: None,
            errors: None,
        }
    }

    /// Context rendered by a device stream, which must already hold `graph`
    pub fn with_sink(
        graph: Arc<Mutex<Graph>>,
        sink: Box<dyn OutputSink>,
        errors: Receiver<AudioError>,
    ) -> Self {
        Self {
            graph,
            state: ContextState::Suspended,
            sink: Some(sink),
            errors: Some(errors),
        }
    }

    pub fn state(&self) -> ContextState {
        self.state
    }

    pub fn is_offline(&self) -> bool {
        self.sink.is_none()
    }

    pub fn graph(&self) -> MutexGuard<'_, Graph> {
        self.graph.lock()
    }

    pub fn sample_rate(&self) -> u32 {
        self.graph.lock().sample_rate()
    }

    pub fn current_time(&self) -> f64 {
        self.graph.lock().current_time()
    }

    pub fn resume(&mut self) -> Result<(), AudioError> {
        match self.state {
            ContextState::Running => Ok(()),
            ContextState::Closed => Err(AudioError::Closed),
            ContextState::Suspended => {
                if let Some(sink) = &self.sink {
                    sink.play()?;
                }
                self.state = ContextState::Running;
                Ok(())
            }
        }
    }

    /// Stop output and drop every node; the context cannot be resumed afterwards
    pub fn close(&mut self) {
        if self.state == ContextState::Closed {
            return;
        }
        if let Some(sink) = self.sink.take() {
            // Dropping the sink tears the stream down even if pausing fails
            let _ = sink.pause();
        }
        self.graph.lock().clear();
        self.state = ContextState::Closed;
    }

    /// Render into `output` when offline and running; silence otherwise
    pub fn render(&self, output: &mut [f32]) {
        if self.is_offline() && self.state == ContextState::Running {
            self.graph.lock().process(output);
        } else {
            output.fill(0.0);
        }
    }

    /// Errors reported by the output stream since the last call
    pub fn drain_errors(&self) -> Vec<AudioError> {
        self.errors
            .as_ref()
            .map(|rx| rx.try_iter().collect())
            .unwrap_or_default()
    }
}

/// Something that can open an audio context
pub trait Backend {
    fn name(&self) -> &'static str;
    fn open(&self) -> Result<AudioContext, AudioError>;
}

/// Backend without a device, driven manually
#[derive(Debug, Clone)]
pub struct OfflineBackend {
    sample_rate: u32,
    opened: Arc<AtomicUsize>,
}

impl OfflineBackend {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            opened: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// How many contexts this backend (or any clone of it) has opened
    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }
}

impl Default for OfflineBackend {
    fn default() -> Self {
        Self::new(DEFAULT_SAMPLE_RATE)
    }
}

impl Backend for OfflineBackend {
    fn name(&self) -> &'static str {
        "offline"
    }

    fn open(&self) -> Result<AudioContext, AudioError> {
        self.opened.fetch_add(1, Ordering::SeqCst);
        Ok(AudioContext::offline(self.sample_rate))
    }
}

/// Backend for platforms with no audio at all
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableBackend;

impl Backend for UnavailableBackend {
    fn name(&self) -> &'static str {
        "unavailable"
    }

    fn open(&self) -> Result<AudioContext, AudioError> {
        Err(AudioError::Unavailable)
    }
}
