//! cpal output backend
//!
//! The stream is built when the context opens but stays paused until the
//! context is resumed, so no sound reaches the device before the first
//! user gesture.

use crate::context::{AudioContext, Backend, OutputSink};
use crate::error::AudioError;
use crate::graph::Graph;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, SizedSample};
use crossbeam_channel::{bounded, Sender};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::info;

/// Initial size of the stereo render buffer used inside the callback
/// (8192 stereo frames)
const RENDER_BUFFER_SIZE: usize = 16384;

/// Default output device through cpal
#[derive(Debug, Clone, Copy, Default)]
pub struct CpalBackend;

struct CpalSink {
    stream: cpal::Stream,
}

impl OutputSink for CpalSink {
    fn play(&self) -> Result<(), AudioError> {
        self.stream
            .play()
            .map_err(|e| AudioError::PlayStream(e.to_string()))
    }

    fn pause(&self) -> Result<(), AudioError> {
        self.stream
            .pause()
            .map_err(|e| AudioError::PlayStream(e.to_string()))
    }
}

impl Backend for CpalBackend {
    fn name(&self) -> &'static str {
        "cpal"
    }

    fn open(&self) -> Result<AudioContext, AudioError> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or(AudioError::NoOutputDevice)?;

        let supported = device
            .default_output_config()
            .map_err(|e| AudioError::DefaultConfig(e.to_string()))?;

        let sample_rate = supported.sample_rate().0;
        let channels = supported.channels() as usize;
        let config: cpal::StreamConfig = supported.config();

        let graph = Arc::new(Mutex::new(Graph::new(sample_rate)));
        let (error_tx, error_rx) = bounded(16);

        let stream = match supported.sample_format() {
            cpal::SampleFormat::F32 => {
                build_stream::<f32>(&device, &config, channels, graph.clone(), error_tx)?
            }
            cpal::SampleFormat::I16 => {
                build_stream::<i16>(&device, &config, channels, graph.clone(), error_tx)?
            }
            cpal::SampleFormat::U16 => {
                build_stream::<u16>(&device, &config, channels, graph.clone(), error_tx)?
            }
            other => {
                return Err(AudioError::BuildStream(format!(
                    "unsupported sample format {:?}",
                    other
                )))
            }
        };

        // Some hosts start streams immediately; hold it until resume
        stream
            .pause()
            .map_err(|e| AudioError::PlayStream(e.to_string()))?;

        info!(
            device = %device.name().unwrap_or_default(),
            sample_rate,
            channels,
            "audio output opened"
        );

        Ok(AudioContext::with_sink(
            graph,
            Box::new(CpalSink { stream }),
            error_rx,
        ))
    }
}

fn build_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    channels: usize,
    graph: Arc<Mutex<Graph>>,
    error_tx: Sender<AudioError>,
) -> Result<cpal::Stream, AudioError>
where
    T: SizedSample + FromSample<f32>,
{
    let channels = channels.max(1);
    // Pre-allocated so the callback normally never allocates
    let mut stereo = vec![0.0f32; RENDER_BUFFER_SIZE];

    device
        .build_output_stream(
            config,
            move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                let frames = data.len() / channels;
                if stereo.len() < frames * 2 {
                    stereo.resize(frames * 2, 0.0);
                }
                let buffer = &mut stereo[..frames * 2];

                // Never block the real-time thread; on contention output silence
                match graph.try_lock() {
                    Some(mut graph) => graph.process(buffer),
                    None => buffer.fill(0.0),
                }

                for (frame, lr) in data.chunks_mut(channels).zip(buffer.chunks(2)) {
                    if channels == 1 {
                        frame[0] = T::from_sample((lr[0] + lr[1]) * 0.5);
                        continue;
                    }
                    for (ch, sample) in frame.iter_mut().enumerate() {
                        *sample = match ch {
                            0 => T::from_sample(lr[0]),
                            1 => T::from_sample(lr[1]),
                            _ => T::from_sample(0.0f32),
                        };
                    }
                }
            },
            move |err| {
                let _ = error_tx.try_send(AudioError::Stream(err.to_string()));
            },
            None,
        )
        .map_err(|e| AudioError::BuildStream(e.to_string()))
}
