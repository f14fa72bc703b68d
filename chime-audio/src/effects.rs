//! Effect composer - named game sounds built from tone schedules
//!
//! An effect is a list of `(offset, tone)` pairs relative to "now". Resolving
//! against the audio clock happens in one place (`resolve`) so staggered notes
//! keep their relative order no matter when the effect is triggered.

use crate::envelope::Envelope;
use crate::filter::FilterSpec;
use crate::oscillator::Waveform;
use crate::voice::ToneSpec;

/// Longest allowed effect, first onset to last release
pub const MAX_EFFECT_LENGTH: f64 = 1.5;
/// Loudest allowed tone (master-relative)
pub const MAX_TONE_GAIN: f32 = 0.2;

// Note frequencies (Hz)
const C4: f32 = 261.63;
const E4: f32 = 329.63;
const G4: f32 = 392.00;
const BB3: f32 = 233.08;
const EB4: f32 = 311.13;
const C5: f32 = 523.25;
const E5: f32 = 659.25;
const G5: f32 = 783.99;
const C6: f32 = 1046.50;

/// Game events that have a sound
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Effect {
    /// Discrete interaction: select, move, toggle
    Click,
    /// Right answer
    Correct,
    /// Wrong answer
    Incorrect,
    /// Hint requested
    Hint,
    /// Session won
    Victory,
    /// Session lost
    GameOver,
}

/// A tone and its onset relative to the trigger time
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScheduledTone {
    pub offset: f64,
    pub tone: ToneSpec,
}

/// A tone placed on the audio clock
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedTone {
    pub start: f64,
    pub stop: f64,
    pub tone: ToneSpec,
}

impl Effect {
    pub const ALL: [Effect; 6] = [
        Effect::Click,
        Effect::Correct,
        Effect::Incorrect,
        Effect::Hint,
        Effect::Victory,
        Effect::GameOver,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Effect::Click => "click",
            Effect::Correct => "correct",
            Effect::Incorrect => "incorrect",
            Effect::Hint => "hint",
            Effect::Victory => "victory",
            Effect::GameOver => "gameover",
        }
    }

    /// Tones that make up this effect
    pub fn schedule(&self) -> Vec<ScheduledTone> {
        match self {
            Effect::Click => vec![ScheduledTone {
                offset: 0.0,
                tone: ToneSpec::new(Waveform::Sine, 880.0, 0.02, 0.08)
                    .with_envelope(Envelope::pluck(0.04)),
            }],

            Effect::Correct => {
                let note = ToneSpec::new(Waveform::Triangle, C5, 0.12, 0.14)
                    .with_envelope(Envelope::new(0.012, 0.05, 0.7, 0.25));
                let mut tones = arpeggio(&[C5, E5, G5], 0.08, note);
                tones.push(ScheduledTone {
                    offset: 0.16,
                    tone: sparkle(0.04),
                });
                tones
            }

            Effect::Incorrect => {
                let env = Envelope::new(0.01, 0.03, 0.8, 0.1);
                vec![
                    ScheduledTone {
                        offset: 0.0,
                        tone: ToneSpec::new(Waveform::Triangle, EB4, 0.1, 0.12).with_envelope(env),
                    },
                    ScheduledTone {
                        offset: 0.12,
                        tone: ToneSpec::new(Waveform::Sawtooth, BB3, 0.1, 0.1)
                            .with_envelope(env)
                            .with_filter(FilterSpec::lowpass(900.0)),
                    },
                ]
            }

            Effect::Hint => vec![ScheduledTone {
                offset: 0.0,
                tone: ToneSpec::new(Waveform::Sine, E5, 0.15, 0.1)
                    .with_envelope(Envelope::soft(0.03, 0.2)),
            }],

            Effect::Victory => {
                let note = ToneSpec::new(Waveform::Triangle, C5, 0.1, 0.12)
                    .with_envelope(Envelope::new(0.01, 0.04, 0.75, 0.2));
                let mut tones = arpeggio(&[C5, E5, G5, C6], 0.1, note);

                let pad = ToneSpec::new(Waveform::Sine, C5, 0.4, 0.08)
                    .with_envelope(Envelope::soft(0.02, 0.5));
                // Final chord spread across the stereo field
                for (mut t, pan) in chord(&[C5, E5, G5], 0.45, pad).into_iter().zip([-0.3, 0.0, 0.3]) {
                    t.tone.pan = Some(pan);
                    tones.push(t);
                }
                tones.push(ScheduledTone {
                    offset: 0.45,
                    tone: sparkle(0.05),
                });
                tones
            }

            Effect::GameOver => {
                let note = ToneSpec::new(Waveform::Triangle, G4, 0.16, 0.12)
                    .with_envelope(Envelope::new(0.01, 0.05, 0.7, 0.3))
                    .with_filter(FilterSpec::lowpass(1800.0));
                arpeggio(&[G4, E4, C4], 0.18, note)
            }
        }
    }

    /// Time from trigger to the end of the last release
    pub fn length(&self) -> f64 {
        self.schedule()
            .iter()
            .map(|t| t.offset + t.tone.length())
            .fold(0.0, f64::max)
    }
}

/// Brief highpassed noise burst layered over positive effects
fn sparkle(gain: f32) -> ToneSpec {
    ToneSpec::new(Waveform::Noise, 1000.0, 0.04, gain)
        .with_envelope(Envelope::pluck(0.12))
        .with_filter(FilterSpec::highpass(6000.0))
}

/// Notes played one after another, `stagger` seconds apart
pub fn arpeggio(frequencies: &[f32], stagger: f64, template: ToneSpec) -> Vec<ScheduledTone> {
    frequencies
        .iter()
        .enumerate()
        .map(|(i, &f)| ScheduledTone {
            offset: i as f64 * stagger,
            tone: template.at(f),
        })
        .collect()
}

/// Notes sharing one onset
pub fn chord(frequencies: &[f32], offset: f64, template: ToneSpec) -> Vec<ScheduledTone> {
    frequencies
        .iter()
        .map(|&f| ScheduledTone {
            offset,
            tone: template.at(f),
        })
        .collect()
}

/// Place a schedule on the audio clock relative to `now`
pub fn resolve(now: f64, schedule: &[ScheduledTone]) -> Vec<ResolvedTone> {
    schedule
        .iter()
        .map(|s| {
            let start = now + s.offset.max(0.0);
            ResolvedTone {
                start,
                stop: s.tone.schedule(start).stop_time,
                tone: s.tone,
            }
        })
        .collect()
}
