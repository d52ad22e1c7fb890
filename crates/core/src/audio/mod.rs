use std::{collections::VecDeque, f32::consts::PI};

use serde::{Deserialize, Serialize};

use crate::{AudioConfig, CueEvent};

/// Receiver of the cue events produced on every tick.
pub trait CueSink {
    fn handle(&mut self, cue: CueEvent);
}

impl CueSink for Vec<CueEvent> {
    fn handle(&mut self, cue: CueEvent) {
        self.push(cue);
    }
}

/// Sink that ignores every cue.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl CueSink for NullSink {
    fn handle(&mut self, _cue: CueEvent) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Waveform {
    Sine,
    Square,
    Triangle,
}

/// One oscillator with exponential frequency and gain ramps.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Voice {
    pub waveform: Waveform,
    pub start_hz: f32,
    pub end_hz: f32,
    pub start_gain: f32,
    pub end_gain: f32,
    pub offset_secs: f32,
    pub duration_secs: f32,
}

/// The three sounds the timer makes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Tone {
    /// Short falling chirp for reps and phase changes.
    Beep,
    /// Dry tick for countdowns.
    Countdown,
    /// Rising three note arpeggio for set changes, start and finish.
    Success,
}

impl Tone {
    pub fn for_cue(cue: CueEvent) -> Self {
        match cue {
            CueEvent::RepAdvanced | CueEvent::PhaseEntered(_) => Tone::Beep,
            CueEvent::RestCountdownTick(_) => Tone::Countdown,
            CueEvent::SetAdvanced | CueEvent::Finished => Tone::Success,
        }
    }

    pub fn voices(self) -> Vec<Voice> {
        match self {
            Tone::Beep => vec![Voice {
                waveform: Waveform::Sine,
                start_hz: 880.0,
                end_hz: 440.0,
                start_gain: 0.1,
                end_gain: 0.01,
                offset_secs: 0.0,
                duration_secs: 0.1,
            }],
            Tone::Countdown => vec![Voice {
                waveform: Waveform::Square,
                start_hz: 440.0,
                end_hz: 440.0,
                start_gain: 0.05,
                end_gain: 0.01,
                offset_secs: 0.0,
                duration_secs: 0.05,
            }],
            Tone::Success => [554.37, 659.25, 880.0]
                .into_iter()
                .enumerate()
                .map(|(index, hz)| Voice {
                    waveform: Waveform::Triangle,
                    start_hz: hz,
                    end_hz: hz,
                    start_gain: 0.1,
                    end_gain: 0.001,
                    offset_secs: index as f32 * 0.1,
                    duration_secs: 1.0,
                })
                .collect(),
        }
    }

    pub fn duration_secs(self) -> f32 {
        self.voices()
            .iter()
            .map(|voice| voice.offset_secs + voice.duration_secs)
            .fold(0.0, f32::max)
    }
}

/// Mixes the voices of `tone` into a mono buffer.
pub fn render_tone(tone: Tone, sample_rate: u32, volume: f32) -> Vec<f32> {
    let rate = sample_rate.max(1) as f32;
    let len = (tone.duration_secs() * rate).round() as usize;
    let mut buffer = vec![0.0; len];

    for voice in tone.voices() {
        let start = (voice.offset_secs * rate).round() as usize;
        let count = (voice.duration_secs * rate).round() as usize;
        let mut phase = 0.0_f32;

        for (i, slot) in buffer.iter_mut().skip(start).take(count).enumerate() {
            let progress = i as f32 / count as f32;
            let hz = exp_ramp(voice.start_hz, voice.end_hz, progress);
            let gain = exp_ramp(voice.start_gain, voice.end_gain, progress);
            *slot += oscillator(voice.waveform, phase) * gain * volume;
            phase = (phase + hz / rate).fract();
        }
    }

    buffer
}

fn exp_ramp(from: f32, to: f32, progress: f32) -> f32 {
    if from <= 0.0 || to <= 0.0 {
        return from + (to - from) * progress;
    }
    from * (to / from).powf(progress)
}

fn oscillator(waveform: Waveform, phase: f32) -> f32 {
    match waveform {
        Waveform::Sine => (2.0 * PI * phase).sin(),
        Waveform::Square => {
            if phase < 0.5 {
                1.0
            } else {
                -1.0
            }
        }
        Waveform::Triangle => 1.0 - 4.0 * (phase - 0.5).abs(),
    }
}

/// Whether the host has allowed audio output yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnlockState {
    Locked,
    Unlocked,
}

#[derive(Debug, Clone)]
pub struct RenderedTone {
    pub tone: Tone,
    pub samples: Vec<f32>,
}

/// Explicitly owned audio resource. Starts locked; tones requested before
/// [`AudioEngine::unlock`] are dropped rather than deferred.
#[derive(Debug)]
pub struct AudioEngine {
    sample_rate: u32,
    volume: f32,
    enabled: bool,
    state: UnlockState,
    pending: VecDeque<RenderedTone>,
}

impl AudioEngine {
    pub fn new(config: &AudioConfig) -> Self {
        Self {
            sample_rate: config.sample_rate,
            volume: config.volume.clamp(0.0, 1.0),
            enabled: config.enabled,
            state: UnlockState::Locked,
            pending: VecDeque::new(),
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn state(&self) -> UnlockState {
        self.state
    }

    pub fn is_unlocked(&self) -> bool {
        self.state == UnlockState::Unlocked
    }

    /// Called in response to a user gesture.
    pub fn unlock(&mut self) {
        if self.state == UnlockState::Locked {
            self.state = UnlockState::Unlocked;
            tracing::debug!(sample_rate = self.sample_rate, "audio unlocked");
        }
    }

    /// Renders and queues `tone`. Returns false when the tone was dropped.
    pub fn play(&mut self, tone: Tone) -> bool {
        if !self.enabled || !self.is_unlocked() {
            tracing::trace!(?tone, "audio locked, dropping tone");
            return false;
        }
        let samples = render_tone(tone, self.sample_rate, self.volume);
        self.pending.push_back(RenderedTone { tone, samples });
        true
    }

    /// Hands queued tones to the output backend.
    pub fn drain(&mut self) -> Vec<RenderedTone> {
        self.pending.drain(..).collect()
    }
}

impl CueSink for AudioEngine {
    fn handle(&mut self, cue: CueEvent) {
        self.play(Tone::for_cue(cue));
    }
}
