//! Cue emitter backed by the default cpal output device
//!
//! The stream lives on its own thread because cpal streams are not `Send`
//! on every platform. The timer side only holds a control channel and the
//! shared list of tones still sounding.

use std::f32::consts::PI;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use tracing::{debug, error, warn};

use crate::timer::CueEmitter;

const START_GAIN: f32 = 0.3;
const END_GAIN: f32 = 0.01;

/// One tone being rendered
#[derive(Debug, Clone, Copy)]
struct Voice {
    frequency_hz: f32,
    duration_secs: f32,
    position: u64,
}

impl Voice {
    /// Next sample, or None once the tone has finished
    fn next_sample(&mut self, sample_rate: f32) -> Option<f32> {
        let t = self.position as f32 / sample_rate;
        if t >= self.duration_secs {
            return None;
        }
        self.position += 1;

        // Exponential fade from START_GAIN down to END_GAIN over the tone
        let gain = START_GAIN * (END_GAIN / START_GAIN).powf(t / self.duration_secs);
        Some((2.0 * PI * self.frequency_hz * t).sin() * gain)
    }
}

enum Control {
    Resume,
    Close,
}

struct ToneDevice {
    voices: Arc<Mutex<Vec<Voice>>>,
    control: Sender<Control>,
    thread: Option<JoinHandle<()>>,
}

impl ToneDevice {
    fn open() -> Option<Self> {
        let voices = Arc::new(Mutex::new(Vec::new()));
        let (control, control_rx) = mpsc::channel();

        let thread_voices = Arc::clone(&voices);
        let thread = std::thread::Builder::new()
            .name("cue-audio".to_string())
            .spawn(move || {
                if let Err(e) = run_output(thread_voices, control_rx) {
                    warn!("Cue audio unavailable: {}", e);
                }
            });

        match thread {
            Ok(thread) => Some(Self {
                voices,
                control,
                thread: Some(thread),
            }),
            Err(e) => {
                warn!("Failed to spawn cue audio thread: {}", e);
                None
            }
        }
    }

    fn is_alive(&self) -> bool {
        self.thread.as_ref().is_some_and(|thread| !thread.is_finished())
    }

    fn close(mut self) {
        let _ = self.control.send(Control::Close);
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                warn!("Cue audio thread panicked");
            }
        }
    }
}

/// Own the output stream until told to close or the handle goes away
fn run_output(
    voices: Arc<Mutex<Vec<Voice>>>,
    control: Receiver<Control>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .ok_or("No output device found")?;
    let config = device.default_output_config()?;
    let sample_rate = config.sample_rate() as f32;
    let channels = config.channels() as usize;

    let stream = device.build_output_stream(
        &config.into(),
        move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
            let Ok(mut voices) = voices.lock() else {
                data.fill(0.0);
                return;
            };
            for frame in data.chunks_mut(channels) {
                let mut value = 0.0;
                voices.retain_mut(|voice| match voice.next_sample(sample_rate) {
                    Some(sample) => {
                        value += sample;
                        true
                    }
                    None => false,
                });
                let value = value.clamp(-1.0, 1.0);
                for sample in frame.iter_mut() {
                    *sample = value;
                }
            }
        },
        |err| error!("Cue audio output error: {}", err),
        None,
    )?;

    stream.play()?;
    debug!("Cue audio stream opened at {}Hz", sample_rate);

    while let Ok(message) = control.recv() {
        match message {
            Control::Resume => {
                if let Err(e) = stream.play() {
                    warn!("Failed to resume cue audio: {}", e);
                }
            }
            Control::Close => break,
        }
    }

    drop(stream);
    debug!("Cue audio stream closed");
    Ok(())
}

/// Plays cues through the default output device.
///
/// The device is opened on the first `prime` (or `beep`) and kept until
/// `release`. A device that failed to open is retried on the next `prime`.
#[derive(Default)]
pub struct SpeakerCues {
    device: Option<ToneDevice>,
}

impl SpeakerCues {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CueEmitter for SpeakerCues {
    fn prime(&mut self) {
        if let Some(device) = self.device.as_ref().filter(|device| device.is_alive()) {
            let _ = device.control.send(Control::Resume);
            return;
        }
        if let Some(stale) = self.device.take() {
            stale.close();
        }
        self.device = ToneDevice::open();
    }

    fn beep(&mut self, frequency_hz: f32, duration_secs: f32) {
        if !self.device.as_ref().is_some_and(ToneDevice::is_alive) {
            self.prime();
        }
        let Some(device) = &self.device else {
            return;
        };
        if let Ok(mut voices) = device.voices.lock() {
            voices.push(Voice {
                frequency_hz,
                duration_secs,
                position: 0,
            });
        }
    }

    fn release(&mut self) {
        if let Some(device) = self.device.take() {
            device.close();
        }
    }
}

impl Drop for SpeakerCues {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn voice_fades_and_finishes() {
        let mut voice = Voice {
            frequency_hz: 440.0,
            duration_secs: 0.01,
            position: 0,
        };
        let samples: Vec<f32> = std::iter::from_fn(|| voice.next_sample(1000.0)).collect();

        assert!((9..=11).contains(&samples.len()));
        assert!(samples.iter().all(|s| s.abs() <= START_GAIN));
        assert!(voice.next_sample(1000.0).is_none());
    }
}
