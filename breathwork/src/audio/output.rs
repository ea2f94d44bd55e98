use std::collections::HashMap;
use std::path::Path;
use std::sync::{mpsc as std_mpsc, Arc, Mutex};
use std::thread::JoinHandle;

use cpal::traits::{DeviceTrait, StreamTrait};
use cpal::{SampleFormat, Stream, StreamConfig};
use tracing::{debug, error, info, warn};

use crate::audio::cue::{validate_rate, AudioCue, CueBank, CueKind};
use crate::audio::decoder::{decode_file, DecodedClip};
use crate::audio::device::find_output_device;
use crate::audio::error::{AudioError, AudioResult};
use crate::audio::queue::{CommandQueue, CommandReceiver, CommandSender, Voice, VoiceCommand};
use crate::audio::resampler::RateRenderer;

/// Audio output on a dedicated thread
///
/// `cpal::Stream` is not `Send` on every platform, so the stream is built
/// and kept alive on its own thread. Everything else talks to the real-time
/// callback through a lock-free command queue.
pub struct AudioOutput {
    /// Command sender into the audio callback
    sender: Mutex<CommandSender>,
    /// Device sample rate in Hz
    sample_rate: u32,
    /// Device channel count
    channels: u16,
    /// Name of the device in use
    device_name: String,
    /// Dropping this wakes the output thread
    shutdown_tx: Option<std_mpsc::Sender<()>>,
    /// Output thread
    thread: Option<JoinHandle<()>>,
}

struct OutputInfo {
    sample_rate: u32,
    channels: u16,
    device_name: String,
}

impl AudioOutput {
    /// Open an output device and start its stream
    ///
    /// # Arguments
    /// * `device_id` - Optional device name. If None, uses the default output device.
    ///
    /// # Errors
    /// Returns `AudioError::DeviceNotFound` if no device is available,
    /// `AudioError::UnsupportedSampleFormat` if the device does not run in f32.
    pub fn open(device_id: Option<&str>) -> AudioResult<Self> {
        let (sender, receiver) = CommandQueue::with_default_capacity();
        let (ready_tx, ready_rx) = std_mpsc::channel::<AudioResult<OutputInfo>>();
        let (shutdown_tx, shutdown_rx) = std_mpsc::channel::<()>();
        let device_id = device_id.map(str::to_string);

        let thread = std::thread::Builder::new()
            .name("breathwork-audio".to_string())
            .spawn(move || {
                let stream = match build_stream(device_id.as_deref(), receiver) {
                    Ok((stream, info)) => {
                        let _ = ready_tx.send(Ok(info));
                        stream
                    }
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                        return;
                    }
                };

                // Returns on explicit shutdown or when the sender is dropped
                let _ = shutdown_rx.recv();
                drop(stream);
                debug!("Audio output thread exiting");
            })?;

        let info = ready_rx.recv().map_err(|_| AudioError::OutputClosed)??;

        info!(
            device = %info.device_name,
            sample_rate = info.sample_rate,
            channels = info.channels,
            "Audio output started"
        );

        Ok(Self {
            sender: Mutex::new(sender),
            sample_rate: info.sample_rate,
            channels: info.channels,
            device_name: info.device_name,
            shutdown_tx: Some(shutdown_tx),
            thread: Some(thread),
        })
    }

    /// Send a command to the audio callback
    pub fn send(&self, command: VoiceCommand) -> AudioResult<()> {
        let mut sender = self.sender.lock().map_err(|_| AudioError::OutputClosed)?;
        if sender.send(command) {
            Ok(())
        } else {
            Err(AudioError::StreamError("command queue is full".to_string()))
        }
    }

    /// Set the output volume (0.0 - 1.0)
    pub fn set_volume(&self, volume: f32) -> AudioResult<()> {
        self.send(VoiceCommand::Volume(volume))
    }

    /// Get the sample rate of the output device
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Get the number of channels
    pub fn channels(&self) -> u16 {
        self.channels
    }

    pub fn device_name(&self) -> &str {
        &self.device_name
    }
}

impl Drop for AudioOutput {
    fn drop(&mut self) {
        let _ = self.send(VoiceCommand::Stop);
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                warn!("Audio output thread panicked");
            }
        }
    }
}

fn build_stream(
    device_id: Option<&str>,
    mut receiver: CommandReceiver,
) -> AudioResult<(Stream, OutputInfo)> {
    let host = cpal::default_host();
    let device = find_output_device(&host, device_id)?;
    let device_name = device.name().unwrap_or_else(|_| "Unknown".to_string());

    let supported = device.default_output_config()?;
    if supported.sample_format() != SampleFormat::F32 {
        return Err(AudioError::UnsupportedSampleFormat(format!(
            "{:?}",
            supported.sample_format()
        )));
    }

    let channels = supported.channels();
    let config = StreamConfig {
        channels,
        sample_rate: supported.sample_rate(),
        buffer_size: cpal::BufferSize::Default,
    };

    let mut voice = Voice::default();
    let frame_channels = channels as usize;

    let stream = device
        .build_output_stream(
            &config,
            move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                receiver.drain_into(&mut voice);
                voice.fill_interleaved(data, frame_channels);
            },
            move |err| {
                error!("Audio output stream error: {}", err);
            },
            None,
        )
        .map_err(|e| AudioError::StreamBuildFailed(e.to_string()))?;

    stream
        .play()
        .map_err(|e| AudioError::StreamError(e.to_string()))?;

    Ok((
        stream,
        OutputInfo {
            sample_rate: config.sample_rate.0,
            channels,
            device_name,
        },
    ))
}

/// A decoded cue played through an `AudioOutput`
///
/// Renders are cached per playback rate; a run only ever uses a handful.
pub struct DeviceCue {
    kind: CueKind,
    clip: DecodedClip,
    output: Arc<AudioOutput>,
    rate: f64,
    renders: HashMap<u64, Arc<[f32]>>,
}

impl DeviceCue {
    pub fn new(kind: CueKind, clip: DecodedClip, output: Arc<AudioOutput>) -> Self {
        Self {
            kind,
            clip,
            output,
            rate: 1.0,
            renders: HashMap::new(),
        }
    }

    fn render(&mut self, rate: f64) -> AudioResult<Arc<[f32]>> {
        if let Some(render) = self.renders.get(&rate.to_bits()) {
            return Ok(Arc::clone(render));
        }

        let mut renderer =
            RateRenderer::new(self.clip.sample_rate, self.output.sample_rate(), rate)?;
        let render: Arc<[f32]> = Arc::from(renderer.render(&self.clip.samples)?);

        debug!(cue = %self.kind, rate, frames = render.len(), "Cue rendered");
        self.renders.insert(rate.to_bits(), Arc::clone(&render));
        Ok(render)
    }

    /// Render every rate a run can request, so the engine task only hits the cache
    pub fn prerender(&mut self) -> AudioResult<()> {
        for rate in self.kind.scheduled_rates() {
            self.render(rate)?;
        }
        Ok(())
    }
}

impl AudioCue for DeviceCue {
    fn set_playback_rate(&mut self, rate: f64) -> AudioResult<()> {
        let rate = validate_rate(rate)?;
        self.render(rate)?;
        self.rate = rate;
        Ok(())
    }

    fn play(&mut self) -> AudioResult<()> {
        let render = self.render(self.rate)?;
        self.output.send(VoiceCommand::Play(render))
    }
}

/// Decode both cue assets and bind them to an output device
///
/// # Arguments
/// * `sounds_dir` - Directory holding `breath-in.mp3` and `breath-out.mp3`
/// * `device_id` - Optional output device name
/// * `volume` - Output volume (0.0 - 1.0)
pub fn open_cue_bank(
    sounds_dir: &Path,
    device_id: Option<&str>,
    volume: f32,
) -> AudioResult<CueBank> {
    let breath_in = decode_file(&CueKind::BreathIn.asset_path(sounds_dir))?;
    let breath_out = decode_file(&CueKind::BreathOut.asset_path(sounds_dir))?;

    for (kind, clip) in [(CueKind::BreathIn, &breath_in), (CueKind::BreathOut, &breath_out)] {
        let drift = (clip.duration_ms() - kind.native_ms()).abs();
        if drift > 50.0 {
            warn!(
                cue = %kind,
                decoded_ms = clip.duration_ms(),
                expected_ms = kind.native_ms(),
                "Cue length differs from the timing table"
            );
        }
    }

    let output = Arc::new(AudioOutput::open(device_id)?);
    output.set_volume(volume)?;

    let mut breath_in = DeviceCue::new(CueKind::BreathIn, breath_in, Arc::clone(&output));
    let mut breath_out = DeviceCue::new(CueKind::BreathOut, breath_out, output);
    breath_in.prerender()?;
    breath_out.prerender()?;
    info!("Cue renders ready");

    Ok(CueBank::new(Box::new(breath_in), Box::new(breath_out)))
}
