use std::fs::File;
use std::io::Cursor;
use std::path::Path;

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::{MediaSource, MediaSourceStream};
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::{debug, info};

use crate::audio::error::{AudioError, AudioResult};

/// A fully decoded cue, downmixed to mono
#[derive(Debug, Clone)]
pub struct DecodedClip {
    /// Mono samples
    pub samples: Vec<f32>,
    /// Sample rate of `samples` in Hz
    pub sample_rate: u32,
}

impl DecodedClip {
    /// Length of the clip in milliseconds
    pub fn duration_ms(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 * 1000.0 / self.sample_rate as f64
    }
}

/// Decode an audio file into a mono clip
///
/// # Errors
/// Returns `AudioError::Io` if the file cannot be opened,
/// `AudioError::Decode` if the container or codec is not understood.
///
/// # Example
/// ```no_run
/// use std::path::Path;
/// use breathwork_lib::audio::decoder::decode_file;
///
/// let clip = decode_file(Path::new("sounds/breath-in.mp3")).unwrap();
/// println!("{} samples @ {} Hz", clip.samples.len(), clip.sample_rate);
/// ```
pub fn decode_file(path: &Path) -> AudioResult<DecodedClip> {
    let file = File::open(path)?;
    let ext = path.extension().and_then(|e| e.to_str());
    let clip = decode_source(Box::new(file), ext, &path.display().to_string())?;

    info!(
        path = %path.display(),
        sample_rate = clip.sample_rate,
        duration_ms = clip.duration_ms(),
        "Decoded cue"
    );
    Ok(clip)
}

/// Decode an in-memory audio file into a mono clip
pub fn decode_bytes(bytes: Vec<u8>, ext_hint: Option<&str>) -> AudioResult<DecodedClip> {
    decode_source(Box::new(Cursor::new(bytes)), ext_hint, "<memory>")
}

fn decode_source(
    source: Box<dyn MediaSource>,
    ext_hint: Option<&str>,
    label: &str,
) -> AudioResult<DecodedClip> {
    let mss = MediaSourceStream::new(source, Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = ext_hint {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe().format(
        &hint,
        mss,
        &FormatOptions::default(),
        &MetadataOptions::default(),
    )?;
    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| AudioError::NoAudioTrack(label.to_string()))?;
    let track_id = track.id;
    let mut sample_rate = track.codec_params.sample_rate.unwrap_or(0);

    let mut decoder =
        symphonia::default::get_codecs().make(&track.codec_params, &DecoderOptions::default())?;

    let mut samples = Vec::new();
    let mut sample_buf: Option<SampleBuffer<f32>> = None;

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                break;
            }
            Err(SymphoniaError::ResetRequired) => {
                decoder.reset();
                continue;
            }
            Err(e) => return Err(e.into()),
        };

        if packet.track_id() != track_id {
            continue;
        }

        match decoder.decode(&packet) {
            Ok(audio_buf) => {
                let spec = *audio_buf.spec();
                sample_rate = spec.rate;
                let channels = spec.channels.count().max(1);

                let needs_realloc = sample_buf
                    .as_ref()
                    .is_none_or(|buf| buf.capacity() < audio_buf.capacity());
                if needs_realloc {
                    sample_buf = Some(SampleBuffer::<f32>::new(audio_buf.capacity() as u64, spec));
                }
                let Some(buf) = sample_buf.as_mut() else {
                    continue;
                };
                buf.copy_interleaved_ref(audio_buf);
                downmix_into(&mut samples, buf.samples(), channels);
            }
            // A corrupt frame is skipped, the rest of the clip is still usable
            Err(SymphoniaError::DecodeError(e)) => {
                debug!(error = %e, "Skipping undecodable packet");
            }
            Err(e) => return Err(e.into()),
        }
    }

    if sample_rate == 0 || samples.is_empty() {
        return Err(AudioError::NoAudioTrack(label.to_string()));
    }

    Ok(DecodedClip {
        samples,
        sample_rate,
    })
}

/// Average interleaved frames down to one channel
fn downmix_into(out: &mut Vec<f32>, interleaved: &[f32], channels: usize) {
    if channels == 1 {
        out.extend_from_slice(interleaved);
        return;
    }
    out.extend(
        interleaved
            .chunks_exact(channels)
            .map(|frame| frame.iter().sum::<f32>() / channels as f32),
    );
}
