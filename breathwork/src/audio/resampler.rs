use crate::audio::cue::validate_rate;
use crate::audio::error::{AudioError, AudioResult};
use rubato::{
    Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
};
use tracing::debug;

/// Offline resampler that renders a whole clip at a new playback rate
///
/// Playing a clip recorded at `source_rate` on a device running at
/// `device_rate` with playback rate `r` means producing
/// `len * device_rate / (source_rate * r)` output frames. Pitch follows the
/// rate, like a tape played faster or slower.
pub struct RateRenderer {
    /// The rubato resampler instance
    resampler: SincFixedIn<f32>,
    /// Input buffer for rubato (channels x samples)
    input_buffer: Vec<Vec<f32>>,
    /// Output buffer for rubato (channels x samples)
    output_buffer: Vec<Vec<f32>>,
    /// Output frames per input frame
    ratio: f64,
    /// Number of input samples per chunk
    chunk_size: usize,
}

impl RateRenderer {
    /// Create a renderer for one clip / device / rate combination
    ///
    /// # Errors
    /// Returns `AudioError::InvalidPlaybackRate` for a non-positive rate and
    /// `AudioError::ResampleFailed` if rubato rejects the ratio.
    ///
    /// # Example
    /// ```no_run
    /// use breathwork_lib::audio::resampler::RateRenderer;
    ///
    /// // 44.1kHz clip, 48kHz device, played at half speed
    /// let mut renderer = RateRenderer::new(44100, 48000, 0.5).unwrap();
    /// let stretched = renderer.render(&vec![0.0f32; 44100]).unwrap();
    /// assert_eq!(stretched.len(), 96000);
    /// ```
    pub fn new(source_rate: u32, device_rate: u32, playback_rate: f64) -> AudioResult<Self> {
        let playback_rate = validate_rate(playback_rate)?;
        if source_rate == 0 || device_rate == 0 {
            return Err(AudioError::ResampleFailed(format!(
                "Invalid sample rates: {} Hz -> {} Hz",
                source_rate, device_rate
            )));
        }

        let ratio = device_rate as f64 / (source_rate as f64 * playback_rate);
        debug!(
            source_rate,
            device_rate, playback_rate, "Creating rate renderer, ratio {:.6}", ratio
        );

        let params = SincInterpolationParameters {
            sinc_len: 128,
            f_cutoff: 0.95,
            interpolation: SincInterpolationType::Linear,
            oversampling_factor: 128,
            window: WindowFunction::BlackmanHarris2,
        };

        // 10ms of source audio per chunk
        let chunk_size = (source_rate / 100).max(1) as usize;

        let resampler = SincFixedIn::<f32>::new(ratio, 1.0, params, chunk_size, 1).map_err(
            |e| AudioError::ResampleFailed(format!("Failed to create resampler: {}", e)),
        )?;

        let input_buffer = resampler.input_buffer_allocate(true);
        let output_buffer = resampler.output_buffer_allocate(true);

        Ok(Self {
            resampler,
            input_buffer,
            output_buffer,
            ratio,
            chunk_size,
        })
    }

    /// Number of output frames `render` produces for `input_len` frames
    pub fn expected_len(&self, input_len: usize) -> usize {
        (input_len as f64 * self.ratio).round() as usize
    }

    /// Render a whole mono clip
    ///
    /// The tail is flushed with silence and the resampler delay is trimmed,
    /// so the output is exactly `expected_len(input.len())` frames.
    pub fn render(&mut self, input: &[f32]) -> AudioResult<Vec<f32>> {
        let expected = self.expected_len(input.len());
        let delay = self.resampler.output_delay();
        let target = expected + delay;

        let mut output = Vec::with_capacity(target + self.resampler.output_frames_max());
        let mut offset = 0usize;

        while output.len() < target {
            let chunk = &mut self.input_buffer[0];
            chunk.fill(0.0);
            if offset < input.len() {
                let end = (offset + self.chunk_size).min(input.len());
                chunk[..end - offset].copy_from_slice(&input[offset..end]);
            }
            offset += self.chunk_size;

            let (_used, generated) = self
                .resampler
                .process_into_buffer(&self.input_buffer, &mut self.output_buffer, None)
                .map_err(|e| AudioError::ResampleFailed(format!("Resampling failed: {}", e)))?;

            output.extend_from_slice(&self.output_buffer[0][..generated]);
        }

        output.drain(..delay.min(output.len()));
        output.truncate(expected);

        debug!("Rendered {} -> {} samples", input.len(), output.len());
        self.reset();

        Ok(output)
    }

    /// Reset the resampler state
    pub fn reset(&mut self) {
        self.resampler.reset();
        for channel in &mut self.input_buffer {
            channel.fill(0.0);
        }
        for channel in &mut self.output_buffer {
            channel.fill(0.0);
        }
    }

    /// Output frames per input frame
    pub fn ratio(&self) -> f64 {
        self.ratio
    }

    /// Get the chunk size (number of input samples per process call)
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(len: usize, rate: u32) -> Vec<f32> {
        (0..len)
            .map(|i| (2.0 * std::f32::consts::PI * 440.0 * i as f32 / rate as f32).sin() * 0.5)
            .collect()
    }

    #[test]
    fn test_ratio() {
        let renderer = RateRenderer::new(44100, 48000, 1.0).unwrap();
        assert!((renderer.ratio() - 48000.0 / 44100.0).abs() < 1e-9);
        assert_eq!(renderer.chunk_size(), 441);

        let renderer = RateRenderer::new(48000, 48000, 2.0).unwrap();
        assert!((renderer.ratio() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_invalid_rates() {
        assert!(matches!(
            RateRenderer::new(48000, 48000, 0.0),
            Err(AudioError::InvalidPlaybackRate(_))
        ));
        assert!(matches!(
            RateRenderer::new(0, 48000, 1.0),
            Err(AudioError::ResampleFailed(_))
        ));
    }

    #[test]
    fn test_render_stretches_slow_rate() {
        // 0.25s clip at rate 0.5 lasts 0.5s
        let input = sine(12000, 48000);
        let mut renderer = RateRenderer::new(48000, 48000, 0.5).unwrap();

        let output = renderer.render(&input).unwrap();
        assert_eq!(output.len(), 24000);
    }

    #[test]
    fn test_render_compresses_fast_rate() {
        let input = sine(12000, 48000);
        let mut renderer = RateRenderer::new(48000, 48000, 1.5).unwrap();

        let output = renderer.render(&input).unwrap();
        assert_eq!(output.len(), 8000);
    }

    #[test]
    fn test_render_preserves_energy() {
        let input = sine(9600, 48000);
        let mut renderer = RateRenderer::new(48000, 48000, 0.8).unwrap();

        let output = renderer.render(&input).unwrap();
        let peak = output.iter().fold(0.0f32, |m, s| m.max(s.abs()));
        assert!(peak > 0.3, "peak too low: {}", peak);
        assert!(peak < 0.7, "peak too high: {}", peak);
    }

    #[test]
    fn test_render_twice_is_deterministic() {
        let input = sine(4800, 48000);
        let mut renderer = RateRenderer::new(48000, 44100, 1.2).unwrap();

        let first = renderer.render(&input).unwrap();
        let second = renderer.render(&input).unwrap();
        assert_eq!(first, second);
    }
}
