/// Cue definitions and the player abstraction
pub mod cue;

/// Cue asset decoding
pub mod decoder;

/// Audio device enumeration
pub mod device;

/// Audio-related error types
pub mod error;

/// Output device playback
pub mod output;

/// Lock-free command queue into the audio callback
pub mod queue;

/// Playback-rate rendering
pub mod resampler;

// Re-export commonly used types
pub use cue::{AudioCue, CueBank, CueKind, SilentCue, BREATH_IN_NATIVE_MS, BREATH_OUT_NATIVE_MS};
pub use decoder::{decode_bytes, decode_file, DecodedClip};
pub use device::{list_output_devices, AudioDevice};
pub use error::{AudioError, AudioResult};
pub use output::{open_cue_bank, AudioOutput, DeviceCue};
pub use resampler::RateRenderer;
