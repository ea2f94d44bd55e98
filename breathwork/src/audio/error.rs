use thiserror::Error;

/// Audio-related errors
#[derive(Error, Debug)]
pub enum AudioError {
    /// No audio output device found
    #[error("No audio output device found")]
    DeviceNotFound,

    /// Failed to build audio stream
    #[error("Failed to build audio stream: {0}")]
    StreamBuildFailed(String),

    /// Audio stream error
    #[error("Audio stream error: {0}")]
    StreamError(String),

    /// Resampling failed
    #[error("Resampling failed: {0}")]
    ResampleFailed(String),

    /// Playback rate is not a positive finite number
    #[error("Invalid playback rate: {0}")]
    InvalidPlaybackRate(f64),

    /// Cue asset contains no decodable audio track
    #[error("No audio track in {0}")]
    NoAudioTrack(String),

    /// Cue asset could not be decoded
    #[error("Decode error: {0}")]
    Decode(#[from] symphonia::core::errors::Error),

    /// Cue asset could not be read
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Device sample format is not supported
    #[error("Unsupported sample format: {0}")]
    UnsupportedSampleFormat(String),

    /// The output thread has stopped
    #[error("Audio output is closed")]
    OutputClosed,

    /// Device name is invalid
    #[error("Device name is invalid UTF-8")]
    InvalidDeviceName,

    /// cpal error
    #[error("cpal error: {0}")]
    CpalError(#[from] cpal::DevicesError),

    /// Default config error
    #[error("Default config error: {0}")]
    DefaultConfigError(#[from] cpal::DefaultStreamConfigError),
}

/// Result type for audio operations
pub type AudioResult<T> = Result<T, AudioError>;
