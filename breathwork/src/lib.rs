/// Cue decoding, rate rendering and playback
pub mod audio;

/// Phase sequencer and the async engine driving it
pub mod engine;

/// Settings, run state and progress projection
pub mod state;

/// One-shot timer abstraction
pub mod timer;

/// Utility modules
pub mod utils;
