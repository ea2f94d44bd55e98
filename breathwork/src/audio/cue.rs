use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Serialize;
use tracing::debug;

use crate::audio::error::{AudioError, AudioResult};
use crate::state::Speed;

/// Native length of the breath-in recording in milliseconds
pub const BREATH_IN_NATIVE_MS: f64 = 2194.281;

/// Native length of the breath-out recording in milliseconds
pub const BREATH_OUT_NATIVE_MS: f64 = 3317.531;

/// Which of the two recorded cues to play
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CueKind {
    BreathIn,
    BreathOut,
}

impl CueKind {
    /// Length of the unscaled recording in milliseconds
    pub fn native_ms(self) -> f64 {
        match self {
            CueKind::BreathIn => BREATH_IN_NATIVE_MS,
            CueKind::BreathOut => BREATH_OUT_NATIVE_MS,
        }
    }

    /// Length of the unscaled recording
    pub fn native_duration(self) -> Duration {
        Duration::from_secs_f64(self.native_ms() / 1000.0)
    }

    /// Playback rate that stretches the recording to `target_ms`
    pub fn rate_for(self, target_ms: u64) -> f64 {
        self.native_ms() / target_ms as f64
    }

    /// Every rate a run can request for this cue: one per speed, plus the
    /// native rate used by recovery breaths
    pub fn scheduled_rates(self) -> Vec<f64> {
        let mut rates: Vec<f64> = Speed::ALL
            .iter()
            .map(|speed| self.rate_for(speed.target_cycle_ms()))
            .collect();
        rates.push(1.0);
        rates
    }

    /// Stable asset identifier
    pub fn asset_name(self) -> &'static str {
        match self {
            CueKind::BreathIn => "breath-in",
            CueKind::BreathOut => "breath-out",
        }
    }

    /// Asset path inside a sounds directory
    pub fn asset_path(self, sounds_dir: &Path) -> PathBuf {
        sounds_dir.join(format!("{}.mp3", self.asset_name()))
    }
}

impl fmt::Display for CueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.asset_name())
    }
}

/// A single playable cue
///
/// `play` always restarts the cue from the beginning at the rate most
/// recently set with `set_playback_rate`.
pub trait AudioCue: Send {
    /// Set the playback rate used by the next `play`
    fn set_playback_rate(&mut self, rate: f64) -> AudioResult<()>;

    /// Start the cue from the beginning
    fn play(&mut self) -> AudioResult<()>;
}

/// The two long-lived cue handles owned by the engine
pub struct CueBank {
    breath_in: Box<dyn AudioCue>,
    breath_out: Box<dyn AudioCue>,
}

impl CueBank {
    pub fn new(breath_in: Box<dyn AudioCue>, breath_out: Box<dyn AudioCue>) -> Self {
        Self {
            breath_in,
            breath_out,
        }
    }

    /// A bank that plays nothing
    pub fn silent() -> Self {
        Self::new(
            Box::new(SilentCue::new(CueKind::BreathIn)),
            Box::new(SilentCue::new(CueKind::BreathOut)),
        )
    }

    pub fn cue_mut(&mut self, kind: CueKind) -> &mut dyn AudioCue {
        match kind {
            CueKind::BreathIn => self.breath_in.as_mut(),
            CueKind::BreathOut => self.breath_out.as_mut(),
        }
    }

    /// Set the rate on a cue, then start it
    pub fn play_at(&mut self, kind: CueKind, rate: f64) -> AudioResult<()> {
        let cue = self.cue_mut(kind);
        cue.set_playback_rate(rate)?;
        cue.play()
    }
}

/// Reject rates a player cannot honor
pub fn validate_rate(rate: f64) -> AudioResult<f64> {
    if rate.is_finite() && rate > 0.0 {
        Ok(rate)
    } else {
        Err(AudioError::InvalidPlaybackRate(rate))
    }
}

/// Cue that only logs, used with `--mute`
pub struct SilentCue {
    kind: CueKind,
    rate: f64,
}

impl SilentCue {
    pub fn new(kind: CueKind) -> Self {
        Self { kind, rate: 1.0 }
    }
}

impl AudioCue for SilentCue {
    fn set_playback_rate(&mut self, rate: f64) -> AudioResult<()> {
        self.rate = validate_rate(rate)?;
        Ok(())
    }

    fn play(&mut self) -> AudioResult<()> {
        debug!(cue = %self.kind, rate = self.rate, "Silent cue played");
        Ok(())
    }
}
