use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, warn};

use breathwork_lib::audio::{list_output_devices, open_cue_bank, CueBank};
use breathwork_lib::engine::{planned_duration, BreathingEngine, EngineEvent};
use breathwork_lib::state::{BreathSettings, PhaseSet, PresetLoader, SettingsHolder, Speed};
use breathwork_lib::utils::error::AppError;
use breathwork_lib::utils::logging::init_logging;

#[derive(Parser)]
#[command(name = "breathwork")]
#[command(version, about = "Guided breathing with paced audio cues")]
pub struct Cli {
    /// JSON preset to start from; flags below override its values
    #[arg(long)]
    pub preset: Option<PathBuf>,

    /// Breaths per round (one inhale plus one exhale)
    #[arg(short, long)]
    pub breaths: Option<u32>,

    /// Number of rounds
    #[arg(short, long)]
    pub rounds: Option<u32>,

    /// Pace: slow, medium or fast
    #[arg(short, long)]
    pub speed: Option<Speed>,

    /// Phases: breath-only, minimal, rounds or extended
    #[arg(short, long)]
    pub phases: Option<PhaseSet>,

    /// Rest after the final round too
    #[arg(long)]
    pub rest_after_final_round: bool,

    /// Directory holding breath-in.mp3 and breath-out.mp3
    #[arg(long, env = "BREATHWORK_SOUNDS", default_value = "sounds")]
    pub sounds: PathBuf,

    /// Output device name (defaults to the system output)
    #[arg(long)]
    pub device: Option<String>,

    /// Output volume between 0.0 and 1.0
    #[arg(long, default_value = "1.0", value_parser = parse_volume)]
    pub volume: f32,

    /// Run without audio
    #[arg(long)]
    pub mute: bool,

    /// Print events as JSON lines
    #[arg(long)]
    pub json: bool,

    /// List output devices and exit
    #[arg(long)]
    pub list_devices: bool,
}

impl Cli {
    fn settings(&self) -> Result<BreathSettings> {
        let mut settings = match &self.preset {
            Some(path) => PresetLoader::load(path)
                .with_context(|| format!("Failed to load preset {}", path.display()))?,
            None => BreathSettings::default(),
        };

        if let Some(breaths) = self.breaths {
            settings.breath_count = breaths;
        }
        if let Some(rounds) = self.rounds {
            settings.round_count = rounds;
        }
        if let Some(speed) = self.speed {
            settings.speed = speed;
        }
        if let Some(phases) = self.phases {
            settings.phase_set = phases;
        }
        if self.rest_after_final_round {
            settings.rest_after_final_round = true;
        }

        Ok(settings)
    }

    fn cue_bank(&self) -> Result<CueBank> {
        if self.mute {
            return Ok(CueBank::silent());
        }

        open_cue_bank(&self.sounds, self.device.as_deref(), self.volume).map_err(|e| {
            let ctx = AppError::from(e).context();
            error!(code = ?ctx.code, detail = ?ctx.detail, "{}", ctx.message);
            match ctx.recovery_hint {
                Some(hint) => anyhow::anyhow!("{} ({})", ctx.message, hint),
                None => anyhow::anyhow!(ctx.message),
            }
        })
    }
}

fn parse_volume(s: &str) -> Result<f32, String> {
    let volume: f32 = s.parse().map_err(|_| format!("'{}' is not a number", s))?;
    if (0.0..=1.0).contains(&volume) {
        Ok(volume)
    } else {
        Err(format!("volume {} is outside 0.0-1.0", volume))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging();

    if cli.list_devices {
        for device in list_output_devices().context("Failed to list output devices")? {
            let marker = if device.is_default { "*" } else { " " };
            println!("{} {}", marker, device.name);
        }
        return Ok(());
    }

    let settings = cli.settings()?;
    for warning in settings.range_warnings() {
        warn!("{}", warning);
    }

    let total = planned_duration(&settings);
    println!(
        "{} breaths x {} rounds at {} pace ({}), about {}s",
        settings.breath_count,
        settings.effective_rounds(),
        settings.speed,
        settings.phase_set,
        total.as_secs()
    );

    let cues = cli.cue_bank()?;
    let engine = BreathingEngine::with_tokio_timer(Arc::new(SettingsHolder::new(settings)), cues);
    let mut events = engine.subscribe().await;
    engine.start().await?;

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let mut interrupted = false;

    loop {
        tokio::select! {
            event = events.recv() => {
                let Some(event) = event else { break };
                print_event(&event, cli.json)?;
                if event.is_terminal() {
                    break;
                }
            }
            _ = &mut ctrl_c, if !interrupted => {
                interrupted = true;
                engine.stop().await?;
            }
        }
    }

    engine.shutdown().await?;
    Ok(())
}

fn print_event(event: &EngineEvent, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string(event)?);
        return Ok(());
    }

    match event {
        EngineEvent::Started { .. } => println!("Starting"),
        EngineEvent::Tick {
            progress: Some(progress),
            ..
        } => println!("{}", progress),
        EngineEvent::Tick { .. } => {}
        EngineEvent::Finished => println!("Done"),
        EngineEvent::Stopped => println!("Stopped"),
    }
    Ok(())
}
