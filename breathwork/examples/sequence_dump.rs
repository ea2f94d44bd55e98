//! Print the full timeline of a breathing run without playing audio
//!
//! Usage: cargo run --example sequence_dump -- [breaths] [rounds] [speed] [phases]

use std::time::Duration;

use breathwork_lib::engine::{plan_run, planned_duration};
use breathwork_lib::state::{phase_label, BreathSettings};

fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let mut settings = BreathSettings::default();

    if let Some(breaths) = args.first() {
        settings.breath_count = breaths.parse()?;
    }
    if let Some(rounds) = args.get(1) {
        settings.round_count = rounds.parse()?;
    }
    if let Some(speed) = args.get(2) {
        settings.speed = speed.parse()?;
    }
    if let Some(phases) = args.get(3) {
        settings.phase_set = phases.parse()?;
    }

    println!("{}", serde_json::to_string_pretty(&settings)?);
    println!();

    let mut at = Duration::ZERO;
    for tick in plan_run(&settings) {
        let cue = match tick.cue {
            Some(playback) => format!("{} @ {:.4}", playback.cue, playback.rate),
            None => "-".to_string(),
        };
        println!(
            "{:>9.3}s  round {:<2} {:<20} {:<24} {:>6}ms",
            at.as_secs_f64(),
            tick.state.current_round,
            phase_label(&tick.state),
            cue,
            tick.delay.as_millis()
        );
        at += tick.delay;
    }

    println!();
    println!("total {:.3}s", planned_duration(&settings).as_secs_f64());
    Ok(())
}
