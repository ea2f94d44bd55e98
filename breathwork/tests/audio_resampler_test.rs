/// Integration tests for cue rate rendering
///
/// Renders cue-length signals at the playback rates each speed produces and
/// checks that the rendered clip fills the target cycle.

use breathwork_lib::audio::{CueKind, RateRenderer};
use breathwork_lib::state::Speed;

fn sine(duration_ms: f64, sample_rate: u32) -> Vec<f32> {
    let len = (duration_ms * sample_rate as f64 / 1000.0).round() as usize;
    (0..len)
        .map(|i| {
            let t = i as f32 / sample_rate as f32;
            (2.0 * std::f32::consts::PI * 440.0 * t).sin() * 0.5
        })
        .collect()
}

#[test]
fn test_cue_renders_fill_target_cycle() {
    println!("\n=== Cue Render Test: every speed, both cues ===");

    for speed in Speed::ALL {
        for cue in [CueKind::BreathIn, CueKind::BreathOut] {
            let input = sine(cue.native_ms(), 44100);
            let rate = cue.rate_for(speed.target_cycle_ms());

            let mut renderer = RateRenderer::new(44100, 48000, rate).unwrap();
            let output = renderer.render(&input).unwrap();
            let rendered_ms = output.len() as f64 * 1000.0 / 48000.0;

            println!(
                "  {:<6} {:<10} rate {:.4} -> {:.1}ms",
                speed.as_str(),
                cue.asset_name(),
                rate,
                rendered_ms
            );

            assert!(
                (rendered_ms - speed.target_cycle_ms() as f64).abs() < 5.0,
                "{} at {} should last ~{}ms, got {:.1}ms",
                cue,
                speed,
                speed.target_cycle_ms(),
                rendered_ms
            );
        }
    }
}

#[test]
fn test_render_preserves_amplitude() {
    let input = sine(CueKind::BreathIn.native_ms(), 44100);
    let rate = CueKind::BreathIn.rate_for(Speed::Slow.target_cycle_ms());

    let mut renderer = RateRenderer::new(44100, 48000, rate).unwrap();
    let output = renderer.render(&input).unwrap();

    let max_amplitude = output.iter().map(|v| v.abs()).fold(0.0f32, f32::max);
    println!("Max amplitude: {:.4}", max_amplitude);

    assert!(
        max_amplitude > 0.4 && max_amplitude < 0.6,
        "Signal amplitude should be preserved"
    );
}

#[test]
fn test_native_rate_only_converts_sample_rate() {
    let input = sine(1000.0, 44100);

    let mut renderer = RateRenderer::new(44100, 48000, 1.0).unwrap();
    let output = renderer.render(&input).unwrap();

    assert_eq!(output.len(), 48000);
}

#[test]
fn test_render_is_repeatable() {
    let input = sine(500.0, 48000);
    let mut renderer = RateRenderer::new(48000, 48000, 0.75).unwrap();

    let first = renderer.render(&input).unwrap();
    let second = renderer.render(&input).unwrap();

    assert_eq!(first.len(), second.len());
    assert_eq!(first, second, "Renderer state must reset between renders");
}
