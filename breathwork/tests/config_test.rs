use std::sync::Arc;

use breathwork_lib::state::{
    BreathSettings, ConfigError, PhaseSet, PresetLoader, SettingsHolder, Speed,
};

fn temp_preset(name: &str, content: &str) -> std::path::PathBuf {
    let dir = std::env::temp_dir().join(format!("breathwork-config-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join(name);
    std::fs::write(&path, content).unwrap();
    path
}

#[test]
fn test_load_full_preset() {
    let path = temp_preset(
        "full.json",
        r#"{
            "breath_count": 30,
            "round_count": 4,
            "speed": "fast",
            "phase_set": "breath-only",
            "rest_after_final_round": true
        }"#,
    );

    let settings = PresetLoader::load(&path).unwrap();
    assert_eq!(settings.breath_count, 30);
    assert_eq!(settings.round_count, 4);
    assert_eq!(settings.speed, Speed::Fast);
    assert_eq!(settings.phase_set, PhaseSet::BreathOnly);
    assert!(settings.rest_after_final_round);

    // Out of range values are kept, only reported
    assert_eq!(settings.range_warnings().len(), 1);
}

#[test]
fn test_partial_preset_takes_defaults() {
    let path = temp_preset("partial.json", r#"{ "speed": "slow" }"#);

    let settings = PresetLoader::load(&path).unwrap();
    assert_eq!(
        settings,
        BreathSettings {
            speed: Speed::Slow,
            ..BreathSettings::default()
        }
    );
}

#[test]
fn test_missing_preset() {
    let result = PresetLoader::load(std::path::Path::new("no/such/preset.json"));
    assert!(matches!(result, Err(ConfigError::Io(_))));
}

#[test]
fn test_unknown_speed_in_preset() {
    let result = PresetLoader::parse(r#"{ "speed": "warp" }"#);
    assert!(matches!(result, Err(ConfigError::Json(_))));
}

#[test]
fn test_loading_never_writes() {
    let content = r#"{ "breath_count": 7 }"#;
    let path = temp_preset("readonly.json", content);

    let settings = PresetLoader::load(&path).unwrap();
    let holder = SettingsHolder::new(settings);
    holder.set_breath_count(12);

    assert_eq!(std::fs::read_to_string(&path).unwrap(), content);
}

#[test]
fn test_parse_cli_values() {
    assert_eq!("MEDIUM".parse::<Speed>().unwrap(), Speed::Medium);
    assert_eq!("breath_only".parse::<PhaseSet>().unwrap(), PhaseSet::BreathOnly);
    assert!(matches!(
        "box".parse::<PhaseSet>(),
        Err(ConfigError::InvalidPhaseSet(_))
    ));
}

#[test]
fn test_holder_concurrent_edits() {
    let holder = Arc::new(SettingsHolder::default());

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let holder = Arc::clone(&holder);
            std::thread::spawn(move || {
                for _ in 0..100 {
                    if i % 2 == 0 {
                        holder.set_breath_count(holder.breath_count() + 1);
                    } else {
                        let _ = holder.get().target_cycle_ms();
                    }
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    // Lost updates are possible between get and set; reads never tear
    let settings = holder.get();
    assert!(settings.breath_count > 5);
    assert_eq!(settings.round_count, 3);
}
