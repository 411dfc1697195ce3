use std::path::PathBuf;

use glowmote::{Command, EngineConfig, Scenario, TimedCommand};

#[test]
fn cli_run_prints_summary() {
    let dir = PathBuf::from("target").join("cli_smoke");
    std::fs::create_dir_all(&dir).unwrap();

    let scenario_path = dir.join("scenario.json");
    let scenario = Scenario {
        config: EngineConfig {
            emotion: "joy".to_string(),
            ..Default::default()
        },
        duration_ms: 500.0,
        tick_ms: 20.0,
        commands: vec![
            TimedCommand {
                at_ms: 0.0,
                command: Command::StartRhythm,
            },
            TimedCommand {
                at_ms: 100.0,
                command: Command::TriggerGesture {
                    name: "pulse".to_string(),
                    tuning: Default::default(),
                },
            },
        ],
    };

    let f = std::fs::File::create(&scenario_path).unwrap();
    serde_json::to_writer_pretty(f, &scenario).unwrap();

    let exe = std::env::var_os("CARGO_BIN_EXE_glowmote")
        .map(PathBuf::from)
        .unwrap_or_else(|| {
            let mut p = PathBuf::from("target").join("debug");
            p.push(if cfg!(windows) {
                "glowmote.exe"
            } else {
                "glowmote"
            });
            p
        });

    let scenario_arg = scenario_path.to_string_lossy().to_string();

    let output = std::process::Command::new(&exe)
        .args(["run", "--in", scenario_arg.as_str(), "--frames"])
        .output()
        .unwrap();

    assert!(output.status.success());
    // 500ms at 20ms per tick: 25 frame lines on stdout.
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout.lines().count(), 25);
    // The summary lands on stderr.
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("\"frames\": 25"));

    let presets = std::process::Command::new(&exe)
        .arg("presets")
        .output()
        .unwrap();
    assert!(presets.status.success());
    let listing = String::from_utf8_lossy(&presets.stdout);
    assert!(listing.contains("joy"));
    assert!(listing.contains("shatter (override)"));
}
