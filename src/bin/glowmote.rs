use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

use anyhow::Context as _;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "glowmote", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Replay a scenario JSON headlessly and print a run summary.
    Run(RunArgs),
    /// List the built-in emotion, gesture, groove and pattern catalogs.
    Presets,
}

#[derive(Parser, Debug)]
struct RunArgs {
    /// Input scenario JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Stream every frame to stdout as one JSON object per line.
    #[arg(long)]
    frames: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.cmd {
        Command::Run(args) => cmd_run(args),
        Command::Presets => cmd_presets(),
    }
}

fn read_scenario(path: &Path) -> anyhow::Result<glowmote::Scenario> {
    let f = File::open(path).with_context(|| format!("open scenario '{}'", path.display()))?;
    let r = BufReader::new(f);
    let scenario: glowmote::Scenario =
        serde_json::from_reader(r).with_context(|| "parse scenario JSON")?;
    Ok(scenario)
}

fn cmd_run(args: RunArgs) -> anyhow::Result<()> {
    let scenario = read_scenario(&args.in_path)?;
    scenario.validate()?;

    let emit_frames = args.frames;
    let summary = glowmote::run_scenario(&scenario, |t_ms, frame| {
        if emit_frames {
            match serde_json::to_string(&serde_json::json!({ "t_ms": t_ms, "frame": frame })) {
                Ok(line) => println!("{line}"),
                Err(err) => eprintln!("frame serialization failed: {err}"),
            }
        }
    })?;

    eprintln!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

fn cmd_presets() -> anyhow::Result<()> {
    println!("emotions:");
    for name in glowmote::builtin_emotions().keys() {
        println!("  {name}");
    }

    println!("gestures:");
    let registry = glowmote::GestureRegistry::with_builtins();
    for name in registry.names() {
        let Some(def) = registry.get(name) else {
            continue;
        };
        let blend = match def.blend {
            glowmote::BlendType::Override => "override",
            glowmote::BlendType::Blend => "blend",
        };
        println!("  {name} ({blend})");
    }

    println!("grooves:");
    for name in glowmote::builtin_grooves().keys() {
        println!("  {name}");
    }

    println!("patterns:");
    for pattern in [
        glowmote::RhythmPattern::Straight,
        glowmote::RhythmPattern::Swing,
        glowmote::RhythmPattern::Waltz,
        glowmote::RhythmPattern::Dubstep,
        glowmote::RhythmPattern::Breakbeat,
    ] {
        println!("  {pattern:?}");
    }
    Ok(())
}
