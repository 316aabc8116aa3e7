use anyhow::{Result, anyhow};
use pico_args::Arguments;
use std::{env, path::PathBuf};

use crate::config::{ConfigState, Profile};
use crate::geom::Point;
use crate::replay;
use crate::unistroke::{RecognitionMode, Recognizer};

pub fn run() -> Result<()> {
    let mut pargs = Arguments::from_env();

    // No args -> general help
    if env::args().len() == 1 {
        print_help();
        return Ok(());
    }

    // Flags-based help (-h/--help)
    if pargs.contains("-h") || pargs.contains("--help") {
        print_help();
        return Ok(());
    }

    let profile_path: Option<PathBuf> = pargs.opt_value_from_str("--profile")?;

    // First free arg is the subcommand
    let subcmd: Option<String> = pargs.free_from_str().ok();

    match subcmd.as_deref() {
        Some("help") => {
            let topic: Option<String> = pargs.free_from_str().ok();
            if let Some(t) = topic {
                print_subcmd_help(&t);
            } else {
                print_help();
            }
            Ok(())
        }

        Some("replay") => {
            let path: PathBuf = pargs
                .free_from_str()
                .map_err(|_| anyhow!("usage: handcue replay <frames.jsonl> [--profile <path>]"))?;
            let profile = load_profile(profile_path)?;
            let summary = replay::run(&path, &profile)?;
            println!("ok: {} frames, {} events", summary.frames, summary.events);
            Ok(())
        }

        Some("recognize") => {
            let path: PathBuf = pargs
                .free_from_str()
                .map_err(|_| anyhow!("usage: handcue recognize <stroke.json>"))?;
            let text = std::fs::read_to_string(&path)
                .map_err(|e| anyhow!("failed to read {}: {e}", path.display()))?;
            let points: Vec<Point> = serde_json::from_str(&text)
                .map_err(|e| anyhow!("failed to parse {}: {e}", path.display()))?;
            let rec = Recognizer::new(RecognitionMode::Geometric);
            match rec.recognize(&points) {
                Some(m) => println!(
                    "{}",
                    serde_json::json!({"name": m.name, "score": m.score, "millis": m.millis})
                ),
                None => println!("{}", serde_json::json!({"name": null, "score": 0.0})),
            }
            Ok(())
        }

        Some("templates") => {
            let rec = Recognizer::new(RecognitionMode::Geometric);
            for name in rec.template_names() {
                println!("{name}");
            }
            Ok(())
        }

        Some("check") => {
            let report = match profile_path {
                Some(p) => {
                    // validate the given profile rather than the installed one
                    let profile = Profile::from_path(&p)?;
                    let kinds: Vec<&str> =
                        profile.listeners.iter().map(|l| l.kind.as_str()).collect();
                    serde_json::json!({
                        "profile": p,
                        "valid": true,
                        "listeners": kinds,
                    })
                }
                None => ConfigState::load_or_install_default()?.check_report(),
            };
            println!("{}", serde_json::to_string_pretty(&report).unwrap_or_default());
            Ok(())
        }

        Some(other) => {
            eprintln!("unknown subcommand: {other}\n");
            print_help();
            Ok(())
        }

        None => {
            print_help();
            Ok(())
        }
    }
}

fn load_profile(path: Option<PathBuf>) -> Result<Profile> {
    match path {
        Some(p) => Profile::from_path(&p),
        None => Ok(ConfigState::load_or_install_default()?.profile),
    }
}

fn print_help() {
    println!(
        r#"handcue — hand-gesture event engine for chart storytelling

USAGE:
  handcue help [command]                     Show general or command-specific help
  handcue replay <frames.jsonl> [--profile <path>]
                                             Run recorded frames through the engine
  handcue recognize <stroke.json>            Classify one stroke against built-ins
  handcue templates                          List built-in stroke templates
  handcue check [--profile <path>]           Validate a profile / show config state

TIPS:
  - Profiles: ~/.config/handcue/profiles
  - Frames are JSON Lines; one landmark frame per line
  - Events are printed as JSON objects on stdout
"#
    );
}

fn print_subcmd_help(cmd: &str) {
    match cmd {
        "replay" => println!(
            "usage: handcue replay <frames.jsonl> [--profile <path>]\nStreams recorded frames through every configured listener and prints confirmed events."
        ),
        "recognize" => println!(
            "usage: handcue recognize <stroke.json>\nClassifies a JSON array of points against the built-in template set."
        ),
        "templates" => println!("usage: handcue templates\nLists the built-in stroke templates."),
        "check" => println!(
            "usage: handcue check [--profile <path>]\nValidates the given profile, or reports the installed configuration."
        ),
        _ => {
            eprintln!("unknown command: {cmd}\n");
            print_help();
        }
    }
}
