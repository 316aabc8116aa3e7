//! Offline frame replay: stream recorded landmark frames (JSON Lines, one
//! [`LandmarkFrame`] per line) through an engine and print every confirmed
//! event as a JSON object on stdout.

use anyhow::{Context, Result};
use log::info;
use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::Path,
};

use crate::config::Profile;
use crate::engine::Engine;
use crate::frame::LandmarkFrame;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplaySummary {
    pub frames: u64,
    pub events: u64,
}

pub fn run(path: &Path, profile: &Profile) -> Result<ReplaySummary> {
    let file =
        File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let mut engine = Engine::from_profile(profile)?;
    run_reader(BufReader::new(file), &mut engine, true)
        .with_context(|| path.display().to_string())
}

fn run_reader(
    reader: impl BufRead,
    engine: &mut Engine,
    print: bool,
) -> Result<ReplaySummary> {
    let mut events: u64 = 0;
    for (lineno, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let frame: LandmarkFrame = serde_json::from_str(&line)
            .with_context(|| format!("bad frame on line {}", lineno + 1))?;
        for emitted in engine.process(&frame)? {
            if print {
                println!("{}", serde_json::to_string(&emitted)?);
            }
            events += 1;
        }
    }
    let summary = ReplaySummary {
        frames: engine.frames_seen(),
        events,
    };
    info!("replay: {} frames, {} events", summary.frames, summary.events);
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Profile;

    fn profile() -> Profile {
        Profile::parse(
            r#"
            [meta]
            name = "replay-test"
            allow_enroll = false

            [thresholds]
            hold_ms = 1000
            cooldown_ms = 1000
            tolerance_px = 30.0
            touch_px = 20.0
            min_stroke_points = 5
            accept_score = 0.8
            dial_idle_ms = 3000

            [[listener]]
            kind = "point"
            region = { x = 0.0, y = 0.0, w = 800.0, h = 600.0 }
            hand = "right"
            landmark = "index_tip"
        "#,
        )
        .unwrap()
    }

    fn frame_line(t_ms: u64, x: f32, y: f32) -> String {
        let landmarks: Vec<String> = (0..21)
            .map(|i| {
                if i == 8 {
                    format!("{{\"x\":{x},\"y\":{y}}}")
                } else {
                    "{\"x\":null,\"y\":null}".to_string()
                }
            })
            .collect();
        format!(
            "{{\"t_ms\":{t_ms},\"right\":{{\"landmarks\":[{}]}}}}",
            landmarks.join(",")
        )
    }

    #[test]
    fn test_replay_counts_frames_and_events() {
        let mut input = String::new();
        for i in 0..=25u64 {
            input.push_str(&frame_line(i * 40, 100.0, 100.0));
            input.push('\n');
        }
        input.push('\n'); // blank lines are skipped
        let mut engine = Engine::from_profile(&profile()).unwrap();
        let summary = run_reader(input.as_bytes(), &mut engine, false).unwrap();
        assert_eq!(summary.frames, 26);
        assert_eq!(summary.events, 1);
    }

    #[test]
    fn test_replay_rejects_bad_frame() {
        let input = "{\"t_ms\": not json}\n";
        let mut engine = Engine::from_profile(&profile()).unwrap();
        assert!(run_reader(input.as_bytes(), &mut engine, false).is_err());
    }
}
