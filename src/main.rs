use anyhow::{Context, Result};
use std::time::Duration;

use rep_tracker::clock::ManualClock;
use rep_tracker::config::Config;
use rep_tracker::pose::{PoseSource, ScriptedSource};
use rep_tracker::tracker::{FrameOutcome, RepTracker, Stage};

const CONFIG_PATH: &str = "config.toml";

fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();
    let Some(recording_path) = args.get(1) else {
        let program = args.first().map(String::as_str).unwrap_or("rep-tracker");
        eprintln!("usage: {} <recording.json> [config.toml]", program);
        std::process::exit(2);
    };
    let config = match args.get(2) {
        Some(path) => Config::load(path)?,
        None => Config::load_or_default(CONFIG_PATH),
    };
    rep_tracker::init_tracing(&config.app.log_level);

    println!("=== Rep Tracker {} - replay ===", rep_tracker::GIT_VERSION);
    println!(
        "Thresholds: up > {}°, down < {}°, min confidence {}",
        config.counter.up_threshold, config.counter.down_threshold, config.counter.min_confidence
    );
    println!("Angle smoothing: {}", if config.smooth.enabled { "ON" } else { "OFF" });

    let source = ScriptedSource::load_recording(recording_path)?;
    println!("Frames: {}", source.remaining());
    println!();

    // セッション時間は記録のタイムスタンプに従う
    let clock = ManualClock::new();
    let mut tracker = RepTracker::with_clock(source, &config, clock.clone());
    tracker.start().context("Failed to start tracking")?;

    let mut origin_us: Option<u64> = None;
    let mut no_signal = 0u32;
    let mut last_stage = Stage::Unknown;

    while let Some(frame) = tracker.source_mut().next_frame() {
        let origin = *origin_us.get_or_insert(frame.timestamp_us);
        clock.set(Duration::from_micros(frame.timestamp_us.saturating_sub(origin)));

        let result = tracker.process_frame(&frame);
        if result.outcome == FrameOutcome::NoSignal {
            no_signal += 1;
            continue;
        }
        if result.counted_this_frame || result.stage != last_stage {
            println!("{}", tracker.telemetry());
            last_stage = result.stage;
        }
    }

    let summary = tracker.stop();
    println!();
    if no_signal > 0 {
        println!("Frames without signal: {}", no_signal);
    }
    println!("Summary: {}", summary);
    Ok(())
}
