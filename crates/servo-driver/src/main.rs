//! Headless driver: runs a scripted session against a world.
//!
//! Usage: `servo-driver [session.json]`. Without a session file the default
//! session runs on an empty world.

mod telemetry;

use anyhow::{Context, Result};
use serde::Serialize;
use servo_core::{SessionConfig, TileEdit};
use servo_world::{NetworkSummary, World};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Final state printed to stdout when the session ends
#[derive(Debug, Serialize)]
struct SessionSummary {
    frames: u64,
    ticks: u64,
    conversions: usize,
    light_updates: usize,
    networks: Vec<NetworkSummary>,
}

fn main() -> Result<()> {
    telemetry::init_telemetry()?;

    let session = match std::env::args().nth(1) {
        Some(path) => SessionConfig::from_path(&path)
            .with_context(|| format!("failed to load session from {path}"))?,
        None => {
            info!("No session file given, running the default session");
            SessionConfig::default()
        }
    };

    let summary = run_session(&session)?;
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

fn run_session(session: &SessionConfig) -> Result<SessionSummary> {
    let mut world = World::new(session.world.clone()).context("invalid world configuration")?;

    let mut edits: Vec<TileEdit> = session.edits.clone();
    edits.sort_by_key(|edit| edit.frame);
    let mut edits = edits.into_iter().peekable();

    let frame_duration = session.frame_duration();
    let started = Instant::now();
    let mut conversions = 0;
    let mut light_updates = 0;

    info!(
        frames = session.frames,
        frame_ms = session.frame_ms,
        edits = session.edits.len(),
        "Starting session"
    );

    for frame in 0..session.frames {
        while let Some(edit) = edits.next_if(|edit| edit.frame == frame) {
            if world.set_tile(edit.position(), edit.tile) {
                debug!(frame, pos = %edit.position(), tile = %edit.tile, "Applied edit");
            } else {
                warn!(frame, pos = %edit.position(), "Edit outside the world ignored");
            }
        }

        let report = world.frame(frame_duration);
        conversions += report.ticks.conversions;
        light_updates += report.lighting.updated;

        if report.ticks.ticks > 0 {
            info!(
                frame,
                ticks = report.ticks.ticks,
                conversions = report.ticks.conversions,
                networks = world.ducts().len(),
                "Network tick"
            );
        }
    }

    info!(
        ticks = world.tick_count(),
        conversions,
        light_updates,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Session complete"
    );

    Ok(SessionSummary {
        frames: session.frames,
        ticks: world.tick_count(),
        conversions,
        light_updates,
        networks: world.networks(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use servo_core::Position;

    #[test]
    fn test_scripted_session_converts_dirt() {
        let json = r#"{
            "world": { "width": 8, "height": 4, "duct_tick_interval_ms": 100 },
            "frames": 20,
            "frame_ms": 16,
            "edits": [
                { "frame": 2, "x": 2, "y": 2, "tile": "Dirt" },
                { "frame": 0, "x": 1, "y": 1, "tile": "ItemDuct" },
                { "frame": 0, "x": 2, "y": 1, "tile": "ItemDuct" },
                { "frame": 5, "x": 9, "y": 9, "tile": "Miner" }
            ]
        }"#;
        let session = SessionConfig::from_json_str(json).unwrap();

        let summary = run_session(&session).unwrap();

        // 20 frames of 16ms is 320ms: three ticks of 100ms
        assert_eq!(summary.ticks, 3);
        assert_eq!(summary.conversions, 1);
        assert_eq!(summary.networks.len(), 1);
        assert_eq!(
            summary.networks[0].members,
            vec![Position::new(1, 1), Position::new(2, 1)]
        );
    }

    #[test]
    fn test_edits_in_same_frame_keep_file_order() {
        let json = r#"{
            "world": { "width": 3, "height": 3 },
            "frames": 1,
            "edits": [
                { "frame": 0, "x": 1, "y": 1, "tile": "ItemDuct" },
                { "frame": 0, "x": 1, "y": 1, "tile": "Grass" }
            ]
        }"#;
        let session = SessionConfig::from_json_str(json).unwrap();

        let summary = run_session(&session).unwrap();
        assert!(summary.networks.is_empty());
        assert_eq!(summary.ticks, 0);
        assert!(summary.light_updates > 0);
    }

    #[test]
    fn test_demo_session_runs() {
        let session =
            SessionConfig::from_json_str(include_str!("../../../demos/session.json")).unwrap();

        let summary = run_session(&session).unwrap();
        assert_eq!(summary.ticks, 4);
        assert!(!summary.networks.is_empty());
    }
}
