//! End-to-end record/playback example.
//!
//! Demonstrates: new game → record a few frames → clear → list replays →
//! play the log back into a fresh queue → report what was injected.

use genrep_core::{Command, GameMode};
use genrep_replay::{GameSetup, Recorder, RecorderConfig};
use genrep_test_utils::fixtures::{attack_command, clear_game_data, crc_command, move_command};
use genrep_test_utils::MockHost;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== genrep record/replay example ===\n");

    let dir = tempfile::tempdir()?;
    let config = RecorderConfig::with_user_data_dir(dir.path());
    let mut recorder = Recorder::new(config, MockHost::new())?;

    // --- Record ---
    let script: Vec<(u32, Vec<Command>)> = vec![
        (0, vec![GameSetup::new(GameMode::Skirmish).to_command(0)]),
        (3, vec![move_command(0, 17)]),
        (8, vec![attack_command(1, 4, 9)]),
        (100, vec![crc_command(0, 0xC0FF_EE00)]),
        (120, vec![clear_game_data()]),
    ];
    for (frame, mut queue) in script {
        let report = recorder.update(frame, &mut queue)?;
        println!(
            "  frame {frame:>3}: recorded {} (started={}, stopped={})",
            report.recorded, report.recording_started, report.recording_stopped
        );
    }

    for listing in recorder.list_replays()? {
        println!(
            "\nFound {} ({} frames, slot config '{}')",
            listing.file_name, listing.header.frame_count, listing.header.slot_config
        );
    }

    // --- Play back ---
    let start = recorder.start_playback(recorder.config().last_replay_file_name())?;
    println!(
        "\nPlayback: mode {:?}, seed {:#x}, crc interval {}",
        start.setup.mode(),
        start.seed,
        recorder.crc_interval()
    );

    for frame in 0.. {
        let mut queue: Vec<Command> = Vec::new();
        let report = recorder.update(frame, &mut queue)?;
        for command in &queue {
            println!(
                "  frame {frame:>3}: {} from player {} ({} args)",
                command.command_type,
                command.player_index,
                command.args.len()
            );
        }
        if report.playback_finished {
            println!("  frame {frame:>3}: end of replay");
            break;
        }
    }

    println!("\nMismatch seen: {}", recorder.crc_tracker().saw_mismatch());
    Ok(())
}
