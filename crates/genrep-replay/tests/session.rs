//! End-to-end record/playback sessions through the recorder.
//!
//! Each test: record a session into a temporary user-data directory by
//! feeding per-frame command queues to a `Recorder` → play the log back
//! through a fresh `Recorder` → check what was injected on each frame.

use std::fs;
use std::path::Path;

use genrep_core::{Command, CommandQueue, CommandType, GameMode, SlotState};
use genrep_replay::{
    CommandLogReader, CommandLogWriter, CrcCheck, GameSetup, Recorder, RecorderConfig,
    ReplayError, ReplayHeader, SessionMode,
};
use genrep_test_utils::fixtures::{
    attack_command, build_command, clear_game_data, crc_command, move_command, ATTACK, MOVE,
    UI_ONLY,
};
use genrep_test_utils::MockHost;

// ── Helpers ─────────────────────────────────────────────────────

const LAST_REPLAY: &str = "00000000.rep";

fn config(dir: &Path) -> RecorderConfig {
    RecorderConfig::with_user_data_dir(dir)
}

fn new_game() -> Command {
    GameSetup {
        max_fps: 30,
        rank_points: 12,
        ..GameSetup::new(GameMode::Skirmish)
    }
    .to_command(0)
}

/// Record `frames` (frame, queue contents) and return the recorder.
fn record(dir: &Path, frames: Vec<(u32, Vec<Command>)>) -> Recorder {
    let mut recorder = Recorder::new(config(dir), MockHost::new()).unwrap();
    for (frame, mut queue) in frames {
        recorder.update(frame, &mut queue).unwrap();
    }
    assert_eq!(recorder.mode(), SessionMode::Idle);
    recorder
}

/// The basic session: a move on frame 0, an attack on frame 5, cleared on frame 9.
fn basic_session(dir: &Path) -> Recorder {
    record(
        dir,
        vec![
            (0, vec![new_game(), move_command(0, 1)]),
            (5, vec![attack_command(1, 2, 3)]),
            (9, vec![clear_game_data()]),
        ],
    )
}

/// Play frames `0..=last`, returning the commands injected on each frame.
fn play(recorder: &mut Recorder, last: u32) -> Vec<(u32, Vec<Command>)> {
    let mut injected = Vec::new();
    for frame in 0..=last {
        let mut queue: Vec<Command> = Vec::new();
        let report = recorder.update(frame, &mut queue).unwrap();
        assert_eq!(report.injected, queue.len());
        if !queue.is_empty() {
            injected.push((frame, queue));
        }
        if report.playback_finished {
            break;
        }
    }
    injected
}

fn write_raw(dir: &Path, name: &str, header: &ReplayHeader, records: &[(u32, Command)]) {
    let replay_dir = config(dir).replay_dir();
    fs::create_dir_all(&replay_dir).unwrap();
    let file = fs::File::create(replay_dir.join(name)).unwrap();
    let mut writer = CommandLogWriter::create(file, header).unwrap();
    for (frame, cmd) in records {
        writer.write_record(*frame, cmd).unwrap();
    }
    writer.finish(0, 0).unwrap();
}

fn valid_header() -> ReplayHeader {
    ReplayHeader {
        slot_config: "M=maps/x;SD=1;C=50;S=H:Alice,C;".into(),
        local_player_index: 0,
        ..ReplayHeader::default()
    }
}

// ── Round trip ──────────────────────────────────────────────────

#[test]
fn basic_session_records_in_order() {
    let dir = tempfile::tempdir().unwrap();
    basic_session(dir.path());

    let path = config(dir.path()).last_replay_path();
    let reader = CommandLogReader::open_file(&path).unwrap();
    assert_eq!(reader.header().frame_count, 9);
    assert_eq!(reader.header().original_game_mode, GameMode::Skirmish.raw());
    assert_eq!(reader.header().max_fps, 30);
    assert_eq!(reader.header().rank_points, 12);

    let records: Vec<_> = reader.records().collect::<Result<_, _>>().unwrap();
    let summary: Vec<_> = records
        .iter()
        .map(|r| (r.frame, r.command.command_type, r.command.player_index))
        .collect();
    assert_eq!(
        summary,
        vec![
            (0, MOVE, 0),
            (5, ATTACK, 1),
            (9, CommandType::CLEAR_GAME_DATA, -1),
        ]
    );
    assert_eq!(records[0].command, move_command(0, 1));
    assert_eq!(records[1].command, attack_command(1, 2, 3));
}

#[test]
fn basic_session_plays_back_on_recorded_frames() {
    let dir = tempfile::tempdir().unwrap();
    let mut recorder = basic_session(dir.path());

    let start = recorder.start_playback(LAST_REPLAY).unwrap();
    assert_eq!(recorder.mode(), SessionMode::Playing { dry_run: false });
    assert_eq!(start.setup.mode(), Some(GameMode::Replay));
    assert_eq!(start.setup.max_fps, 30);
    assert_eq!(start.seed, 0x5EED);
    assert_eq!(start.layout.slots[0], SlotState::Human { name: "Alice".into() });
    assert!(start.version_differences.is_empty());
    assert_eq!(recorder.crc_interval(), 100);
    assert!(recorder
        .current_replay_filename()
        .is_some_and(|p| p.ends_with(LAST_REPLAY)));

    let injected = play(&mut recorder, 20);
    assert_eq!(
        injected,
        vec![
            (0, vec![move_command(0, 1)]),
            (5, vec![attack_command(1, 2, 3)]),
        ]
    );
    assert_eq!(recorder.mode(), SessionMode::Idle);
    assert_eq!(recorder.current_replay_filename(), None);
}

#[test]
fn every_argument_kind_survives_playback() {
    let dir = tempfile::tempdir().unwrap();
    let mut recorder = record(
        dir.path(),
        vec![
            (0, vec![new_game()]),
            (3, vec![build_command(1), move_command(0, -5)]),
            (4, vec![clear_game_data()]),
        ],
    );
    recorder.start_playback(LAST_REPLAY).unwrap();
    let injected = play(&mut recorder, 4);
    assert_eq!(injected.len(), 1);
    let (frame, commands) = &injected[0];
    assert_eq!(*frame, 3);
    assert!(commands[0].bit_eq(&build_command(1)));
    assert_eq!(commands[1], move_command(0, -5));
}

#[test]
fn non_network_commands_are_not_recorded() {
    let dir = tempfile::tempdir().unwrap();
    record(
        dir.path(),
        vec![
            (0, vec![new_game(), Command::new(UI_ONLY, 0)]),
            (1, vec![move_command(0, 1), Command::new(UI_ONLY, 0)]),
            (2, vec![clear_game_data()]),
        ],
    );
    let reader = CommandLogReader::open_file(&config(dir.path()).last_replay_path()).unwrap();
    let types: Vec<_> = reader
        .records()
        .map(|r| r.unwrap().command.command_type)
        .collect();
    assert_eq!(types, vec![MOVE, CommandType::CLEAR_GAME_DATA]);
}

#[test]
fn new_game_while_recording_starts_a_fresh_log() {
    let dir = tempfile::tempdir().unwrap();
    let mut recorder = Recorder::new(config(dir.path()), MockHost::new()).unwrap();
    let mut queue = vec![new_game(), move_command(0, 1)];
    recorder.update(0, &mut queue).unwrap();

    let mut queue = vec![new_game()];
    let report = recorder.update(7, &mut queue).unwrap();
    assert!(report.recording_stopped);
    assert!(report.recording_started);
    assert_eq!(recorder.mode(), SessionMode::Recording);

    let mut queue = vec![clear_game_data()];
    recorder.update(8, &mut queue).unwrap();
    let header = recorder.read_header_only(LAST_REPLAY).unwrap();
    assert_eq!(header.frame_count, 8);
    let reader = CommandLogReader::open_file(&config(dir.path()).last_replay_path()).unwrap();
    assert_eq!(reader.records().count(), 1);
}

// ── Consistency checks ──────────────────────────────────────────

#[test]
fn desync_is_reported_once() {
    let dir = tempfile::tempdir().unwrap();
    let mut recorder = record(
        dir.path(),
        vec![
            (0, vec![new_game()]),
            (100, vec![crc_command(0, 0x1111)]),
            (200, vec![crc_command(0, 0x2222)]),
            (300, vec![clear_game_data()]),
        ],
    );
    recorder.start_playback(LAST_REPLAY).unwrap();

    for frame in 0..=300 {
        let mut queue: Vec<Command> = Vec::new();
        recorder.update(frame, &mut queue).unwrap();
        match frame {
            100 => {
                assert_eq!(queue, vec![crc_command(0, 0x1111)]);
                assert_eq!(recorder.crc_tracker().pending(), 1);
                assert_eq!(recorder.handle_crc_sample(0x1111, 0, false), CrcCheck::Matched);
                assert!(!recorder.crc_tracker().saw_mismatch());
            }
            200 => {
                assert_eq!(
                    recorder.handle_crc_sample(0x3333, 0, false),
                    CrcCheck::Mismatch {
                        expected: 0x2222,
                        actual: 0x3333,
                        frame: 200
                    }
                );
                assert!(recorder.crc_tracker().saw_mismatch());
            }
            _ => {}
        }
    }
    assert_eq!(recorder.mode(), SessionMode::Idle);
}

#[test]
fn crc_samples_from_other_players_are_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let mut recorder = basic_session(dir.path());
    recorder.start_playback(LAST_REPLAY).unwrap();
    assert_eq!(recorder.handle_crc_sample(1, 1, false), CrcCheck::Skipped);
    assert!(!recorder.crc_tracker().saw_mismatch());
}

#[test]
fn live_crc_samples_outside_playback_are_ignored() {
    let dir = tempfile::tempdir().unwrap();
    let mut recorder = Recorder::new(config(dir.path()), MockHost::new()).unwrap();
    assert_eq!(recorder.handle_crc_sample(0xABCD, 0, false), CrcCheck::Ignored);

    recorder.update(0, &mut vec![new_game()]).unwrap();
    recorder.update(100, &mut Vec::new()).unwrap();
    assert_eq!(recorder.mode(), SessionMode::Recording);
    assert_eq!(recorder.handle_crc_sample(0xABCD, 0, false), CrcCheck::Ignored);
    assert!(!recorder.crc_tracker().saw_mismatch());
    assert_eq!(recorder.crc_tracker().pending(), 0);
}

#[test]
fn injected_crc_reported_back_is_queued_once() {
    let dir = tempfile::tempdir().unwrap();
    let mut recorder = record(
        dir.path(),
        vec![
            (0, vec![new_game()]),
            (100, vec![crc_command(0, 0x1111)]),
            (200, vec![crc_command(0, 0x2222)]),
            (300, vec![clear_game_data()]),
        ],
    );
    recorder.start_playback(LAST_REPLAY).unwrap();

    for frame in 0..=200 {
        let mut queue: Vec<Command> = Vec::new();
        recorder.update(frame, &mut queue).unwrap();
        for command in &queue {
            if command.command_type == CommandType::LOGIC_CRC {
                let value = command.integer_arg(0).unwrap() as u32;
                assert_eq!(recorder.handle_crc_sample(value, 0, true), CrcCheck::Ignored);
                assert_eq!(recorder.crc_tracker().pending(), 1);
                assert_eq!(recorder.handle_crc_sample(value, 0, false), CrcCheck::Matched);
            }
        }
    }
    assert_eq!(recorder.crc_tracker().pending(), 0);
    assert!(!recorder.crc_tracker().saw_mismatch());
}

// ── Culling ─────────────────────────────────────────────────────

#[test]
fn local_input_is_culled_during_playback() {
    let dir = tempfile::tempdir().unwrap();
    let mut recorder = basic_session(dir.path());
    recorder.start_playback(LAST_REPLAY).unwrap();

    let mut queue = vec![
        move_command(0, 99),
        crc_command(0, 0xABCD),
        Command::new(UI_ONLY, 0),
    ];
    let report = recorder.update(1, &mut queue).unwrap();
    assert_eq!(report.culled, 1);
    assert_eq!(report.injected, 0);
    let kept: Vec<_> = queue.commands().iter().map(|c| c.command_type).collect();
    assert_eq!(kept, vec![CommandType::LOGIC_CRC, UI_ONLY]);

    let mut queue = vec![move_command(0, 42)];
    assert_eq!(recorder.stop_playback(&mut queue), 1);
    assert!(queue.is_empty());
    assert_eq!(recorder.mode(), SessionMode::Idle);
}

// ── Analysis ────────────────────────────────────────────────────

#[test]
fn analysis_decodes_without_injecting() {
    let dir = tempfile::tempdir().unwrap();
    let mut recorder = basic_session(dir.path());
    recorder.start_analysis(LAST_REPLAY).unwrap();
    assert!(recorder.is_analysis_in_progress());

    let mut queue = vec![move_command(0, 99)];
    let mut decoded = Vec::new();
    for _ in 0..10 {
        let report = recorder.update(0, &mut queue).unwrap();
        assert_eq!(report.injected, 0);
        assert_eq!(report.culled, 0);
        decoded.push(report.decoded);
        if report.playback_finished {
            break;
        }
    }
    assert_eq!(decoded, vec![1, 1, 1]);
    assert_eq!(queue, vec![move_command(0, 99)]);
    assert!(!recorder.is_analysis_in_progress());
    assert_eq!(recorder.mode(), SessionMode::Idle);
}

// ── Rejection ───────────────────────────────────────────────────

#[test]
fn bogus_magic_fails_and_stays_idle() {
    let dir = tempfile::tempdir().unwrap();
    let mut recorder = basic_session(dir.path());
    let path = config(dir.path()).replay_dir().join("bogus.rep");
    fs::write(&path, b"BOGUS!\0\0\0\0\0\0\0\0\0\0\0\0\0\0\0\0\0\0\0\0\0\0").unwrap();

    let err = recorder.start_playback("bogus.rep").unwrap_err();
    assert!(err.is_format_error());
    assert!(matches!(err, ReplayError::InvalidMagic { found } if &found == b"BOGUS!"));
    assert_eq!(recorder.mode(), SessionMode::Idle);
}

#[test]
fn missing_file_fails_and_stays_idle() {
    let dir = tempfile::tempdir().unwrap();
    let mut recorder = Recorder::new(config(dir.path()), MockHost::new()).unwrap();
    let err = recorder.start_playback("absent.rep").unwrap_err();
    assert!(matches!(err, ReplayError::OpenFailed { .. }));
    assert_eq!(recorder.mode(), SessionMode::Idle);
}

#[test]
fn out_of_range_local_slot_fails_and_stays_idle() {
    let dir = tempfile::tempdir().unwrap();
    let header = ReplayHeader {
        local_player_index: 8,
        ..valid_header()
    };
    write_raw(dir.path(), "slot.rep", &header, &[(0, move_command(0, 1))]);
    let mut recorder = Recorder::new(config(dir.path()), MockHost::new()).unwrap();
    let err = recorder.start_playback("slot.rep").unwrap_err();
    assert!(matches!(err, ReplayError::InvalidLocalSlot { index: 8 }));
    assert_eq!(recorder.mode(), SessionMode::Idle);
}

#[test]
fn unparsable_slot_config_fails_and_stays_idle() {
    let dir = tempfile::tempdir().unwrap();
    let header = ReplayHeader {
        slot_config: "not a layout".into(),
        ..valid_header()
    };
    write_raw(dir.path(), "layout.rep", &header, &[]);
    let mut recorder = Recorder::new(config(dir.path()), MockHost::new()).unwrap();
    let err = recorder.start_playback("layout.rep").unwrap_err();
    assert!(matches!(err, ReplayError::InvalidSlotConfig(_)));
    assert_eq!(recorder.mode(), SessionMode::Idle);
}

#[test]
fn unknown_argument_kind_stops_playback() {
    let dir = tempfile::tempdir().unwrap();
    write_raw(dir.path(), "kind.rep", &valid_header(), &[(0, move_command(0, 1))]);
    let path = config(dir.path()).replay_dir().join("kind.rep");
    let mut bytes = fs::read(&path).unwrap();
    // Last record: ... [runs=1] [kind] [count=1] [i32]
    let kind_at = bytes.len() - 4 - 2;
    bytes[kind_at] = 0xEE;
    fs::write(&path, bytes).unwrap();

    let mut recorder = Recorder::new(config(dir.path()), MockHost::new()).unwrap();
    recorder.start_playback("kind.rep").unwrap();
    let mut queue: Vec<Command> = Vec::new();
    let err = recorder.update(0, &mut queue).unwrap_err();
    assert!(matches!(err, ReplayError::UnknownArgumentKind { tag: 0xEE }));
    assert_eq!(recorder.mode(), SessionMode::Idle);
}

// ── Truncation ──────────────────────────────────────────────────

#[test]
fn truncated_replays_never_panic() {
    let dir = tempfile::tempdir().unwrap();
    basic_session(dir.path());
    let full = fs::read(config(dir.path()).last_replay_path()).unwrap();

    for len in 0..full.len() {
        let name = format!("cut_{len}.rep");
        fs::write(config(dir.path()).replay_dir().join(&name), &full[..len]).unwrap();

        let mut recorder = Recorder::new(config(dir.path()), MockHost::new()).unwrap();
        match recorder.start_playback(&name) {
            Ok(_) => {
                let injected = play(&mut recorder, 20);
                let count: usize = injected.iter().map(|(_, q)| q.len()).sum();
                assert!(count <= 2, "prefix of {len} bytes injected {count} commands");
                assert_eq!(recorder.mode(), SessionMode::Idle);
            }
            Err(e) => {
                assert!(e.is_format_error(), "prefix of {len} bytes failed with {e}");
                assert_eq!(recorder.mode(), SessionMode::Idle);
            }
        }
    }
}

// ── Listing and versions ────────────────────────────────────────

#[test]
fn list_replays_skips_unreadable_files() {
    let dir = tempfile::tempdir().unwrap();
    let recorder = basic_session(dir.path());
    let replay_dir = config(dir.path()).replay_dir();
    fs::write(replay_dir.join("junk.rep"), b"nope").unwrap();
    fs::write(replay_dir.join("notes.txt"), b"hello").unwrap();
    write_raw(dir.path(), "older.rep", &valid_header(), &[]);

    let listings = recorder.list_replays().unwrap();
    let names: Vec<_> = listings.iter().map(|l| l.file_name.as_str()).collect();
    assert_eq!(names, vec![LAST_REPLAY, "older.rep"]);
    assert_eq!(listings[0].header.frame_count, 9);
}

#[test]
fn list_replays_without_directory_is_empty() {
    let dir = tempfile::tempdir().unwrap();
    let recorder = Recorder::new(config(dir.path()), MockHost::new()).unwrap();
    assert!(recorder.list_replays().unwrap().is_empty());
}

#[test]
fn version_differences_are_reported_not_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let recorder = basic_session(dir.path());
    assert!(!recorder.version_differs(LAST_REPLAY).unwrap());

    let mut newer = config(dir.path());
    newer.build.version_string = "1.1".into();
    newer.build.exe_checksum = 0xFEED;
    let mut recorder = Recorder::new(newer, MockHost::new()).unwrap();
    assert!(recorder.version_differs(LAST_REPLAY).unwrap());

    let start = recorder.start_playback(LAST_REPLAY).unwrap();
    assert_eq!(start.version_differences.len(), 2);
    assert_eq!(play(&mut recorder, 9).len(), 2);
}

#[test]
fn playback_of_recorded_layout_is_multiplayer() {
    let dir = tempfile::tempdir().unwrap();
    basic_session(dir.path());
    let mut recorder = Recorder::new(config(dir.path()), MockHost::single_player()).unwrap();
    assert!(!recorder.is_multiplayer());
    recorder.start_playback(LAST_REPLAY).unwrap();
    assert!(recorder.is_multiplayer());
}
