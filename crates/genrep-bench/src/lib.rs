//! Benchmark profiles and utilities for the genrep command log.
//!
//! Provides synthetic sessions for benchmarking and examples:
//!
//! - [`session_profile`]: a deterministic stream of frame-stamped commands
//! - [`encode_session`]: the same stream written to an in-memory log

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use std::io::Cursor;

use genrep_core::{ArgValue, Command, CommandType, Coord3, ObjectId, TeamId};
use genrep_replay::{CommandLogWriter, ReplayError, ReplayHeader};

/// Frames between checksum commands in [`session_profile`].
pub const CRC_INTERVAL: u32 = 100;

/// Build a deterministic session of `frames` frames.
///
/// Each frame carries `commands_per_frame` commands mixing a group move
/// (a run of object IDs plus a location), a targeted attack, and every
/// [`CRC_INTERVAL`] frames a checksum command. The mix is derived from
/// `seed` so runs are reproducible.
pub fn session_profile(frames: u32, commands_per_frame: usize, seed: u64) -> Vec<(u32, Command)> {
    let mut records = Vec::with_capacity(frames as usize * commands_per_frame);
    let mut state = seed;
    for frame in 0..frames {
        for i in 0..commands_per_frame {
            state = mix(state, i as u64);
            let player = (state % 4) as i32;
            let command = if state % 3 == 0 {
                attack(player, state)
            } else {
                group_move(player, state)
            };
            records.push((frame, command));
        }
        if frame % CRC_INTERVAL == 0 {
            let crc = (mix(state, u64::from(frame)) >> 32) as i32;
            let command = Command::new(CommandType::LOGIC_CRC, 0)
                .with_arg(ArgValue::Integer(crc))
                .with_arg(ArgValue::Boolean(false));
            records.push((frame, command));
        }
    }
    records
}

/// Write `records` after `header` into an in-memory log.
pub fn encode_session(
    header: &ReplayHeader,
    records: &[(u32, Command)],
) -> Result<Vec<u8>, ReplayError> {
    let mut writer = CommandLogWriter::create(Cursor::new(Vec::new()), header)?;
    for (frame, command) in records {
        writer.write_record(*frame, command)?;
    }
    let frame_count = records.last().map_or(0, |(frame, _)| *frame);
    Ok(writer.finish(0, frame_count)?.into_inner())
}

fn mix(state: u64, salt: u64) -> u64 {
    state
        .wrapping_mul(6364136223846793005)
        .wrapping_add(salt.wrapping_mul(1442695040888963407) | 1)
}

fn group_move(player: i32, state: u64) -> Command {
    let units = 1 + (state >> 8) % 12;
    let mut command = Command::new(CommandType(1068), player);
    for unit in 0..units {
        command.push_arg(ArgValue::ObjectId(ObjectId((state >> 16) as u32 ^ unit as u32)));
    }
    let x = ((state >> 20) % 4096) as f32;
    let y = ((state >> 32) % 4096) as f32;
    command.with_arg(ArgValue::Location(Coord3::new(x, y, 0.0)))
}

fn attack(player: i32, state: u64) -> Command {
    Command::new(CommandType(1071), player)
        .with_arg(ArgValue::ObjectId(ObjectId((state >> 24) as u32)))
        .with_arg(ArgValue::ObjectId(ObjectId((state >> 40) as u32)))
        .with_arg(ArgValue::TeamId(TeamId(player as u32)))
        .with_arg(ArgValue::Boolean(state & 1 == 1))
}
