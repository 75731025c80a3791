//! Binary encode/decode for the replay format.
//!
//! All integers are little-endian. Wide strings are nul-terminated UTF-16LE,
//! narrow strings are nul-terminated UTF-8. The header has a fixed-offset
//! prefix (see [`START_TIME_OFFSET`] and friends) so that trailing session
//! statistics can be patched in place. After the header the file is a flat
//! sequence of command records until EOF:
//!
//! ```text
//! [frame u32] [type u32] [player i32] [runs u8] ([kind u8] [count u8])* [values]*
//! ```

use std::io::{self, Read, Write};

use genrep_core::{
    ArgKind, ArgList, ArgValue, Command, CommandType, Coord3, DrawableId, ICoord2, IRegion2,
    ObjectId, TeamId, MAX_SLOTS,
};

use crate::error::ReplayError;
use crate::types::{ArgRun, CommandRecord, ReplayHeader, SystemTimeStamp};
use crate::MAGIC;

// ── Fixed header offsets ────────────────────────────────────────

/// Offset of the session start time.
pub const START_TIME_OFFSET: u64 = MAGIC.len() as u64;
/// Offset of the session end time.
pub const END_TIME_OFFSET: u64 = START_TIME_OFFSET + 4;
/// Offset of the frame count.
pub const FRAME_COUNT_OFFSET: u64 = END_TIME_OFFSET + 4;
/// Offset of the desync flag.
pub const DESYNC_OFFSET: u64 = FRAME_COUNT_OFFSET + 4;
/// Offset of the quit-early flag.
pub const QUIT_EARLY_OFFSET: u64 = DESYNC_OFFSET + 1;
/// Offset of the first per-slot disconnect flag.
pub const DISCONNECT_OFFSET: u64 = QUIT_EARLY_OFFSET + 1;
/// Size of the patchable prefix, magic included.
pub const FIXED_PREFIX_LEN: u64 = DISCONNECT_OFFSET + MAX_SLOTS as u64;

/// Longest string (in code units, terminator included) the reader accepts.
pub const MAX_STRING_UNITS: usize = 1024;

/// Longest run a single descriptor can express.
const MAX_RUN_LEN: usize = u8::MAX as usize;
/// Most runs a single record can carry.
const MAX_RUNS: usize = u8::MAX as usize;

// ── Primitive writers ───────────────────────────────────────────

/// Write a single byte.
pub fn write_u8(w: &mut dyn Write, v: u8) -> Result<(), ReplayError> {
    w.write_all(&[v])?;
    Ok(())
}

/// Write a boolean as one byte (`0` or `1`).
pub fn write_bool(w: &mut dyn Write, v: bool) -> Result<(), ReplayError> {
    write_u8(w, u8::from(v))
}

/// Write a little-endian u16.
pub fn write_u16_le(w: &mut dyn Write, v: u16) -> Result<(), ReplayError> {
    w.write_all(&v.to_le_bytes())?;
    Ok(())
}

/// Write a little-endian u32.
pub fn write_u32_le(w: &mut dyn Write, v: u32) -> Result<(), ReplayError> {
    w.write_all(&v.to_le_bytes())?;
    Ok(())
}

/// Write a little-endian i32.
pub fn write_i32_le(w: &mut dyn Write, v: i32) -> Result<(), ReplayError> {
    w.write_all(&v.to_le_bytes())?;
    Ok(())
}

/// Write a little-endian f32.
pub fn write_f32_le(w: &mut dyn Write, v: f32) -> Result<(), ReplayError> {
    w.write_all(&v.to_le_bytes())?;
    Ok(())
}

/// Write a nul-terminated UTF-16LE string.
pub fn write_wide_str(w: &mut dyn Write, s: &str) -> Result<(), ReplayError> {
    let units = s.encode_utf16().count();
    if units >= MAX_STRING_UNITS {
        return Err(ReplayError::MalformedHeader {
            detail: format!("wide string of {units} units exceeds {MAX_STRING_UNITS}"),
        });
    }
    for unit in s.encode_utf16() {
        write_u16_le(w, unit)?;
    }
    write_u16_le(w, 0)
}

/// Write a nul-terminated UTF-8 string.
pub fn write_narrow_str(w: &mut dyn Write, s: &str) -> Result<(), ReplayError> {
    if s.len() >= MAX_STRING_UNITS {
        return Err(ReplayError::MalformedHeader {
            detail: format!("string of {} bytes exceeds {MAX_STRING_UNITS}", s.len()),
        });
    }
    w.write_all(s.as_bytes())?;
    write_u8(w, 0)
}

// ── Primitive readers ───────────────────────────────────────────

/// Read exactly `N` bytes, reporting a short read as [`ReplayError::Truncated`].
fn read_array<const N: usize>(r: &mut dyn Read, what: &str) -> Result<[u8; N], ReplayError> {
    let mut buf = [0u8; N];
    r.read_exact(&mut buf).map_err(|e| truncation(e, what))?;
    Ok(buf)
}

fn truncation(e: io::Error, what: &str) -> ReplayError {
    if e.kind() == io::ErrorKind::UnexpectedEof {
        ReplayError::Truncated {
            detail: format!("end of stream while reading {what}"),
        }
    } else {
        ReplayError::Io(e)
    }
}

/// Read a single byte.
pub fn read_u8(r: &mut dyn Read) -> Result<u8, ReplayError> {
    Ok(read_array::<1>(r, "u8")?[0])
}

/// Read a one-byte boolean; any non-zero byte is `true`.
pub fn read_bool(r: &mut dyn Read) -> Result<bool, ReplayError> {
    Ok(read_u8(r)? != 0)
}

/// Read a little-endian u16.
pub fn read_u16_le(r: &mut dyn Read) -> Result<u16, ReplayError> {
    Ok(u16::from_le_bytes(read_array(r, "u16")?))
}

/// Read a little-endian u32.
pub fn read_u32_le(r: &mut dyn Read) -> Result<u32, ReplayError> {
    Ok(u32::from_le_bytes(read_array(r, "u32")?))
}

/// Read a little-endian i32.
pub fn read_i32_le(r: &mut dyn Read) -> Result<i32, ReplayError> {
    Ok(i32::from_le_bytes(read_array(r, "i32")?))
}

/// Read a little-endian f32.
pub fn read_f32_le(r: &mut dyn Read) -> Result<f32, ReplayError> {
    Ok(f32::from_le_bytes(read_array(r, "f32")?))
}

/// Read a nul-terminated UTF-16LE string.
pub fn read_wide_str(r: &mut dyn Read) -> Result<String, ReplayError> {
    let mut units = Vec::new();
    loop {
        let unit = read_u16_le(r)?;
        if unit == 0 {
            break;
        }
        units.push(unit);
        if units.len() >= MAX_STRING_UNITS {
            return Err(ReplayError::MalformedHeader {
                detail: format!("unterminated wide string after {MAX_STRING_UNITS} units"),
            });
        }
    }
    String::from_utf16(&units).map_err(|e| ReplayError::MalformedHeader {
        detail: format!("invalid UTF-16 string: {e}"),
    })
}

/// Read a nul-terminated UTF-8 string.
pub fn read_narrow_str(r: &mut dyn Read) -> Result<String, ReplayError> {
    let mut bytes = Vec::new();
    loop {
        let b = read_u8(r)?;
        if b == 0 {
            break;
        }
        bytes.push(b);
        if bytes.len() >= MAX_STRING_UNITS {
            return Err(ReplayError::MalformedHeader {
                detail: format!("unterminated string after {MAX_STRING_UNITS} bytes"),
            });
        }
    }
    String::from_utf8(bytes).map_err(|e| ReplayError::MalformedHeader {
        detail: format!("invalid UTF-8 string: {e}"),
    })
}

// ── Header encode/decode ────────────────────────────────────────

fn write_timestamp(w: &mut dyn Write, ts: &SystemTimeStamp) -> Result<(), ReplayError> {
    for v in [
        ts.year,
        ts.month,
        ts.day_of_week,
        ts.day,
        ts.hour,
        ts.minute,
        ts.second,
        ts.milliseconds,
    ] {
        write_u16_le(w, v)?;
    }
    Ok(())
}

fn read_timestamp(r: &mut dyn Read) -> Result<SystemTimeStamp, ReplayError> {
    Ok(SystemTimeStamp {
        year: read_u16_le(r)?,
        month: read_u16_le(r)?,
        day_of_week: read_u16_le(r)?,
        day: read_u16_le(r)?,
        hour: read_u16_le(r)?,
        minute: read_u16_le(r)?,
        second: read_u16_le(r)?,
        milliseconds: read_u16_le(r)?,
    })
}

/// Encode the full replay header, magic included.
///
/// Values are written as given; callers that want placeholders in the
/// patchable prefix pass [`ReplayHeader::with_placeholders`].
pub fn encode_header(w: &mut dyn Write, header: &ReplayHeader) -> Result<(), ReplayError> {
    w.write_all(&MAGIC)?;

    // Patchable prefix
    write_u32_le(w, header.start_time)?;
    write_u32_le(w, header.end_time)?;
    write_u32_le(w, header.frame_count)?;
    write_bool(w, header.desync)?;
    write_bool(w, header.quit_early)?;
    for &flag in &header.player_disconnects {
        write_bool(w, flag)?;
    }

    write_wide_str(w, &header.replay_name)?;
    write_timestamp(w, &header.created)?;

    // Build identity
    write_wide_str(w, &header.version_string)?;
    write_wide_str(w, &header.build_time)?;
    write_u32_le(w, header.version_number)?;
    write_u32_le(w, header.exe_checksum)?;
    write_u32_le(w, header.data_checksum)?;

    // Match setup
    write_narrow_str(w, &header.slot_config)?;
    write_narrow_str(w, &header.local_player_index.to_string())?;
    write_i32_le(w, header.difficulty)?;
    write_i32_le(w, header.original_game_mode)?;
    write_i32_le(w, header.rank_points)?;
    write_i32_le(w, header.max_fps)?;

    Ok(())
}

/// Decode the replay header, validating the magic tag.
pub fn decode_header(r: &mut dyn Read) -> Result<ReplayHeader, ReplayError> {
    let magic: [u8; 6] = read_array(r, "magic")?;
    if magic != MAGIC {
        return Err(ReplayError::InvalidMagic { found: magic });
    }

    let start_time = read_u32_le(r)?;
    let end_time = read_u32_le(r)?;
    let frame_count = read_u32_le(r)?;
    let desync = read_bool(r)?;
    let quit_early = read_bool(r)?;
    let mut player_disconnects = [false; MAX_SLOTS];
    for flag in &mut player_disconnects {
        *flag = read_bool(r)?;
    }

    let replay_name = read_wide_str(r)?;
    let created = read_timestamp(r)?;

    let version_string = read_wide_str(r)?;
    let build_time = read_wide_str(r)?;
    let version_number = read_u32_le(r)?;
    let exe_checksum = read_u32_le(r)?;
    let data_checksum = read_u32_le(r)?;

    let slot_config = read_narrow_str(r)?;
    let local_text = read_narrow_str(r)?;
    let local_player_index =
        local_text
            .trim()
            .parse::<i32>()
            .map_err(|_| ReplayError::MalformedHeader {
                detail: format!("local player index '{local_text}' is not a number"),
            })?;

    Ok(ReplayHeader {
        start_time,
        end_time,
        frame_count,
        desync,
        quit_early,
        player_disconnects,
        replay_name,
        created,
        version_string,
        build_time,
        version_number,
        exe_checksum,
        data_checksum,
        slot_config,
        local_player_index,
        difficulty: read_i32_le(r)?,
        original_game_mode: read_i32_le(r)?,
        rank_points: read_i32_le(r)?,
        max_fps: read_i32_le(r)?,
    })
}

// ── Argument codec ──────────────────────────────────────────────

/// Encoded width of one value of `kind`, in bytes.
pub fn wire_size(kind: ArgKind) -> usize {
    match kind {
        ArgKind::Boolean => 1,
        ArgKind::WideChar => 2,
        ArgKind::Integer
        | ArgKind::Real
        | ArgKind::ObjectId
        | ArgKind::DrawableId
        | ArgKind::TeamId
        | ArgKind::Timestamp => 4,
        ArgKind::Pixel => 8,
        ArgKind::Location => 12,
        ArgKind::PixelRegion => 16,
    }
}

/// Compute the run-length schema of an argument list.
///
/// Consecutive same-kind arguments collapse into one run; runs longer
/// than 255 values are split.
pub fn arg_schema(args: &[ArgValue]) -> Result<Vec<ArgRun>, ReplayError> {
    let mut runs: Vec<ArgRun> = Vec::new();
    for arg in args {
        let kind = arg.kind();
        match runs.last_mut() {
            Some(run) if run.kind == kind && usize::from(run.count) < MAX_RUN_LEN => {
                run.count += 1;
            }
            _ => runs.push(ArgRun { kind, count: 1 }),
        }
    }
    if runs.len() > MAX_RUNS {
        return Err(ReplayError::ArgumentOverflow { runs: runs.len() });
    }
    Ok(runs)
}

/// Write one value in its fixed-width encoding.
pub fn write_arg_value(w: &mut dyn Write, value: &ArgValue) -> Result<(), ReplayError> {
    match *value {
        ArgValue::Integer(v) => write_i32_le(w, v),
        ArgValue::Real(v) => write_f32_le(w, v),
        ArgValue::Boolean(v) => write_bool(w, v),
        ArgValue::ObjectId(id) => write_u32_le(w, id.0),
        ArgValue::DrawableId(id) => write_u32_le(w, id.0),
        ArgValue::TeamId(id) => write_u32_le(w, id.0),
        ArgValue::Location(c) => {
            write_f32_le(w, c.x)?;
            write_f32_le(w, c.y)?;
            write_f32_le(w, c.z)
        }
        ArgValue::Pixel(p) => {
            write_i32_le(w, p.x)?;
            write_i32_le(w, p.y)
        }
        ArgValue::PixelRegion(reg) => {
            write_i32_le(w, reg.lo.x)?;
            write_i32_le(w, reg.lo.y)?;
            write_i32_le(w, reg.hi.x)?;
            write_i32_le(w, reg.hi.y)
        }
        ArgValue::Timestamp(v) => write_u32_le(w, v),
        ArgValue::WideChar(v) => write_u16_le(w, v),
    }
}

/// Read one value of the given kind.
pub fn read_arg_value(r: &mut dyn Read, kind: ArgKind) -> Result<ArgValue, ReplayError> {
    Ok(match kind {
        ArgKind::Integer => ArgValue::Integer(read_i32_le(r)?),
        ArgKind::Real => ArgValue::Real(read_f32_le(r)?),
        ArgKind::Boolean => ArgValue::Boolean(read_bool(r)?),
        ArgKind::ObjectId => ArgValue::ObjectId(ObjectId(read_u32_le(r)?)),
        ArgKind::DrawableId => ArgValue::DrawableId(DrawableId(read_u32_le(r)?)),
        ArgKind::TeamId => ArgValue::TeamId(TeamId(read_u32_le(r)?)),
        ArgKind::Location => ArgValue::Location(Coord3 {
            x: read_f32_le(r)?,
            y: read_f32_le(r)?,
            z: read_f32_le(r)?,
        }),
        ArgKind::Pixel => ArgValue::Pixel(ICoord2 {
            x: read_i32_le(r)?,
            y: read_i32_le(r)?,
        }),
        ArgKind::PixelRegion => {
            let lo = ICoord2 {
                x: read_i32_le(r)?,
                y: read_i32_le(r)?,
            };
            let hi = ICoord2 {
                x: read_i32_le(r)?,
                y: read_i32_le(r)?,
            };
            ArgValue::PixelRegion(IRegion2 { lo, hi })
        }
        ArgKind::Timestamp => ArgValue::Timestamp(read_u32_le(r)?),
        ArgKind::WideChar => ArgValue::WideChar(read_u16_le(r)?),
    })
}

/// Encode an argument list: run count, run descriptors, then raw values.
pub fn encode_args(w: &mut dyn Write, args: &[ArgValue]) -> Result<(), ReplayError> {
    let runs = arg_schema(args)?;
    // arg_schema caps the run count at u8::MAX.
    write_u8(w, runs.len() as u8)?;
    for run in &runs {
        write_u8(w, run.kind.tag())?;
        write_u8(w, run.count)?;
    }
    for arg in args {
        write_arg_value(w, arg)?;
    }
    Ok(())
}

/// Read the run descriptors of an argument list.
pub fn decode_schema(r: &mut dyn Read) -> Result<Vec<ArgRun>, ReplayError> {
    let run_count = read_u8(r)?;
    let mut runs = Vec::with_capacity(usize::from(run_count));
    for _ in 0..run_count {
        let tag = read_u8(r)?;
        let kind = ArgKind::from_tag(tag).ok_or(ReplayError::UnknownArgumentKind { tag })?;
        let count = read_u8(r)?;
        runs.push(ArgRun { kind, count });
    }
    Ok(runs)
}

/// Decode an argument list written by [`encode_args`].
///
/// Values are consumed run by run; a zero-count run contributes nothing.
pub fn decode_args(r: &mut dyn Read) -> Result<ArgList, ReplayError> {
    let runs = decode_schema(r)?;
    let total: usize = runs.iter().map(|run| usize::from(run.count)).sum();
    let mut args = ArgList::with_capacity(total);
    for run in &runs {
        for _ in 0..run.count {
            args.push(read_arg_value(r, run.kind)?);
        }
    }
    Ok(args)
}

// ── Record encode/decode ────────────────────────────────────────

/// Encode one command record.
pub fn encode_record(w: &mut dyn Write, frame: u32, command: &Command) -> Result<(), ReplayError> {
    write_u32_le(w, frame)?;
    write_u32_le(w, command.command_type.0)?;
    write_i32_le(w, command.player_index)?;
    encode_args(w, &command.args)
}

/// Read the frame number that starts the next record.
///
/// Returns `Ok(None)` on clean EOF (no bytes left) and
/// [`ReplayError::Truncated`] if the stream ends inside the frame number.
pub fn decode_frame_number(r: &mut dyn Read) -> Result<Option<u32>, ReplayError> {
    // Read byte-by-byte progress to distinguish clean EOF (zero bytes
    // available) from truncation (1-3 bytes before EOF).
    let mut buf = [0u8; 4];
    let mut filled = 0;
    while filled < buf.len() {
        match r.read(&mut buf[filled..]) {
            Ok(0) if filled == 0 => return Ok(None),
            Ok(0) => {
                return Err(ReplayError::Truncated {
                    detail: format!("got {filled} of 4 bytes of a frame number"),
                })
            }
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(ReplayError::Io(e)),
        }
    }
    Ok(Some(u32::from_le_bytes(buf)))
}

/// Decode the remainder of a record after its frame number.
pub fn decode_command_body(r: &mut dyn Read) -> Result<Command, ReplayError> {
    let command_type = CommandType(read_u32_le(r)?);
    let player_index = read_i32_le(r)?;
    let args = decode_args(r)?;
    Ok(Command {
        command_type,
        player_index,
        args,
    })
}

/// Decode one full record, or `Ok(None)` at a clean end of stream.
pub fn decode_record(r: &mut dyn Read) -> Result<Option<CommandRecord>, ReplayError> {
    let Some(frame) = decode_frame_number(r)? else {
        return Ok(None);
    };
    let command = decode_command_body(r)?;
    Ok(Some(CommandRecord { frame, command }))
}
