//! Data types for replay recording and playback.

use chrono::{DateTime, Datelike, Local, TimeZone, Timelike};

use genrep_core::{ArgKind, Command, MAX_SLOTS};

/// Calendar timestamp stored in the replay header.
///
/// Eight `u16` fields (16 bytes on the wire), local time.
/// `day_of_week` counts from Sunday = 0.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct SystemTimeStamp {
    /// Four-digit year.
    pub year: u16,
    /// Month, 1-12.
    pub month: u16,
    /// Day of week, Sunday = 0.
    pub day_of_week: u16,
    /// Day of month, 1-31.
    pub day: u16,
    /// Hour, 0-23.
    pub hour: u16,
    /// Minute, 0-59.
    pub minute: u16,
    /// Second, 0-59.
    pub second: u16,
    /// Milliseconds, 0-999.
    pub milliseconds: u16,
}

impl SystemTimeStamp {
    /// Break a date-time into calendar fields.
    pub fn from_datetime<Tz: TimeZone>(dt: &DateTime<Tz>) -> Self {
        Self {
            year: u16::try_from(dt.year()).unwrap_or(0),
            month: dt.month() as u16,
            day_of_week: dt.weekday().num_days_from_sunday() as u16,
            day: dt.day() as u16,
            hour: dt.hour() as u16,
            minute: dt.minute() as u16,
            second: dt.second() as u16,
            // Leap seconds report >= 1000.
            milliseconds: dt.timestamp_subsec_millis().min(999) as u16,
        }
    }

    /// The current local time.
    pub fn now() -> Self {
        Self::from_datetime(&Local::now())
    }
}

/// Session metadata at the start of every replay file.
///
/// `start_time`, `end_time`, `frame_count`, `desync`, `quit_early`, and
/// `player_disconnects` live at fixed offsets and are patched in place
/// after the header has been written; everything else is written once.
///
/// # Examples
///
/// ```
/// use genrep_replay::ReplayHeader;
///
/// let header = ReplayHeader {
///     replay_name: "Last Replay".into(),
///     local_player_index: 0,
///     ..ReplayHeader::default()
/// };
/// assert_eq!(header.local_player_slot(), Some(0));
/// assert!(!header.desync);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReplayHeader {
    /// Session start, seconds since the Unix epoch.
    pub start_time: u32,
    /// Session end, seconds since the Unix epoch.
    pub end_time: u32,
    /// Number of simulation frames the session lasted.
    pub frame_count: u32,
    /// Whether a consistency mismatch was seen while recording.
    pub desync: bool,
    /// Whether the local player left before the match ended.
    pub quit_early: bool,
    /// Per-slot disconnect flags.
    pub player_disconnects: [bool; MAX_SLOTS],
    /// Display name of the replay.
    pub replay_name: String,
    /// Local wall-clock time the file was created.
    pub created: SystemTimeStamp,
    /// Version string of the recording build.
    pub version_string: String,
    /// Build-time string of the recording build.
    pub build_time: String,
    /// Numeric version of the recording build.
    pub version_number: u32,
    /// Checksum of the recording executable.
    pub exe_checksum: u32,
    /// Checksum of the recording build's data files.
    pub data_checksum: u32,
    /// Serialized slot layout (host-defined encoding).
    pub slot_config: String,
    /// Slot of the recording player, `-1` if none.
    pub local_player_index: i32,
    /// Raw difficulty value.
    pub difficulty: i32,
    /// Raw [`GameMode`](genrep_core::GameMode) of the recorded match.
    pub original_game_mode: i32,
    /// Rank points awarded at game start.
    pub rank_points: i32,
    /// Frame-rate cap chosen for the match, `0` for none.
    pub max_fps: i32,
}

impl ReplayHeader {
    /// The recording player's slot, if one was recorded.
    pub fn local_player_slot(&self) -> Option<usize> {
        usize::try_from(self.local_player_index)
            .ok()
            .filter(|&slot| slot < MAX_SLOTS)
    }

    /// A copy with every patchable field reset to its placeholder value.
    pub fn with_placeholders(&self) -> Self {
        Self {
            start_time: 0,
            end_time: 0,
            frame_count: 0,
            desync: false,
            quit_early: false,
            player_disconnects: [false; MAX_SLOTS],
            ..self.clone()
        }
    }
}

/// One run of the argument schema: `count` consecutive values of `kind`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ArgRun {
    /// Kind of every value in the run.
    pub kind: ArgKind,
    /// Number of values.
    pub count: u8,
}

/// A command together with the frame it executed on.
#[derive(Clone, Debug, PartialEq)]
pub struct CommandRecord {
    /// Simulation frame.
    pub frame: u32,
    /// The logged command.
    pub command: Command,
}
