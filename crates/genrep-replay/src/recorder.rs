//! The per-frame record/playback state machine.
//!
//! [`Recorder`] owns the single session of a process. The host calls
//! [`update()`](Recorder::update) once per simulation frame with the queue
//! of commands about to execute:
//!
//! - **Idle / Recording**: a new-game command opens a recording, every
//!   network command is appended to the log, and a clear-game-data command
//!   closes it.
//! - **Playing**: local network input is culled from the queue and the
//!   recorded commands for the frame are injected in its place. Dry-run
//!   playback (analysis) decodes the log one recorded frame per update
//!   without touching the queue.
//!
//! Every transition is synchronous; stopping or resetting between frames
//! is always safe.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use chrono::Utc;

use genrep_core::{
    ArgValue, Command, CommandQueue, CommandType, Difficulty, GameMode, SessionHost, SlotLayout,
};

use crate::config::{ConfigError, RecorderConfig, VersionDifference};
use crate::crc::{CrcCheck, CrcTracker};
use crate::error::ReplayError;
use crate::reader::{read_header, CommandLogReader};
use crate::types::{CommandRecord, ReplayHeader, SystemTimeStamp};
use crate::writer::CommandLogWriter;

// ── SessionMode ─────────────────────────────────────────────────

/// What the recorder is doing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SessionMode {
    /// No session; watching for a new-game command.
    #[default]
    Idle,
    /// Appending commands to a log.
    Recording,
    /// Replaying a log.
    Playing {
        /// Decode without injecting, advancing by recorded frame.
        dry_run: bool,
    },
}

// ── GameSetup ───────────────────────────────────────────────────

/// Parameters of a new-game command.
///
/// Values are kept raw so unknown modes and difficulties survive a round
/// trip through the replay header.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GameSetup {
    /// Raw [`GameMode`].
    pub game_mode: i32,
    /// Raw [`Difficulty`].
    pub difficulty: i32,
    /// Rank points awarded at game start.
    pub rank_points: i32,
    /// Frame-rate cap, `0` for none.
    pub max_fps: i32,
}

impl GameSetup {
    /// Setup for `game_mode` at normal difficulty.
    pub fn new(game_mode: GameMode) -> Self {
        Self {
            game_mode: game_mode.raw(),
            difficulty: Difficulty::default().raw(),
            rank_points: 0,
            max_fps: 0,
        }
    }

    /// Read the parameters of a new-game command.
    ///
    /// Arguments are positional integers: mode, then optionally difficulty,
    /// rank points and max FPS. Returns `None` for other commands or when
    /// the mode is missing.
    pub fn from_new_game(command: &Command) -> Option<Self> {
        if command.command_type != CommandType::NEW_GAME {
            return None;
        }
        Some(Self {
            game_mode: command.integer_arg(0)?,
            difficulty: command
                .integer_arg(1)
                .unwrap_or(Difficulty::default().raw()),
            rank_points: command.integer_arg(2).unwrap_or(0),
            max_fps: command.integer_arg(3).unwrap_or(0),
        })
    }

    /// The game mode, if it is a known one.
    pub fn mode(&self) -> Option<GameMode> {
        GameMode::from_raw(self.game_mode)
    }

    /// Build the matching new-game command. A zero frame-rate cap is omitted.
    pub fn to_command(&self, player_index: i32) -> Command {
        let mut command = Command::new(CommandType::NEW_GAME, player_index);
        for value in [self.game_mode, self.difficulty, self.rank_points] {
            command.push_arg(ArgValue::Integer(value));
        }
        if self.max_fps != 0 {
            command.push_arg(ArgValue::Integer(self.max_fps));
        }
        command
    }
}

// ── Reports ─────────────────────────────────────────────────────

/// What one [`Recorder::update`] call did.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FrameReport {
    /// Records appended to the log.
    pub recorded: usize,
    /// Recorded commands appended to the queue.
    pub injected: usize,
    /// Records decoded from the log, injected or not.
    pub decoded: usize,
    /// Local commands removed from the queue during playback.
    pub culled: usize,
    /// A recording was opened this frame.
    pub recording_started: bool,
    /// A recording was closed this frame.
    pub recording_stopped: bool,
    /// Playback reached the end of the log this frame and the recorder is
    /// idle again. The host should clear its game data.
    pub playback_finished: bool,
}

/// Everything the host needs to launch a replayed match.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlaybackStart {
    /// The replay header.
    pub header: ReplayHeader,
    /// Slot layout parsed from the header.
    pub layout: SlotLayout,
    /// New-game parameters, with the mode set to [`GameMode::Replay`].
    pub setup: GameSetup,
    /// Seed for the simulation's random number generator.
    pub seed: u32,
    /// Ways the recording build differs from the running one.
    pub version_differences: Vec<VersionDifference>,
}

/// A replay found by [`Recorder::list_replays`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReplayListing {
    /// File name within the replay directory.
    pub file_name: String,
    /// The file's header.
    pub header: ReplayHeader,
}

// ── Recorder ────────────────────────────────────────────────────

/// Records and replays the command stream of one session at a time.
///
/// # Example
///
/// ```ignore
/// let mut recorder = Recorder::new(config, host)?;
/// loop {
///     let report = recorder.update(frame, &mut queue)?;
///     if report.playback_finished {
///         clear_game_data();
///     }
///     execute(&mut queue);
///     frame += 1;
/// }
/// ```
pub struct Recorder {
    config: RecorderConfig,
    host: Box<dyn SessionHost>,
    mode: SessionMode,
    writer: Option<CommandLogWriter<BufWriter<File>>>,
    reader: Option<CommandLogReader<BufReader<File>>>,
    crc: CrcTracker,
    layout: Option<SlotLayout>,
    current_file: Option<PathBuf>,
    crc_interval: u32,
    frame: u32,
}

impl Recorder {
    /// Create an idle recorder.
    pub fn new(
        config: RecorderConfig,
        host: impl SessionHost + 'static,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let crc = CrcTracker::new(-1, config.crc_mismatch_severity);
        let crc_interval = config.crc_interval;
        Ok(Self {
            config,
            host: Box::new(host),
            mode: SessionMode::Idle,
            writer: None,
            reader: None,
            crc,
            layout: None,
            current_file: None,
            crc_interval,
            frame: 0,
        })
    }

    /// The configuration the recorder was built with.
    pub fn config(&self) -> &RecorderConfig {
        &self.config
    }

    /// The host collaborator.
    pub fn host(&self) -> &dyn SessionHost {
        self.host.as_ref()
    }

    /// The current session mode.
    pub fn mode(&self) -> SessionMode {
        self.mode
    }

    /// Checksum interval of the current session.
    ///
    /// While playing, this is the interval stamped into the recording.
    pub fn crc_interval(&self) -> u32 {
        self.crc_interval
    }

    /// Slot layout of the replay being played.
    pub fn slot_layout(&self) -> Option<&SlotLayout> {
        self.layout.as_ref()
    }

    /// The checksum tracker of the current playback.
    pub fn crc_tracker(&self) -> &CrcTracker {
        &self.crc
    }

    /// Path of the replay being played, `None` unless playing.
    pub fn current_replay_filename(&self) -> Option<&Path> {
        match self.mode {
            SessionMode::Playing { .. } => self.current_file.as_deref(),
            _ => None,
        }
    }

    /// Whether a dry-run playback still has records left.
    pub fn is_analysis_in_progress(&self) -> bool {
        self.mode == SessionMode::Playing { dry_run: true }
            && self.reader.as_ref().is_some_and(|r| !r.is_finished())
    }

    /// Whether the current match involves more than one participant.
    ///
    /// While playing this is decided by the recorded slot layout; otherwise
    /// by the host's game mode and network setup.
    pub fn is_multiplayer(&self) -> bool {
        if matches!(self.mode, SessionMode::Playing { .. })
            && self.layout.as_ref().is_some_and(SlotLayout::any_occupied)
        {
            return true;
        }
        match self.host.game_mode() {
            GameMode::SinglePlayer | GameMode::Shell => false,
            _ => self.host.has_multiplayer_setup(),
        }
    }

    /// Run the recorder for one simulation frame.
    pub fn update(
        &mut self,
        frame: u32,
        queue: &mut dyn CommandQueue,
    ) -> Result<FrameReport, ReplayError> {
        self.frame = frame;
        match self.mode {
            SessionMode::Idle | SessionMode::Recording => self.update_record(frame, queue),
            SessionMode::Playing { dry_run } => self.update_playback(frame, dry_run, queue),
        }
    }

    /// Force the recorder back to idle, closing any open log without
    /// patching its header.
    pub fn reset(&mut self) {
        if self.mode != SessionMode::Idle {
            tracing::debug!(mode = ?self.mode, "resetting recorder");
        }
        self.writer = None;
        self.reader = None;
        self.mode = SessionMode::Idle;
        self.crc = CrcTracker::new(-1, self.config.crc_mismatch_severity);
        self.layout = None;
        self.current_file = None;
        self.crc_interval = self.config.crc_interval;
        self.frame = 0;
    }

    // ── Recording ───────────────────────────────────────────────

    /// Open a new recording, overwriting the last-replay file.
    ///
    /// Fails with [`ReplayError::SessionBusy`] unless idle. On failure the
    /// recorder stays idle.
    pub fn start_recording(&mut self, setup: GameSetup) -> Result<(), ReplayError> {
        if self.mode != SessionMode::Idle {
            return Err(ReplayError::SessionBusy { mode: self.mode });
        }
        self.reset();

        let dir = self.config.replay_dir();
        fs::create_dir_all(&dir).map_err(|source| ReplayError::OpenFailed {
            path: dir.clone(),
            source,
        })?;
        let path = self.config.last_replay_path();
        let file = File::create(&path).map_err(|source| ReplayError::OpenFailed {
            path: path.clone(),
            source,
        })?;

        let snapshot = self.host.slot_snapshot(self.config.crc_interval);
        let build = &self.config.build;
        let header = ReplayHeader {
            replay_name: self.config.last_replay_display_name.clone(),
            created: SystemTimeStamp::now(),
            version_string: build.version_string.clone(),
            build_time: build.build_time.clone(),
            version_number: build.version_number,
            exe_checksum: build.exe_checksum,
            data_checksum: build.data_checksum,
            slot_config: snapshot.config,
            local_player_index: snapshot.local_slot,
            difficulty: setup.difficulty,
            original_game_mode: setup.game_mode,
            rank_points: setup.rank_points,
            max_fps: setup.max_fps,
            ..ReplayHeader::default()
        };
        let mut writer = CommandLogWriter::create(BufWriter::new(file), &header)?;
        writer.log_game_start(unix_now())?;

        tracing::info!(
            path = %path.display(),
            game_mode = setup.game_mode,
            local_slot = header.local_player_index,
            "recording started"
        );
        self.writer = Some(writer);
        self.current_file = Some(path);
        self.crc_interval = self.config.crc_interval;
        self.mode = SessionMode::Recording;
        Ok(())
    }

    /// Close the recording, patching the end time and `frame_count`.
    ///
    /// Does nothing unless recording.
    pub fn stop_recording(&mut self, frame_count: u32) -> Result<(), ReplayError> {
        let Some(writer) = self.writer.take() else {
            return Ok(());
        };
        self.mode = SessionMode::Idle;
        self.current_file = None;
        let records = writer.records_written();
        writer.finish(unix_now(), frame_count)?;
        tracing::info!(records, frame_count, "recording stopped");
        Ok(())
    }

    /// Mark `slot` as disconnected in the current recording.
    pub fn log_player_disconnect(&mut self, slot: usize) -> Result<(), ReplayError> {
        match self.writer.as_mut() {
            Some(writer) => writer.log_player_disconnect(slot),
            None => Ok(()),
        }
    }

    /// Mark the current recording as desynchronized.
    pub fn log_crc_mismatch(&mut self) -> Result<(), ReplayError> {
        match self.writer.as_mut() {
            Some(writer) => writer.log_crc_mismatch(),
            None => Ok(()),
        }
    }

    /// Mark the local player as having quit the current recording early.
    pub fn log_quit_early(&mut self) -> Result<(), ReplayError> {
        match self.writer.as_mut() {
            Some(writer) => writer.log_quit_early(),
            None => Ok(()),
        }
    }

    fn update_record(
        &mut self,
        frame: u32,
        queue: &mut dyn CommandQueue,
    ) -> Result<FrameReport, ReplayError> {
        let mut report = FrameReport::default();
        for command in queue.commands() {
            let command_type = command.command_type;
            if command_type == CommandType::NEW_GAME {
                let Some(setup) = GameSetup::from_new_game(command) else {
                    tracing::warn!(frame, "new-game command without a mode");
                    continue;
                };
                if !GameMode::is_recordable(setup.game_mode) {
                    continue;
                }
                if self.mode == SessionMode::Recording {
                    tracing::warn!(frame, "new game while recording, closing previous log");
                    self.stop_recording(frame)?;
                    report.recording_stopped = true;
                }
                self.start_recording(setup)?;
                report.recording_started = true;
            } else if command_type == CommandType::CLEAR_GAME_DATA {
                if let Some(writer) = self.writer.as_mut() {
                    writer.write_record(frame, command)?;
                    report.recorded += 1;
                    self.stop_recording(frame)?;
                    report.recording_stopped = true;
                }
            } else if command_type.is_network() {
                if let Some(writer) = self.writer.as_mut() {
                    writer.write_record(frame, command)?;
                    report.recorded += 1;
                }
            }
        }

        if report.recorded > 0 {
            if let Some(writer) = self.writer.as_mut() {
                writer.flush()?;
            }
        }
        Ok(report)
    }

    // ── Playback ────────────────────────────────────────────────

    /// Begin replaying `filename` (relative to the replay directory, or
    /// absolute) into the live command queue.
    ///
    /// On failure the mode is unchanged.
    pub fn start_playback(&mut self, filename: impl AsRef<Path>) -> Result<PlaybackStart, ReplayError> {
        self.begin_playback(filename.as_ref(), false)
    }

    /// Begin a dry-run playback of `filename` that decodes without injecting.
    pub fn start_analysis(&mut self, filename: impl AsRef<Path>) -> Result<PlaybackStart, ReplayError> {
        self.begin_playback(filename.as_ref(), true)
    }

    /// Stop playback, culling local input from `queue` first.
    ///
    /// Returns the number of culled commands. Does nothing unless playing.
    pub fn stop_playback(&mut self, queue: &mut dyn CommandQueue) -> usize {
        let SessionMode::Playing { dry_run } = self.mode else {
            return 0;
        };
        let culled = if dry_run { 0 } else { cull_local_input(queue) };
        self.finish_playback();
        culled
    }

    /// Offer one checksum sample to the consistency check.
    ///
    /// Live samples are compared against the oldest queued one when
    /// `player_index` is the recorded local player.
    ///
    /// The recorder queues every checksum command it decodes from the log
    /// before injecting it. A host that also reports the injected command
    /// with `from_playback = true` gets [`CrcCheck::Ignored`] back and the
    /// queue is left alone, so each recorded value is queued exactly once.
    /// Live samples outside playback are [`CrcCheck::Ignored`] too: there
    /// is no recording to compare against.
    pub fn handle_crc_sample(
        &mut self,
        value: u32,
        player_index: i32,
        from_playback: bool,
    ) -> CrcCheck {
        if from_playback || !matches!(self.mode, SessionMode::Playing { .. }) {
            tracing::trace!(
                value,
                player_index,
                from_playback,
                mode = ?self.mode,
                "checksum sample ignored"
            );
            return CrcCheck::Ignored;
        }
        let name = self.host.player_name(player_index);
        self.crc
            .handle_sample(value, name.as_deref(), false, self.frame)
    }

    /// Read the header of `filename` without starting playback.
    pub fn read_header_only(&self, filename: impl AsRef<Path>) -> Result<ReplayHeader, ReplayError> {
        read_header(&self.resolve(filename.as_ref()))
    }

    /// Whether `filename` was recorded by a different build.
    pub fn version_differs(&self, filename: impl AsRef<Path>) -> Result<bool, ReplayError> {
        let header = self.read_header_only(filename)?;
        Ok(!self.config.build.differences(&header).is_empty())
    }

    /// Every readable replay in the replay directory, sorted by file name.
    ///
    /// A missing directory yields an empty list; unreadable files are skipped.
    pub fn list_replays(&self) -> Result<Vec<ReplayListing>, ReplayError> {
        let dir = self.config.replay_dir();
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => return Err(ReplayError::OpenFailed { path: dir, source }),
        };

        let mut listings = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(self.config.replay_extension.as_str()) {
                continue;
            }
            let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            match read_header(&path) {
                Ok(header) => listings.push(ReplayListing {
                    file_name: file_name.to_owned(),
                    header,
                }),
                Err(e) => tracing::debug!(path = %path.display(), error = %e, "skipping replay"),
            }
        }
        listings.sort_by(|a, b| a.file_name.cmp(&b.file_name));
        Ok(listings)
    }

    fn resolve(&self, filename: &Path) -> PathBuf {
        self.config.replay_dir().join(filename)
    }

    fn begin_playback(&mut self, filename: &Path, dry_run: bool) -> Result<PlaybackStart, ReplayError> {
        if self.mode != SessionMode::Idle {
            return Err(ReplayError::SessionBusy { mode: self.mode });
        }
        let path = self.resolve(filename);
        let reader = CommandLogReader::open_file(&path)?;
        let header = reader.header().clone();
        let layout = self.host.parse_slot_layout(&header.slot_config)?;

        let version_differences = self.config.build.differences(&header);
        for diff in &version_differences {
            tracing::warn!(path = %path.display(), "replay built by a different version: {diff}");
        }

        self.reset();
        self.crc = CrcTracker::new(header.local_player_index, self.config.crc_mismatch_severity);
        self.crc_interval = layout.crc_interval;
        tracing::info!(
            path = %path.display(),
            dry_run,
            local_player = header.local_player_index,
            crc_interval = self.crc_interval,
            original_game_mode = header.original_game_mode,
            "playback started"
        );

        let setup = GameSetup {
            game_mode: GameMode::Replay.raw(),
            difficulty: header.difficulty,
            rank_points: header.rank_points,
            max_fps: header.max_fps,
        };
        let start = PlaybackStart {
            seed: layout.seed,
            layout: layout.clone(),
            header,
            setup,
            version_differences,
        };

        self.reader = Some(reader);
        self.layout = Some(layout);
        self.current_file = Some(path);
        self.mode = SessionMode::Playing { dry_run };
        Ok(start)
    }

    fn update_playback(
        &mut self,
        frame: u32,
        dry_run: bool,
        queue: &mut dyn CommandQueue,
    ) -> Result<FrameReport, ReplayError> {
        let mut report = FrameReport::default();
        if !dry_run {
            report.culled = cull_local_input(queue);
        }

        let Some(reader) = self.reader.as_mut() else {
            self.finish_playback();
            report.playback_finished = true;
            return Ok(report);
        };
        let Some(next) = reader.peek_frame() else {
            self.finish_playback();
            report.playback_finished = true;
            return Ok(report);
        };
        let current = if dry_run { next } else { frame };

        while reader.peek_frame() == Some(current) {
            let record = match reader.next_record() {
                Ok(Some(record)) => record,
                Ok(None) => break,
                Err(e) if e.is_truncation() => {
                    tracing::debug!(frame = current, error = %e, "replay ended mid-record");
                    break;
                }
                Err(e) => {
                    self.finish_playback();
                    return Err(e);
                }
            };
            report.decoded += 1;
            if play_record(&mut self.crc, &record, dry_run, queue) {
                report.injected += 1;
            }
        }

        if reader.is_finished() {
            self.finish_playback();
            report.playback_finished = true;
        }
        Ok(report)
    }

    fn finish_playback(&mut self) {
        if let Some(reader) = self.reader.take() {
            tracing::info!(records = reader.records_read(), "playback finished");
        }
        self.mode = SessionMode::Idle;
        self.layout = None;
        self.current_file = None;
    }
}

/// Feed one decoded record to the checksum tracker and the queue.
/// Returns whether the command was injected.
fn play_record(
    crc: &mut CrcTracker,
    record: &CommandRecord,
    dry_run: bool,
    queue: &mut dyn CommandQueue,
) -> bool {
    let command = &record.command;
    let command_type = command.command_type;
    tracing::trace!(
        frame = record.frame,
        %command_type,
        player = command.player_index,
        "replaying command"
    );

    if command_type == CommandType::LOGIC_CRC {
        match command.integer_arg(0) {
            // Checksums are stored as the integer bit pattern.
            Some(value) => crc.add_crc(value as u32),
            None => tracing::warn!(frame = record.frame, "checksum command without a value"),
        }
    }

    if dry_run
        || command_type == CommandType::CLEAR_GAME_DATA
        || command_type == CommandType::BEGIN_NETWORK_MESSAGES
    {
        return false;
    }
    queue.append_command(command.clone());
    true
}

/// Remove network commands queued locally, except checksum commands.
fn cull_local_input(queue: &mut dyn CommandQueue) -> usize {
    let before = queue.commands().len();
    queue.retain_commands(&mut |c| {
        !c.command_type.is_network() || c.command_type == CommandType::LOGIC_CRC
    });
    let culled = before - queue.commands().len();
    if culled > 0 {
        tracing::debug!(culled, "culled local input during playback");
    }
    culled
}

fn unix_now() -> u32 {
    Utc::now().timestamp().clamp(0, i64::from(u32::MAX)) as u32
}
