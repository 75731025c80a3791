//! Consistency checksum tracking during playback.
//!
//! Playback feeds every recorded checksum into a FIFO. The live simulation
//! then produces its own checksum for the same frames; each live value is
//! compared with the oldest recorded one. The first divergence is reported
//! once and never aborts playback.

use std::collections::VecDeque;

use crate::config::MismatchSeverity;

/// Value returned by [`CrcTracker::read_crc`] when no sample is queued.
pub const EMPTY_SENTINEL: u32 = 0;

/// Outcome of offering one checksum to the tracker.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CrcCheck {
    /// A recorded sample was queued for later comparison.
    Queued,
    /// The live sample came from a player other than the recorded local
    /// player and was not compared.
    Skipped,
    /// The live sample equals the recorded one.
    Matched,
    /// First divergence from the recording.
    Mismatch {
        /// The recorded checksum (or [`EMPTY_SENTINEL`]).
        expected: u32,
        /// The live checksum.
        actual: u32,
        /// Frame the comparison was made on.
        frame: u32,
    },
    /// The samples differ but no report is due: either a mismatch was
    /// already reported or the simulation has not advanced past frame 0.
    Suppressed,
    /// The sample was dropped without touching the queue: no playback is
    /// running, or it is a recorded checksum the recorder has already
    /// queued while decoding the log.
    Ignored,
}

/// FIFO of recorded checksums plus a one-shot mismatch flag.
#[derive(Debug)]
pub struct CrcTracker {
    samples: VecDeque<u32>,
    local_player: i32,
    saw_mismatch: bool,
    severity: MismatchSeverity,
}

impl CrcTracker {
    /// Create an empty tracker for the recorded local player (`-1` if none).
    pub fn new(local_player: i32, severity: MismatchSeverity) -> Self {
        Self {
            samples: VecDeque::new(),
            local_player,
            saw_mismatch: false,
            severity,
        }
    }

    /// The recorded local player index.
    pub fn local_player(&self) -> i32 {
        self.local_player
    }

    /// Internal player name of the recorded local player, e.g. `"player2"`.
    pub fn local_player_name(&self) -> String {
        format!("player{}", self.local_player)
    }

    /// Queue a recorded checksum.
    pub fn add_crc(&mut self, value: u32) {
        self.samples.push_back(value);
    }

    /// Dequeue the oldest recorded checksum, or [`EMPTY_SENTINEL`] if none.
    pub fn read_crc(&mut self) -> u32 {
        self.samples.pop_front().unwrap_or(EMPTY_SENTINEL)
    }

    /// Number of queued checksums.
    pub fn pending(&self) -> usize {
        self.samples.len()
    }

    /// Whether a mismatch has been reported.
    pub fn saw_mismatch(&self) -> bool {
        self.saw_mismatch
    }

    /// Whether a live sample from the player named `live_name` should be
    /// compared. A player the host cannot name always matches, as does
    /// every player when no local player was recorded.
    pub fn is_local_player(&self, live_name: Option<&str>) -> bool {
        if self.local_player < 0 {
            return true;
        }
        match live_name {
            None => true,
            Some(name) => name == self.local_player_name(),
        }
    }

    /// Compare a live checksum computed on `frame` against the oldest
    /// recorded one, consuming it.
    pub fn compare(&mut self, actual: u32, frame: u32) -> CrcCheck {
        let expected = self.read_crc();
        if actual == expected {
            return CrcCheck::Matched;
        }
        if frame == 0 || self.saw_mismatch {
            return CrcCheck::Suppressed;
        }
        self.saw_mismatch = true;
        match self.severity {
            MismatchSeverity::Silent => {}
            MismatchSeverity::Warn => tracing::warn!(
                expected = format_args!("{expected:#010x}"),
                actual = format_args!("{actual:#010x}"),
                frame,
                "replay has gone out of sync"
            ),
            MismatchSeverity::Error => tracing::error!(
                expected = format_args!("{expected:#010x}"),
                actual = format_args!("{actual:#010x}"),
                frame,
                "replay has gone out of sync"
            ),
        }
        CrcCheck::Mismatch {
            expected,
            actual,
            frame,
        }
    }

    /// Route one checksum sample: recorded samples are queued, live samples
    /// from the local player are compared, other live samples are skipped.
    pub fn handle_sample(
        &mut self,
        value: u32,
        live_name: Option<&str>,
        from_playback: bool,
        frame: u32,
    ) -> CrcCheck {
        if from_playback {
            self.add_crc(value);
            return CrcCheck::Queued;
        }
        if !self.is_local_player(live_name) {
            tracing::trace!(value, local_player = self.local_player, "skipping crc");
            return CrcCheck::Skipped;
        }
        self.compare(value, frame)
    }
}

impl Default for CrcTracker {
    fn default() -> Self {
        Self::new(-1, MismatchSeverity::default())
    }
}
