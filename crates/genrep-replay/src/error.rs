//! Error types for the replay system.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use genrep_core::SlotParseError;

use crate::recorder::SessionMode;

/// Errors that can occur during recording, playback, or header inspection.
#[derive(Debug, Error)]
pub enum ReplayError {
    /// An I/O error occurred during read, write, or seek.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    /// A replay file could not be opened or created.
    #[error("cannot open replay file {}: {source}", path.display())]
    OpenFailed {
        /// The path that was attempted.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: io::Error,
    },
    /// The file does not start with `b"GENREP"`.
    #[error("invalid magic bytes {found:?} (expected b\"GENREP\")")]
    InvalidMagic {
        /// The six bytes actually found.
        found: [u8; 6],
    },
    /// The header is structurally invalid.
    #[error("malformed replay header: {detail}")]
    MalformedHeader {
        /// What went wrong.
        detail: String,
    },
    /// The stream ended in the middle of a value.
    #[error("truncated stream: {detail}")]
    Truncated {
        /// What was being read when the stream ended.
        detail: String,
    },
    /// A run descriptor names a kind tag outside the closed set.
    #[error("unknown argument kind tag {tag}")]
    UnknownArgumentKind {
        /// The unrecognized tag.
        tag: u8,
    },
    /// An argument list cannot be described in 255 runs of at most 255 values.
    #[error("argument list needs {runs} runs, at most 255 fit in a record")]
    ArgumentOverflow {
        /// Number of runs the list would need.
        runs: usize,
    },
    /// The embedded slot configuration string did not parse.
    #[error("invalid slot configuration: {0}")]
    InvalidSlotConfig(#[from] SlotParseError),
    /// The recorded local player slot is outside `-1..MAX_SLOTS`.
    #[error("invalid local player slot {index}")]
    InvalidLocalSlot {
        /// The recorded index.
        index: i32,
    },
    /// A record was stamped with an earlier frame than the one before it.
    #[error("frame {frame} recorded after frame {last}")]
    FrameOutOfOrder {
        /// Frame of the previous record.
        last: u32,
        /// The rejected frame.
        frame: u32,
    },
    /// A session transition was requested while another session is active.
    #[error("recorder is busy ({mode:?})")]
    SessionBusy {
        /// The mode that blocked the transition.
        mode: SessionMode,
    },
}

impl ReplayError {
    /// Whether this error means the file is not a usable replay
    /// (as opposed to an environmental failure).
    pub fn is_format_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidMagic { .. }
                | Self::MalformedHeader { .. }
                | Self::Truncated { .. }
                | Self::UnknownArgumentKind { .. }
                | Self::InvalidSlotConfig(_)
                | Self::InvalidLocalSlot { .. }
        )
    }

    /// Whether the stream simply ran out of bytes.
    pub fn is_truncation(&self) -> bool {
        matches!(self, Self::Truncated { .. })
    }
}
