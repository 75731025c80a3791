//! Frame-stamped command logging and deterministic playback.
//!
//! Records every simulation-affecting command of a session into a binary
//! log, and replays that log into a live command queue so the simulation
//! reproduces the recorded run. Periodic consistency checksums carried in
//! the log detect when playback diverges.
//!
//! # Architecture
//!
//! - [`CommandLogWriter`] appends records to any `Write + Seek` sink and
//!   patches session statistics into the header in place
//! - [`CommandLogReader`] decodes records from any `Read` source with one
//!   record of lookahead
//! - [`CrcTracker`] queues recorded checksums and compares live ones
//! - [`Recorder`] is the per-frame state machine (idle, recording,
//!   playing back) that routes commands between the host and the log
//!
//! # Format
//!
//! ```text
//! [MAGIC "GENREP"] [start u32] [end u32] [frames u32] [desync u8] [quit u8]
//! [disconnect u8 × 8] [name wstr] [created 8×u16] [version wstr]
//! [build time wstr] [version u32] [exe crc u32] [data crc u32]
//! [slot config str] [local index str] [difficulty i32] [mode i32]
//! [rank i32] [max fps i32]
//! [Record 1] [Record 2] ... [Record N]
//! ```
//!
//! Each record holds the frame number, command type, issuing player, and a
//! run-length encoded argument list. See [`codec`] for the exact layout.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod codec;
pub mod config;
pub mod crc;
pub mod error;
pub mod reader;
pub mod recorder;
pub mod types;
pub mod writer;

pub use config::{BuildInfo, ConfigError, MismatchSeverity, RecorderConfig, VersionDifference};
pub use crc::{CrcCheck, CrcTracker};
pub use error::ReplayError;
pub use reader::{read_header, CommandLogReader, RecordIter};
pub use recorder::{FrameReport, GameSetup, PlaybackStart, Recorder, ReplayListing, SessionMode};
pub use types::{ArgRun, CommandRecord, ReplayHeader, SystemTimeStamp};
pub use writer::CommandLogWriter;

/// Magic bytes at the start of every replay file.
pub const MAGIC: [u8; 6] = *b"GENREP";
