//! genrep: deterministic command-log recording and playback for lockstep
//! simulations.
//!
//! This is the top-level facade crate that re-exports the public API from
//! the genrep sub-crates. For most users, adding `genrep` as a single
//! dependency is sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use genrep::prelude::*;
//! use genrep_test_utils::MockHost;
//!
//! let dir = tempfile::tempdir().unwrap();
//! let config = RecorderConfig::with_user_data_dir(dir.path());
//! let mut recorder = Recorder::new(config, MockHost::new()).unwrap();
//!
//! // A new-game command opens a recording; network commands are logged.
//! let mut queue = vec![
//!     GameSetup::new(GameMode::Skirmish).to_command(0),
//!     Command::new(CommandType(1068), 0).with_arg(ArgValue::Integer(1)),
//! ];
//! recorder.update(0, &mut queue).unwrap();
//! assert_eq!(recorder.mode(), SessionMode::Recording);
//!
//! // Clearing the game closes it.
//! let mut queue = vec![Command::new(CommandType::CLEAR_GAME_DATA, -1)];
//! recorder.update(4, &mut queue).unwrap();
//!
//! // Play it back into an empty queue.
//! recorder.start_playback("00000000.rep").unwrap();
//! let mut queue: Vec<Command> = Vec::new();
//! let report = recorder.update(0, &mut queue).unwrap();
//! assert_eq!(report.injected, 1);
//! assert_eq!(queue[0].command_type, CommandType(1068));
//! ```
//!
//! # Modules
//!
//! Each module corresponds to a sub-crate. Use them for types not in the prelude:
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `genrep-core` | Commands, typed arguments, IDs, slot layout, host traits |
//! | [`replay`] | `genrep-replay` | Binary format, codec, writer, reader, recorder |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Commands, typed arguments, and host traits (`genrep-core`).
///
/// Contains [`types::Command`], [`types::ArgValue`], the slot layout, and
/// the collaborator traits [`types::CommandQueue`] and
/// [`types::SessionHost`].
pub use genrep_core as types;

/// Command log format and the recorder (`genrep-replay`).
///
/// Record sessions with [`replay::Recorder`] or drive the log directly with
/// [`replay::CommandLogWriter`] and [`replay::CommandLogReader`].
pub use genrep_replay as replay;

/// Common imports for typical genrep usage.
///
/// ```rust
/// use genrep::prelude::*;
/// ```
pub mod prelude {
    // Commands and arguments
    pub use genrep_core::{
        ArgKind, ArgValue, Command, CommandType, Coord3, DrawableId, ICoord2, IRegion2, ObjectId,
        TeamId,
    };

    // Host collaborators
    pub use genrep_core::{CommandQueue, GameMode, SessionHost, SlotLayout, SlotState};

    // Recorder
    pub use genrep_replay::{
        CrcCheck, FrameReport, GameSetup, PlaybackStart, Recorder, RecorderConfig, SessionMode,
    };

    // Log access
    pub use genrep_replay::{CommandLogReader, CommandLogWriter, CommandRecord, ReplayHeader};

    // Errors
    pub use genrep_replay::{ConfigError, ReplayError};
}
