//! Core types and traits for the genrep command-log recorder.
//!
//! This is the leaf crate with no internal dependencies. It defines
//! the vocabulary shared by the recorder and its host: command types,
//! typed argument values, strongly-typed identifiers, the slot layout
//! of a match, and the collaborator traits the host implements.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod command;
pub mod error;
pub mod id;
pub mod slots;
pub mod traits;

pub use command::{ArgKind, ArgList, ArgValue, Command, CommandType};
pub use error::SlotParseError;
pub use id::{Coord3, DrawableId, ICoord2, IRegion2, ObjectId, TeamId};
pub use slots::{Difficulty, GameMode, SlotLayout, SlotState, MAX_SLOTS};
pub use traits::{CommandQueue, SessionHost, SlotSnapshot};
