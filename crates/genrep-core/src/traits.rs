//! Collaborator traits implemented by the host simulation.
//!
//! The recorder never owns the simulation. It sees the host through two
//! seams: the outgoing command queue for the current frame, and a
//! [`SessionHost`] that knows about players and match setup.

use crate::command::Command;
use crate::error::SlotParseError;
use crate::slots::{GameMode, SlotLayout};

/// The queue of commands that will execute on the current frame.
///
/// During recording the recorder reads it; during playback it appends
/// decoded commands and culls local input.
pub trait CommandQueue {
    /// Append a command at the back of the queue.
    fn append_command(&mut self, command: Command);

    /// The queued commands, front first.
    fn commands(&self) -> &[Command];

    /// Keep only the commands for which `keep` returns `true`.
    fn retain_commands(&mut self, keep: &mut dyn FnMut(&Command) -> bool);

    /// The command at the front of the queue.
    fn first_command(&self) -> Option<&Command> {
        self.commands().first()
    }
}

impl CommandQueue for Vec<Command> {
    fn append_command(&mut self, command: Command) {
        self.push(command);
    }

    fn commands(&self) -> &[Command] {
        self.as_slice()
    }

    fn retain_commands(&mut self, keep: &mut dyn FnMut(&Command) -> bool) {
        self.retain(|c| keep(c));
    }
}

/// The serialized slot layout captured when a recording starts.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SlotSnapshot {
    /// Host-defined textual encoding of the slot layout.
    pub config: String,
    /// Slot of the local player, or `-1` when there is none
    /// (e.g. a campaign mission).
    pub local_slot: i32,
}

/// Host services the recorder needs beyond the command queue.
pub trait SessionHost {
    /// Serialize the slot layout of the match about to be recorded.
    ///
    /// `crc_interval` must be stamped into the layout so playback can
    /// recover the checksum cadence.
    fn slot_snapshot(&self, crc_interval: u32) -> SlotSnapshot;

    /// Parse a layout produced by [`slot_snapshot`](SessionHost::slot_snapshot).
    fn parse_slot_layout(&self, config: &str) -> Result<SlotLayout, SlotParseError>;

    /// Internal name of the player at `player_index` (e.g. `"player2"`),
    /// or `None` if there is no such player.
    fn player_name(&self, player_index: i32) -> Option<String>;

    /// The mode of the match currently running.
    fn game_mode(&self) -> GameMode;

    /// Whether a network or skirmish setup is active.
    fn has_multiplayer_setup(&self) -> bool;
}
