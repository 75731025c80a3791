//! Match setup: player slots, game mode, and difficulty.

/// Maximum number of player slots in a match.
///
/// Fixed by the replay format: the header carries one disconnect flag per slot.
pub const MAX_SLOTS: usize = 8;

/// How a match was launched.
///
/// Stored in the replay header as a raw `i32` so unknown values survive a
/// round trip; use [`GameMode::from_raw`] to interpret it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum GameMode {
    /// Campaign mission.
    SinglePlayer = 0,
    /// Local network match.
    Lan = 1,
    /// Local match against computer players.
    Skirmish = 2,
    /// Playback of a recorded match.
    Replay = 3,
    /// The front-end menus; never recorded.
    Shell = 4,
    /// Online match.
    Internet = 5,
    /// No match; never recorded.
    None = 6,
}

impl GameMode {
    /// Interpret a raw mode value.
    pub fn from_raw(raw: i32) -> Option<Self> {
        Some(match raw {
            0 => Self::SinglePlayer,
            1 => Self::Lan,
            2 => Self::Skirmish,
            3 => Self::Replay,
            4 => Self::Shell,
            5 => Self::Internet,
            6 => Self::None,
            _ => return None,
        })
    }

    /// The raw value written to the replay header.
    pub fn raw(self) -> i32 {
        self as i32
    }

    /// Whether a new game in this raw mode opens a recording.
    ///
    /// Only the menu and "no game" sentinels are excluded; unknown raw
    /// values are recorded.
    pub fn is_recordable(raw: i32) -> bool {
        raw != Self::Shell.raw() && raw != Self::None.raw()
    }
}

/// Computer opponent difficulty.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum Difficulty {
    /// Easy.
    Easy = 0,
    /// Normal; used when a new-game command omits the difficulty.
    #[default]
    Normal = 1,
    /// Hard.
    Hard = 2,
}

impl Difficulty {
    /// The raw value written to the replay header.
    pub fn raw(self) -> i32 {
        self as i32
    }
}

/// What occupies a player slot.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum SlotState {
    /// Slot is closed to players.
    #[default]
    Closed,
    /// Slot is open but nobody joined.
    Open,
    /// A human player.
    Human {
        /// Display name.
        name: String,
    },
    /// A computer player.
    Computer,
}

impl SlotState {
    /// Human or computer.
    pub fn is_occupied(&self) -> bool {
        matches!(self, Self::Human { .. } | Self::Computer)
    }
}

/// The parsed slot layout of a match.
///
/// Produced by the host's parser from the configuration string embedded
/// in the replay header. Slots default to closed, so a single-player
/// layout has no occupied slots.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SlotLayout {
    /// Per-slot occupancy.
    pub slots: [SlotState; MAX_SLOTS],
    /// Map the match was played on.
    pub map: String,
    /// Seed for the simulation's random number generator.
    pub seed: u32,
    /// Frames between periodic consistency checksums.
    pub crc_interval: u32,
}

impl SlotLayout {
    /// The state of `slot`, or `None` if out of range.
    pub fn slot(&self, slot: usize) -> Option<&SlotState> {
        self.slots.get(slot)
    }

    /// Whether `slot` holds a human or computer player.
    pub fn is_occupied(&self, slot: usize) -> bool {
        self.slot(slot).is_some_and(SlotState::is_occupied)
    }

    /// Whether any slot is occupied.
    pub fn any_occupied(&self) -> bool {
        self.slots.iter().any(SlotState::is_occupied)
    }

    /// Display name of the human in `slot`.
    pub fn human_name(&self, slot: usize) -> Option<&str> {
        match self.slot(slot)? {
            SlotState::Human { name } => Some(name),
            _ => None,
        }
    }
}
