//! Commands, command types, and typed argument values.

use smallvec::SmallVec;
use std::fmt;

use crate::id::{Coord3, DrawableId, ICoord2, IRegion2, ObjectId, TeamId};

/// Numeric command type.
///
/// The numbering belongs to the host; the recorder only needs to know a
/// handful of control values and the bounds of the network-relevant range.
/// Everything strictly between [`BEGIN_NETWORK_MESSAGES`] and
/// [`END_NETWORK_MESSAGES`] affects the simulation and is logged.
///
/// [`BEGIN_NETWORK_MESSAGES`]: CommandType::BEGIN_NETWORK_MESSAGES
/// [`END_NETWORK_MESSAGES`]: CommandType::END_NETWORK_MESSAGES
///
/// # Examples
///
/// ```
/// use genrep_core::CommandType;
///
/// assert!(CommandType::LOGIC_CRC.is_network());
/// assert!(CommandType(1068).is_network());
/// assert!(!CommandType::NEW_GAME.is_network());
/// assert!(!CommandType::BEGIN_NETWORK_MESSAGES.is_network());
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CommandType(pub u32);

impl CommandType {
    /// Never issued; placeholder for an uninitialized command.
    pub const INVALID: Self = Self(0);
    /// Tear down the running match. Ends a recording session.
    pub const CLEAR_GAME_DATA: Self = Self(27);
    /// Start a new match: `(game mode, [difficulty], [rank points], [max fps])`.
    pub const NEW_GAME: Self = Self(28);
    /// Lower bound (exclusive) of the network-relevant range.
    pub const BEGIN_NETWORK_MESSAGES: Self = Self(1000);
    /// Periodic simulation checksum: `(crc as integer)`.
    pub const LOGIC_CRC: Self = Self(1095);
    /// Upper bound (exclusive) of the network-relevant range.
    pub const END_NETWORK_MESSAGES: Self = Self(1999);

    /// Whether commands of this type affect the simulation and travel
    /// between peers.
    pub fn is_network(self) -> bool {
        self > Self::BEGIN_NETWORK_MESSAGES && self < Self::END_NETWORK_MESSAGES
    }
}

impl fmt::Display for CommandType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::INVALID => write!(f, "INVALID"),
            Self::CLEAR_GAME_DATA => write!(f, "CLEAR_GAME_DATA"),
            Self::NEW_GAME => write!(f, "NEW_GAME"),
            Self::BEGIN_NETWORK_MESSAGES => write!(f, "BEGIN_NETWORK_MESSAGES"),
            Self::LOGIC_CRC => write!(f, "LOGIC_CRC"),
            Self::END_NETWORK_MESSAGES => write!(f, "END_NETWORK_MESSAGES"),
            Self(raw) => write!(f, "#{raw}"),
        }
    }
}

impl From<u32> for CommandType {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

/// The closed set of argument kinds.
///
/// The discriminant is the one-byte tag used in run descriptors. Adding a
/// kind is a format change.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum ArgKind {
    /// Signed 32-bit integer.
    Integer = 0,
    /// 32-bit float.
    Real = 1,
    /// Boolean flag.
    Boolean = 2,
    /// [`ObjectId`].
    ObjectId = 3,
    /// [`DrawableId`].
    DrawableId = 4,
    /// [`TeamId`].
    TeamId = 5,
    /// [`Coord3`].
    Location = 6,
    /// [`ICoord2`].
    Pixel = 7,
    /// [`IRegion2`].
    PixelRegion = 8,
    /// Unsigned 32-bit timestamp.
    Timestamp = 9,
    /// One UTF-16 code unit.
    WideChar = 10,
}

impl ArgKind {
    /// Every kind, in tag order.
    pub const ALL: [ArgKind; 11] = [
        ArgKind::Integer,
        ArgKind::Real,
        ArgKind::Boolean,
        ArgKind::ObjectId,
        ArgKind::DrawableId,
        ArgKind::TeamId,
        ArgKind::Location,
        ArgKind::Pixel,
        ArgKind::PixelRegion,
        ArgKind::Timestamp,
        ArgKind::WideChar,
    ];

    /// The wire tag for this kind.
    pub fn tag(self) -> u8 {
        self as u8
    }

    /// Look up a kind by its wire tag.
    pub fn from_tag(tag: u8) -> Option<Self> {
        Self::ALL.get(usize::from(tag)).copied()
    }
}

/// A single typed command argument.
///
/// One variant per [`ArgKind`]; [`ArgValue::kind`] is the mapping.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ArgValue {
    /// Signed integer.
    Integer(i32),
    /// Float.
    Real(f32),
    /// Boolean flag.
    Boolean(bool),
    /// Object reference.
    ObjectId(ObjectId),
    /// Drawable reference.
    DrawableId(DrawableId),
    /// Team reference.
    TeamId(TeamId),
    /// World-space location.
    Location(Coord3),
    /// Screen pixel.
    Pixel(ICoord2),
    /// Screen rectangle.
    PixelRegion(IRegion2),
    /// Timestamp.
    Timestamp(u32),
    /// UTF-16 code unit.
    WideChar(u16),
}

impl ArgValue {
    /// The kind of this value.
    pub fn kind(&self) -> ArgKind {
        match self {
            Self::Integer(_) => ArgKind::Integer,
            Self::Real(_) => ArgKind::Real,
            Self::Boolean(_) => ArgKind::Boolean,
            Self::ObjectId(_) => ArgKind::ObjectId,
            Self::DrawableId(_) => ArgKind::DrawableId,
            Self::TeamId(_) => ArgKind::TeamId,
            Self::Location(_) => ArgKind::Location,
            Self::Pixel(_) => ArgKind::Pixel,
            Self::PixelRegion(_) => ArgKind::PixelRegion,
            Self::Timestamp(_) => ArgKind::Timestamp,
            Self::WideChar(_) => ArgKind::WideChar,
        }
    }

    /// The integer payload, if this is an [`ArgValue::Integer`].
    pub fn as_integer(&self) -> Option<i32> {
        match *self {
            Self::Integer(v) => Some(v),
            _ => None,
        }
    }

    /// Bitwise equality: floats compare by bit pattern, so `NaN == NaN`
    /// and `0.0 != -0.0`.
    pub fn bit_eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Real(a), Self::Real(b)) => a.to_bits() == b.to_bits(),
            (Self::Location(a), Self::Location(b)) => {
                a.x.to_bits() == b.x.to_bits()
                    && a.y.to_bits() == b.y.to_bits()
                    && a.z.to_bits() == b.z.to_bits()
            }
            _ => self == other,
        }
    }
}

/// Argument storage. Most commands carry four or fewer arguments.
pub type ArgList = SmallVec<[ArgValue; 4]>;

/// A command issued by a player.
///
/// The frame a command executes on is not part of the command; the
/// recorder stamps it when logging.
///
/// # Examples
///
/// ```
/// use genrep_core::{ArgValue, Command, CommandType, ObjectId};
///
/// let cmd = Command::new(CommandType(1068), 0)
///     .with_arg(ArgValue::ObjectId(ObjectId(12)))
///     .with_arg(ArgValue::Integer(3));
///
/// assert_eq!(cmd.args.len(), 2);
/// assert_eq!(cmd.integer_arg(1), Some(3));
/// assert_eq!(cmd.integer_arg(0), None);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct Command {
    /// What the command does.
    pub command_type: CommandType,
    /// Index of the issuing player in the host's player list.
    pub player_index: i32,
    /// Ordered, heterogeneous arguments.
    pub args: ArgList,
}

impl Command {
    /// A command with no arguments.
    pub fn new(command_type: CommandType, player_index: i32) -> Self {
        Self {
            command_type,
            player_index,
            args: ArgList::new(),
        }
    }

    /// Append an argument, builder style.
    pub fn with_arg(mut self, arg: ArgValue) -> Self {
        self.args.push(arg);
        self
    }

    /// Append an argument in place.
    pub fn push_arg(&mut self, arg: ArgValue) {
        self.args.push(arg);
    }

    /// The `index`-th argument if it is an integer.
    pub fn integer_arg(&self, index: usize) -> Option<i32> {
        self.args.get(index).and_then(ArgValue::as_integer)
    }

    /// Argument-wise [`ArgValue::bit_eq`] plus type and player equality.
    pub fn bit_eq(&self, other: &Self) -> bool {
        self.command_type == other.command_type
            && self.player_index == other.player_index
            && self.args.len() == other.args.len()
            && self.args.iter().zip(&other.args).all(|(a, b)| a.bit_eq(b))
    }
}
