//! Reusable command fixtures.
//!
//! Command types in the network range stand in for real game commands:
//!
//! - [`MOVE`], [`ATTACK`], [`BUILD`] carry typed arguments.
//! - [`crc_command`] builds the periodic checksum command.

use genrep_core::{
    ArgValue, Command, CommandType, Coord3, DrawableId, ICoord2, IRegion2, ObjectId, TeamId,
};

/// A unit move order.
pub const MOVE: CommandType = CommandType(1068);
/// An attack order.
pub const ATTACK: CommandType = CommandType(1071);
/// A build order.
pub const BUILD: CommandType = CommandType(1049);
/// A front-end command outside the network range.
pub const UI_ONLY: CommandType = CommandType(512);

pub fn move_command(player: i32, value: i32) -> Command {
    Command::new(MOVE, player).with_arg(ArgValue::Integer(value))
}

pub fn attack_command(player: i32, attacker: i32, target: i32) -> Command {
    Command::new(ATTACK, player)
        .with_arg(ArgValue::Integer(attacker))
        .with_arg(ArgValue::Integer(target))
}

/// A command using every argument kind once, in tag order.
pub fn build_command(player: i32) -> Command {
    Command::new(BUILD, player)
        .with_arg(ArgValue::Integer(-7))
        .with_arg(ArgValue::Real(0.125))
        .with_arg(ArgValue::Boolean(true))
        .with_arg(ArgValue::ObjectId(ObjectId(101)))
        .with_arg(ArgValue::DrawableId(DrawableId(202)))
        .with_arg(ArgValue::TeamId(TeamId(3)))
        .with_arg(ArgValue::Location(Coord3::new(120.0, -45.5, 8.25)))
        .with_arg(ArgValue::Pixel(ICoord2::new(640, 480)))
        .with_arg(ArgValue::PixelRegion(IRegion2::new(
            ICoord2::new(10, 20),
            ICoord2::new(300, 200),
        )))
        .with_arg(ArgValue::Timestamp(1_050_000_000))
        .with_arg(ArgValue::WideChar(u16::from(b'G')))
}

/// The periodic checksum command. The checksum travels as the bit pattern
/// of an integer argument, followed by the "from playback" flag.
pub fn crc_command(player: i32, crc: u32) -> Command {
    Command::new(CommandType::LOGIC_CRC, player)
        .with_arg(ArgValue::Integer(crc as i32))
        .with_arg(ArgValue::Boolean(false))
}

pub fn clear_game_data() -> Command {
    Command::new(CommandType::CLEAR_GAME_DATA, -1)
}
