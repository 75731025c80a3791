//! Strongly-typed identifiers and the small geometric value types
//! carried by command arguments.

use std::fmt;

/// Identifies a simulation object (unit, structure, projectile).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(pub u32);

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for ObjectId {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

/// Identifies a client-side drawable.
///
/// Drawables only exist on the presentation side, but some commands
/// reference them (e.g. selection feedback), so they are logged verbatim.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DrawableId(pub u32);

impl fmt::Display for DrawableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for DrawableId {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

/// Identifies a team (a selection group owned by a player).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TeamId(pub u32);

impl fmt::Display for TeamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for TeamId {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

/// A world-space location.
///
/// Equality is bitwise-insensitive (`f32` semantics); the codec compares
/// raw bits where it matters.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Coord3 {
    /// East-west axis.
    pub x: f32,
    /// North-south axis.
    pub y: f32,
    /// Height.
    pub z: f32,
}

impl Coord3 {
    /// Construct a location from its three components.
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

/// A screen-space pixel position.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct ICoord2 {
    /// Horizontal pixel.
    pub x: i32,
    /// Vertical pixel.
    pub y: i32,
}

impl ICoord2 {
    /// Construct a pixel position.
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// A screen-space rectangle given by its low and high corners.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct IRegion2 {
    /// Top-left corner.
    pub lo: ICoord2,
    /// Bottom-right corner.
    pub hi: ICoord2,
}

impl IRegion2 {
    /// Construct a region from its corners.
    pub const fn new(lo: ICoord2, hi: ICoord2) -> Self {
        Self { lo, hi }
    }

    /// Width of the region in pixels (may be negative for inverted regions).
    pub fn width(&self) -> i32 {
        self.hi.x - self.lo.x
    }

    /// Height of the region in pixels (may be negative for inverted regions).
    pub fn height(&self) -> i32 {
        self.hi.y - self.lo.y
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_display_raw_value() {
        assert_eq!(ObjectId(7).to_string(), "7");
        assert_eq!(DrawableId::from(9).to_string(), "9");
        assert_eq!(TeamId(0).to_string(), "0");
    }

    #[test]
    fn region_extent() {
        let r = IRegion2::new(ICoord2::new(10, 20), ICoord2::new(30, 25));
        assert_eq!(r.width(), 20);
        assert_eq!(r.height(), 5);
    }
}
