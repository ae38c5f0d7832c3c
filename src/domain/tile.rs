/// Tile kinds and their properties.
/// Properties are queried via methods, not stored as flags,
/// so tile semantics are centralized here.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::LevelError;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum TileKind {
    Grass,
    Stone,
    EvilPurple,
    PyramidYellow,
    EmeraldGreen,
    DiamondBlue,
    CastleBlue,
    GrassPurple,
    GrassThickSnow, // Deep snow: locks horizontal movement
    PlainSnow,
    Ice,            // Slippery: horizontal speed decays instead of stopping
    WinTiles,       // Ends the attempt when stood on
}

/// How a tile behaves when the player stands on it.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Surface {
    None,
    Solid,
    Ice,
    Snow,
    Win,
}

impl TileKind {
    pub const ALL: [TileKind; 12] = [
        TileKind::Grass,
        TileKind::Stone,
        TileKind::EvilPurple,
        TileKind::PyramidYellow,
        TileKind::EmeraldGreen,
        TileKind::DiamondBlue,
        TileKind::CastleBlue,
        TileKind::GrassPurple,
        TileKind::GrassThickSnow,
        TileKind::PlainSnow,
        TileKind::Ice,
        TileKind::WinTiles,
    ];

    /// Does this tile take part in collision?
    pub fn is_solid(self) -> bool {
        matches!(
            self,
            TileKind::Grass
                | TileKind::Stone
                | TileKind::EvilPurple
                | TileKind::PyramidYellow
                | TileKind::EmeraldGreen
                | TileKind::DiamondBlue
                | TileKind::CastleBlue
                | TileKind::GrassPurple
                | TileKind::GrassThickSnow
                | TileKind::PlainSnow
                | TileKind::Ice
                | TileKind::WinTiles
        )
    }

    /// Surface effect when an entity lands on this tile.
    /// Plain snow is cosmetic; only the thick variant locks movement.
    pub fn surface(self) -> Surface {
        match self {
            TileKind::Ice => Surface::Ice,
            TileKind::GrassThickSnow => Surface::Snow,
            TileKind::WinTiles => Surface::Win,
            k if k.is_solid() => Surface::Solid,
            _ => Surface::None,
        }
    }

    /// Name used in level files.
    pub fn name(self) -> &'static str {
        match self {
            TileKind::Grass          => "grass",
            TileKind::Stone          => "stone",
            TileKind::EvilPurple     => "Evil-Purple",
            TileKind::PyramidYellow  => "Pyramid-Yellow",
            TileKind::EmeraldGreen   => "Emerald-Green",
            TileKind::DiamondBlue    => "Diamond-Blue",
            TileKind::CastleBlue     => "Castle-blue",
            TileKind::GrassPurple    => "grass_purple",
            TileKind::GrassThickSnow => "grass_thick_snow",
            TileKind::PlainSnow      => "plain_snow",
            TileKind::Ice            => "ice",
            TileKind::WinTiles       => "win_tiles",
        }
    }
}

impl fmt::Display for TileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TileKind {
    type Err = LevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TileKind::ALL
            .iter()
            .copied()
            .find(|k| k.name() == s)
            .ok_or_else(|| LevelError::UnknownTileKind(s.to_string()))
    }
}

impl Serialize for TileKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

impl<'de> Deserialize<'de> for TileKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        name.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_kind_round_trips_through_its_name() {
        for kind in TileKind::ALL {
            assert_eq!(kind.name().parse::<TileKind>().unwrap(), kind);
        }
    }

    #[test]
    fn unknown_name_is_rejected() {
        let err = "lava".parse::<TileKind>().unwrap_err();
        assert!(matches!(err, LevelError::UnknownTileKind(ref n) if n == "lava"));
    }

    #[test]
    fn all_current_kinds_are_solid() {
        assert!(TileKind::ALL.iter().all(|k| k.is_solid()));
    }

    #[test]
    fn surfaces() {
        assert_eq!(TileKind::Ice.surface(), Surface::Ice);
        assert_eq!(TileKind::GrassThickSnow.surface(), Surface::Snow);
        assert_eq!(TileKind::PlainSnow.surface(), Surface::Solid);
        assert_eq!(TileKind::WinTiles.surface(), Surface::Win);
        assert_eq!(TileKind::Stone.surface(), Surface::Solid);
    }
}
