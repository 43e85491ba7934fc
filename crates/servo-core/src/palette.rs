//! Per-tile configuration: opacity, emission, conversion and behavior.

use crate::error::Error;
use crate::types::Tile;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Opacity of transparent tiles
pub const TRANSPARENT_OPACITY: u8 = 1;
/// Opacity of every solid tile in the default palette
pub const SOLID_OPACITY: u8 = 3;

/// Reactive logic a tile spawns into its cell when placed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BehaviorKind {
    /// Joins the cell into a duct network
    Duct,
}

/// Properties of one tile type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileProperties {
    /// Light lost when propagating into this tile (at least 1)
    pub opacity: u8,
    /// Tile is a point light source
    #[serde(default)]
    pub emits_light: bool,
    /// Tile a duct network turns this tile into
    #[serde(default)]
    pub converts_to: Option<Tile>,
    /// Behavior spawned when the tile is placed
    #[serde(default)]
    pub behavior: Option<BehaviorKind>,
}

impl TileProperties {
    pub fn transparent() -> Self {
        Self {
            opacity: TRANSPARENT_OPACITY,
            emits_light: false,
            converts_to: None,
            behavior: None,
        }
    }

    pub fn solid() -> Self {
        Self {
            opacity: SOLID_OPACITY,
            emits_light: false,
            converts_to: None,
            behavior: None,
        }
    }

    pub fn emitting(mut self) -> Self {
        self.emits_light = true;
        self
    }

    pub fn converting_to(mut self, tile: Tile) -> Self {
        self.converts_to = Some(tile);
        self
    }

    pub fn with_behavior(mut self, kind: BehaviorKind) -> Self {
        self.behavior = Some(kind);
        self
    }
}

/// Lookup table from tile to its properties, one entry per tile.
///
/// Serialized as a map keyed by tile name; deserialization validates the table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    try_from = "BTreeMap<Tile, TileProperties>",
    into = "BTreeMap<Tile, TileProperties>"
)]
pub struct TilePalette {
    entries: [TileProperties; Tile::COUNT],
}

impl TilePalette {
    pub fn get(&self, tile: Tile) -> &TileProperties {
        &self.entries[tile.index()]
    }

    pub fn opacity(&self, tile: Tile) -> u8 {
        self.get(tile).opacity
    }

    pub fn emits_light(&self, tile: Tile) -> bool {
        self.get(tile).emits_light
    }

    pub fn converts_to(&self, tile: Tile) -> Option<Tile> {
        self.get(tile).converts_to
    }

    pub fn behavior(&self, tile: Tile) -> Option<BehaviorKind> {
        self.get(tile).behavior
    }

    /// Tiles spawning the duct behavior take part in duct networks
    pub fn is_conductive(&self, tile: Tile) -> bool {
        self.behavior(tile) == Some(BehaviorKind::Duct)
    }

    /// Replace the properties of one tile, re-validating the result
    pub fn with(mut self, tile: Tile, properties: TileProperties) -> crate::Result<Self> {
        self.entries[tile.index()] = properties;
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> crate::Result<()> {
        if self.behavior(Tile::Air).is_some() {
            return Err(Error::Validation(
                "air must not spawn a behavior".to_string(),
            ));
        }
        for tile in Tile::ALL {
            let properties = self.get(tile);
            if properties.opacity == 0 {
                return Err(Error::Validation(format!(
                    "tile {tile} has zero opacity"
                )));
            }
            if properties.converts_to == Some(tile) {
                return Err(Error::Validation(format!(
                    "tile {tile} converts to itself"
                )));
            }
        }
        Ok(())
    }
}

impl Default for TilePalette {
    fn default() -> Self {
        Self {
            entries: [
                TileProperties::transparent(),
                TileProperties::solid().converting_to(Tile::Grass),
                TileProperties::solid(),
                TileProperties::solid().with_behavior(BehaviorKind::Duct),
                TileProperties::solid().emitting(),
                TileProperties::solid().emitting(),
            ],
        }
    }
}

impl TryFrom<BTreeMap<Tile, TileProperties>> for TilePalette {
    type Error = Error;

    fn try_from(mut map: BTreeMap<Tile, TileProperties>) -> Result<Self, Self::Error> {
        let mut entries = [TileProperties::transparent(); Tile::COUNT];
        for tile in Tile::ALL {
            entries[tile.index()] = map
                .remove(&tile)
                .ok_or_else(|| Error::Validation(format!("palette has no entry for {tile}")))?;
        }
        let palette = Self { entries };
        palette.validate()?;
        Ok(palette)
    }
}

impl From<TilePalette> for BTreeMap<Tile, TileProperties> {
    fn from(palette: TilePalette) -> Self {
        Tile::ALL
            .into_iter()
            .map(|tile| (tile, *palette.get(tile)))
            .collect()
    }
}
