//! Configuration types for the world and the headless driver.

use crate::error::{Error, Result};
use crate::palette::TilePalette;
use crate::types::{Position, Tile};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// World configuration parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Width of the world grid
    pub width: i32,
    /// Height of the world grid
    pub height: i32,
    /// Seed for network colors and terrain
    pub seed: u64,
    /// Interval between duct network ticks (milliseconds)
    pub duct_tick_interval_ms: u64,
    /// Rebuild networks next to a removed duct immediately instead of waiting
    /// for the next placement to rediscover them
    pub eager_duct_resplit: bool,
    /// Generated terrain; `None` starts from an all-air world
    pub terrain: Option<TerrainConfig>,
    /// Per-tile properties
    pub palette: TilePalette,
}

impl WorldConfig {
    pub fn duct_tick_interval(&self) -> Duration {
        Duration::from_millis(self.duct_tick_interval_ms)
    }

    pub fn validate(&self) -> Result<()> {
        if self.width < 1 || self.height < 1 {
            return Err(Error::Validation(format!(
                "world size must be at least 1x1, got {}x{}",
                self.width, self.height
            )));
        }
        self.width.checked_mul(self.height).ok_or_else(|| {
            Error::Validation(format!(
                "world size {}x{} overflows",
                self.width, self.height
            ))
        })?;
        if self.duct_tick_interval_ms == 0 {
            return Err(Error::Validation(
                "duct tick interval must be positive".to_string(),
            ));
        }
        if let Some(terrain) = &self.terrain {
            if terrain.roughness < 0 {
                return Err(Error::Validation(format!(
                    "terrain roughness must not be negative, got {}",
                    terrain.roughness
                )));
            }
            for tile in [Tile::Dirt, Tile::Grass] {
                if self.palette.behavior(tile).is_some() {
                    return Err(Error::Validation(format!(
                        "terrain tile {tile} must not spawn a behavior"
                    )));
                }
            }
        }
        self.palette.validate()
    }
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            width: 64,
            height: 64,
            seed: 0,
            duct_tick_interval_ms: 1000,
            eager_duct_resplit: false,
            terrain: None,
            palette: TilePalette::default(),
        }
    }
}

/// Generated ground: dirt from the surface row down, one grass cell on top
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainConfig {
    /// Starting surface row of the leftmost column
    pub surface_row: i32,
    /// Maximum change of the surface row between adjacent columns
    pub roughness: i32,
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            surface_row: 40,
            roughness: 1,
        }
    }
}

/// A scripted tile change applied by the driver at the start of a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileEdit {
    pub frame: u64,
    pub x: i32,
    pub y: i32,
    pub tile: Tile,
}

impl TileEdit {
    pub fn position(&self) -> Position {
        Position::new(self.x, self.y)
    }
}

/// Headless session: a world, a frame schedule and scripted edits
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub world: WorldConfig,
    /// Number of frames to run
    pub frames: u64,
    /// Simulated time per frame (milliseconds)
    pub frame_ms: u64,
    /// Edits in any order; applied in frame order, file order within a frame
    pub edits: Vec<TileEdit>,
}

impl SessionConfig {
    pub fn frame_duration(&self) -> Duration {
        Duration::from_millis(self.frame_ms)
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: SessionConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> Result<()> {
        self.world.validate()?;
        if let Some(edit) = self.edits.iter().find(|edit| edit.frame >= self.frames) {
            return Err(Error::Validation(format!(
                "edit at {} scheduled for frame {} but the session has {} frames",
                edit.position(),
                edit.frame,
                self.frames
            )));
        }
        Ok(())
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            world: WorldConfig::default(),
            frames: 600,
            frame_ms: 16,
            edits: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_configs() {
        let world_config = WorldConfig::default();
        assert_eq!(world_config.width, 64);
        assert_eq!(world_config.height, 64);
        assert_eq!(world_config.duct_tick_interval(), Duration::from_secs(1));
        assert!(world_config.validate().is_ok());

        let session = SessionConfig::default();
        assert_eq!(session.frames, 600);
        assert!(session.validate().is_ok());
    }

    #[test]
    fn test_world_config_rejects_empty_grid() {
        let config = WorldConfig {
            width: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(Error::Validation(_))));
    }

    #[test]
    fn test_world_config_rejects_zero_interval() {
        let config = WorldConfig {
            duct_tick_interval_ms: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_session_from_partial_json() {
        let json = r#"{
            "world": { "width": 8, "height": 4, "terrain": { "surface_row": 2 } },
            "frames": 10,
            "edits": [ { "frame": 3, "x": 1, "y": 1, "tile": "ItemDuct" } ]
        }"#;
        let session = SessionConfig::from_json_str(json).unwrap();
        assert_eq!(session.world.width, 8);
        assert_eq!(session.world.height, 4);
        assert_eq!(session.world.terrain.as_ref().unwrap().surface_row, 2);
        assert_eq!(session.world.terrain.as_ref().unwrap().roughness, 1);
        assert_eq!(session.frame_ms, 16);
        assert_eq!(session.edits[0].tile, Tile::ItemDuct);
        assert_eq!(session.edits[0].position(), Position::new(1, 1));
    }

    #[test]
    fn test_session_rejects_late_edit() {
        let json = r#"{ "frames": 2, "edits": [ { "frame": 2, "x": 0, "y": 0, "tile": "Dirt" } ] }"#;
        assert!(SessionConfig::from_json_str(json).is_err());
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let result = SessionConfig::from_path("/nonexistent/servo-session.json");
        assert!(matches!(result, Err(Error::Io(_))));
    }
}
