//! Fixed-size 2D tile grid.

use crate::behavior::{CellBehavior, DuctCell};
use crate::ducts::NetworkId;
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use servo_core::{Position, TerrainConfig, Tile, TilePalette, WorldConfig};

/// A bounded 2D grid of tiles with one optional behavior per cell.
///
/// Every read is total: coordinates outside the grid read as [`Tile::Air`]
/// with no behavior. Tile mutation that must run behavior hooks goes through
/// [`crate::World::set_tile`].
#[derive(Debug, Clone)]
pub struct Grid {
    width: i32,
    height: i32,
    palette: TilePalette,
    tiles: Vec<Tile>,
    behaviors: Vec<Option<CellBehavior>>,
}

impl Grid {
    pub fn new(width: i32, height: i32, palette: TilePalette) -> Self {
        assert!(width > 0 && height > 0, "grid dimensions must be positive");
        let size = (width * height) as usize;
        Self {
            width,
            height,
            palette,
            tiles: vec![Tile::Air; size],
            behaviors: vec![None; size],
        }
    }

    /// Create a grid from world configuration, laying down terrain if configured
    pub fn from_config(config: &WorldConfig) -> Self {
        let mut grid = Self::new(config.width, config.height, config.palette.clone());

        if let Some(terrain) = &config.terrain {
            let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
            grid.generate_terrain(terrain, &mut rng);
        }

        grid
    }

    fn generate_terrain(&mut self, terrain: &TerrainConfig, rng: &mut ChaCha8Rng) {
        let mut surface = terrain.surface_row;

        for x in 0..self.width {
            if x > 0 && terrain.roughness > 0 {
                surface += rng.gen_range(-terrain.roughness..=terrain.roughness);
            }
            surface = surface.clamp(0, self.height);

            for y in surface..self.height {
                let tile = if y == surface { Tile::Grass } else { Tile::Dirt };
                self.store_tile(Position::new(x, y), tile);
            }
        }
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    /// Number of cells
    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn palette(&self) -> &TilePalette {
        &self.palette
    }

    pub fn in_bounds(&self, pos: Position) -> bool {
        pos.x >= 0 && pos.x < self.width && pos.y >= 0 && pos.y < self.height
    }

    fn index(&self, pos: Position) -> Option<usize> {
        self.in_bounds(pos)
            .then(|| (pos.y * self.width + pos.x) as usize)
    }

    /// Tile at position, `Air` outside the grid
    pub fn tile(&self, pos: Position) -> Tile {
        self.index(pos).map_or(Tile::Air, |index| self.tiles[index])
    }

    /// Behavior attached at position, if any
    pub fn behavior(&self, pos: Position) -> Option<&CellBehavior> {
        self.index(pos)
            .and_then(|index| self.behaviors[index].as_ref())
    }

    /// Whether the tile at position takes part in duct networks
    pub fn is_conductive(&self, pos: Position) -> bool {
        self.palette.is_conductive(self.tile(pos))
    }

    /// Duct state of a conductive cell.
    ///
    /// A cell that is being torn down keeps its behavior for one hook after
    /// its tile has been cleared; it is no longer reported here.
    pub fn duct(&self, pos: Position) -> Option<&DuctCell> {
        if !self.is_conductive(pos) {
            return None;
        }
        self.behavior(pos).and_then(CellBehavior::as_duct)
    }

    /// Network the duct at position belongs to
    pub fn duct_network(&self, pos: Position) -> Option<NetworkId> {
        self.duct(pos).and_then(DuctCell::network)
    }

    pub(crate) fn set_duct_network(&mut self, pos: Position, network: Option<NetworkId>) {
        let Some(index) = self.index(pos) else {
            return;
        };
        if let Some(CellBehavior::Duct(cell)) = &mut self.behaviors[index] {
            cell.network = network;
        }
    }

    /// Overwrite a tile without running hooks. Returns false outside the grid.
    pub(crate) fn store_tile(&mut self, pos: Position, tile: Tile) -> bool {
        match self.index(pos) {
            Some(index) => {
                self.tiles[index] = tile;
                true
            }
            None => false,
        }
    }

    /// Replace the behavior of a cell, returning the previous one
    pub(crate) fn attach_behavior(
        &mut self,
        pos: Position,
        behavior: Option<CellBehavior>,
    ) -> Option<CellBehavior> {
        let index = self.index(pos)?;
        std::mem::replace(&mut self.behaviors[index], behavior)
    }

    /// Topmost non-air row of a column
    pub fn column_top(&self, x: i32) -> Option<i32> {
        self.column_top_from(x, 0)
    }

    /// Topmost non-air row of a column at or below `from_y`
    pub fn column_top_from(&self, x: i32, from_y: i32) -> Option<i32> {
        (from_y.max(0)..self.height).find(|&y| !self.tile(Position::new(x, y)).is_air())
    }

    /// Get position from index
    pub fn index_to_pos(&self, index: usize) -> Position {
        let x = (index as i32) % self.width;
        let y = (index as i32) / self.width;
        Position::new(x, y)
    }

    /// Iterator over all positions, row by row
    pub fn positions(&self) -> impl Iterator<Item = Position> + '_ {
        (0..self.tiles.len()).map(move |i| self.index_to_pos(i))
    }

    /// Iterator over all tiles with positions
    pub fn iter(&self) -> impl Iterator<Item = (Position, Tile)> + '_ {
        self.tiles
            .iter()
            .enumerate()
            .map(move |(i, tile)| (self.index_to_pos(i), *tile))
    }
}
