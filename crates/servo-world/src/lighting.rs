//! Incremental two-channel lighting.
//!
//! Each cell holds a sky value and a point value in `0..=15`. A cell's value
//! is a pure function of its tile and its four neighbors' values:
//!
//! - sky is full for air, otherwise the brightest neighbor's sky minus the
//!   tile's opacity;
//! - point is full for emitters, otherwise the brightest neighbor's point
//!   minus the tile's opacity.
//!
//! [`LightEngine::settle`] relaxes a stack of possibly stale cells until every
//! cell satisfies that rule. A changed cell queues its neighbors, so both the
//! spread of new light and the retraction of removed light ripple outwards
//! only as far as values actually change.

use crate::grid::Grid;
use serde::{Deserialize, Serialize};
use servo_core::Position;
use tracing::debug;

/// Brightest value of either channel
pub const MAX_LIGHT: u8 = 15;

const SKY_SHIFT: u32 = 4;
const SKY_MASK: u8 = 0xF0;
const POINT_MASK: u8 = 0x0F;

/// Light at one cell
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Light {
    pub sky: u8,
    pub point: u8,
}

impl Light {
    pub const DARK: Light = Light { sky: 0, point: 0 };

    /// Light of an open-sky air cell with no nearby emitter
    pub const OPEN_SKY: Light = Light {
        sky: MAX_LIGHT,
        point: 0,
    };

    /// Brighter of the two channels
    pub fn visible(&self) -> u8 {
        self.sky.max(self.point)
    }

    /// Visible light scaled to `0.0..=1.0`
    pub fn brightness(&self) -> f32 {
        self.visible() as f32 / MAX_LIGHT as f32
    }

    fn pack(self) -> u8 {
        ((self.sky << SKY_SHIFT) & SKY_MASK) | (self.point & POINT_MASK)
    }

    fn unpack(byte: u8) -> Self {
        Self {
            sky: (byte & SKY_MASK) >> SKY_SHIFT,
            point: byte & POINT_MASK,
        }
    }
}

/// Packed light values plus the per-column height cache
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LightField {
    width: i32,
    height: i32,
    cells: Vec<u8>,
    column_tops: Vec<Option<i32>>,
}

impl LightField {
    /// Field of an all-air grid: full sky everywhere, no point light
    pub fn new(width: i32, height: i32) -> Self {
        assert!(width > 0 && height > 0, "light field dimensions must be positive");
        Self {
            width,
            height,
            cells: vec![Light::OPEN_SKY.pack(); (width * height) as usize],
            column_tops: vec![None; width as usize],
        }
    }

    pub fn in_bounds(&self, pos: Position) -> bool {
        pos.x >= 0 && pos.x < self.width && pos.y >= 0 && pos.y < self.height
    }

    fn index(&self, pos: Position) -> Option<usize> {
        self.in_bounds(pos)
            .then(|| (pos.y * self.width + pos.x) as usize)
    }

    /// Light at position, dark outside the field
    pub fn get(&self, pos: Position) -> Light {
        self.index(pos)
            .map_or(Light::DARK, |index| Light::unpack(self.cells[index]))
    }

    pub fn sky(&self, pos: Position) -> u8 {
        self.get(pos).sky
    }

    pub fn point(&self, pos: Position) -> u8 {
        self.get(pos).point
    }

    fn store(&mut self, index: usize, light: Light) {
        self.cells[index] = light.pack();
    }

    /// Cached topmost non-air row of a column
    pub fn column_top(&self, x: i32) -> Option<i32> {
        usize::try_from(x)
            .ok()
            .and_then(|x| self.column_tops.get(x).copied().flatten())
    }

    fn update_column_top(&mut self, grid: &Grid, pos: Position) {
        let Some(slot) = usize::try_from(pos.x)
            .ok()
            .and_then(|x| self.column_tops.get_mut(x))
        else {
            return;
        };

        if !grid.tile(pos).is_air() {
            if slot.map_or(true, |top| pos.y < top) {
                *slot = Some(pos.y);
            }
        } else if *slot == Some(pos.y) {
            *slot = grid.column_top_from(pos.x, pos.y + 1);
        }
    }
}

/// Outcome of one [`LightEngine::settle`] pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettleStats {
    /// Cells popped from the worklist and recomputed
    pub visited: usize,
    /// Cells whose stored light changed
    pub updated: usize,
}

/// Light field plus the worklist of cells that may be stale
#[derive(Debug, Clone)]
pub struct LightEngine {
    field: LightField,
    pending: Vec<Position>,
}

impl LightEngine {
    pub fn new(width: i32, height: i32) -> Self {
        Self {
            field: LightField::new(width, height),
            pending: Vec::new(),
        }
    }

    /// Engine sized for the grid and already relaxed against it
    pub fn for_grid(grid: &Grid) -> Self {
        let mut engine = Self::new(grid.width(), grid.height());
        engine.rebuild(grid);
        engine.settle(grid);
        engine
    }

    pub fn field(&self) -> &LightField {
        &self.field
    }

    pub fn light(&self, pos: Position) -> Light {
        self.field.get(pos)
    }

    /// Number of cells waiting to be recomputed
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Queue a cell for recomputation
    pub fn mark_dirty(&mut self, pos: Position) {
        if self.field.in_bounds(pos) {
            self.pending.push(pos);
        }
    }

    /// Record a tile change at `pos`
    pub fn note_tile_changed(&mut self, grid: &Grid, pos: Position) {
        self.mark_dirty(pos);
        self.field.update_column_top(grid, pos);
    }

    /// Reinitialize the field for an arbitrary grid.
    ///
    /// Air above a column's top is already at its final sky value, so only the
    /// cells from the top down are zeroed and queued. Call [`Self::settle`]
    /// afterwards.
    pub fn rebuild(&mut self, grid: &Grid) {
        self.pending.clear();

        for x in 0..self.field.width {
            let top = grid.column_top(x);
            self.field.column_tops[x as usize] = top;
            let first_queued = top.unwrap_or(self.field.height);

            for y in 0..self.field.height {
                let pos = Position::new(x, y);
                let index = (y * self.field.width + x) as usize;
                if y < first_queued {
                    self.field.store(index, Light::OPEN_SKY);
                } else {
                    self.field.store(index, Light::DARK);
                    self.pending.push(pos);
                }
            }
        }

        debug!(queued = self.pending.len(), "Rebuilt light field");
    }

    /// Drain the worklist until every cell satisfies the relaxation rule
    pub fn settle(&mut self, grid: &Grid) -> SettleStats {
        let mut stats = SettleStats::default();

        while let Some(pos) = self.pending.pop() {
            let Some(index) = self.field.index(pos) else {
                continue;
            };
            stats.visited += 1;

            let relaxed = self.relax(grid, pos);
            if relaxed == Light::unpack(self.field.cells[index]) {
                continue;
            }

            self.field.store(index, relaxed);
            stats.updated += 1;

            for side in pos.neighbors() {
                if self.field.in_bounds(side) {
                    self.pending.push(side);
                }
            }
        }

        if stats.updated > 0 {
            debug!(
                visited = stats.visited,
                updated = stats.updated,
                "Settled lighting"
            );
        }

        stats
    }

    /// Value the rule assigns to `pos` given its neighbors' stored light
    fn relax(&self, grid: &Grid, pos: Position) -> Light {
        let tile = grid.tile(pos);
        let properties = grid.palette().get(tile);

        let (mut sky_in, mut point_in) = (0u8, 0u8);
        for side in pos.neighbors() {
            let light = self.field.get(side);
            sky_in = sky_in.max(light.sky);
            point_in = point_in.max(light.point);
        }

        Light {
            sky: if tile.is_air() {
                MAX_LIGHT
            } else {
                sky_in.saturating_sub(properties.opacity)
            },
            point: if properties.emits_light {
                MAX_LIGHT
            } else {
                point_in.saturating_sub(properties.opacity)
            },
        }
    }

    /// Whether every cell already satisfies the relaxation rule
    pub fn is_settled(&self, grid: &Grid) -> bool {
        grid.positions()
            .all(|pos| self.relax(grid, pos) == self.field.get(pos))
    }
}
