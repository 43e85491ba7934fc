//! World context: owns the grid, duct networks, lighting and tick clock.

use crate::behavior::CellBehavior;
use crate::clock::TickClock;
use crate::ducts::{DuctNetworks, NetworkColor, NetworkId};
use crate::grid::Grid;
use crate::lighting::{Light, LightEngine, SettleStats};
use serde::{Deserialize, Serialize};
use servo_core::{Position, Result, Tile, WorldConfig};
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument};

/// Renderer-facing view of one duct network
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkSummary {
    pub id: NetworkId,
    pub color: NetworkColor,
    pub members: Vec<Position>,
}

/// Result of advancing the tick clock
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickReport {
    /// Network ticks run
    pub ticks: u32,
    /// Tiles converted across those ticks
    pub conversions: usize,
}

/// Everything that happened during one frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameReport {
    pub ticks: TickReport,
    pub lighting: SettleStats,
}

/// The simulated world.
///
/// All mutation goes through [`World::set_tile`], which runs cell behavior
/// hooks and notifies the lighting engine in the same call. Light is only
/// brought up to date by [`World::settle_lighting`]; reads in between see
/// the previous fixed point for cells that have not been recomputed yet.
#[derive(Debug, Clone)]
pub struct World {
    grid: Grid,
    ducts: DuctNetworks,
    light: LightEngine,
    clock: TickClock,
    ticks: u64,
}

impl World {
    pub fn new(config: WorldConfig) -> Result<Self> {
        config.validate()?;

        let grid = Grid::from_config(&config);
        let light = LightEngine::for_grid(&grid);
        let ducts = DuctNetworks::from_config(&config);
        let clock = TickClock::new(config.duct_tick_interval());

        info!(
            width = config.width,
            height = config.height,
            seed = config.seed,
            terrain = config.terrain.is_some(),
            eager_duct_resplit = config.eager_duct_resplit,
            "Created world"
        );

        Ok(Self {
            grid,
            ducts,
            light,
            clock,
            ticks: 0,
        })
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn ducts(&self) -> &DuctNetworks {
        &self.ducts
    }

    pub fn light_engine(&self) -> &LightEngine {
        &self.light
    }

    pub fn clock(&self) -> &TickClock {
        &self.clock
    }

    /// Network ticks run since creation
    pub fn tick_count(&self) -> u64 {
        self.ticks
    }

    pub fn tile(&self, pos: Position) -> Tile {
        self.grid.tile(pos)
    }

    pub fn behavior(&self, pos: Position) -> Option<&CellBehavior> {
        self.grid.behavior(pos)
    }

    pub fn light(&self, pos: Position) -> Light {
        self.light.light(pos)
    }

    /// Replace the tile at `pos`, running teardown hooks for the old cell and
    /// placement hooks for the new one. Returns false outside the grid.
    pub fn set_tile(&mut self, pos: Position, tile: Tile) -> bool {
        if !self.grid.in_bounds(pos) {
            return false;
        }

        if let Some(old) = self.grid.behavior(pos).copied() {
            old.on_pre_remove(&mut self.grid, &mut self.ducts, pos);
            self.grid.store_tile(pos, Tile::Air);
            old.on_remove(&mut self.grid, &mut self.ducts, pos);
            self.grid.attach_behavior(pos, None);
        }

        self.grid.store_tile(pos, tile);

        if let Some(kind) = self.grid.palette().behavior(tile) {
            let behavior = CellBehavior::spawn(kind);
            self.grid.attach_behavior(pos, Some(behavior));
            behavior.on_place(&mut self.grid, &mut self.ducts, pos);
        }

        self.light.note_tile_changed(&self.grid, pos);
        true
    }

    /// Run one network tick. Returns the number of tiles converted.
    #[instrument(skip(self), fields(tick = self.ticks))]
    pub fn tick_networks(&mut self) -> usize {
        let start = Instant::now();
        let conversions = self.ducts.conversions(&self.grid);

        for &(pos, tile) in &conversions {
            self.set_tile(pos, tile);
        }
        self.ticks += 1;

        debug!(
            networks = self.ducts.len(),
            conversions = conversions.len(),
            elapsed_us = start.elapsed().as_micros() as u64,
            "Ticked duct networks"
        );

        conversions.len()
    }

    /// Run `intervals` network ticks back to back
    pub fn tick(&mut self, intervals: u32) -> TickReport {
        let mut report = TickReport::default();
        for _ in 0..intervals {
            report.conversions += self.tick_networks();
            report.ticks += 1;
        }
        report
    }

    /// Feed elapsed time to the tick clock and run every tick that became due
    pub fn advance(&mut self, elapsed: Duration) -> TickReport {
        let due = self.clock.advance(elapsed);
        self.tick(due)
    }

    pub fn settle_lighting(&mut self) -> SettleStats {
        self.light.settle(&self.grid)
    }

    /// Advance the clock, then settle lighting
    pub fn frame(&mut self, elapsed: Duration) -> FrameReport {
        let ticks = self.advance(elapsed);
        let lighting = self.settle_lighting();
        FrameReport { ticks, lighting }
    }

    /// Current networks in arena order
    pub fn networks(&self) -> Vec<NetworkSummary> {
        self.ducts
            .iter()
            .map(|(id, network)| NetworkSummary {
                id,
                color: network.color(),
                members: network.members().collect(),
            })
            .collect()
    }

    /// Replace every non-air cell with air, running all teardown hooks.
    /// Returns the number of cells cleared.
    pub fn clear(&mut self) -> usize {
        let occupied: Vec<Position> = self
            .grid
            .iter()
            .filter(|(_, tile)| !tile.is_air())
            .map(|(pos, _)| pos)
            .collect();

        for &pos in &occupied {
            self.set_tile(pos, Tile::Air);
        }

        debug!(cleared = occupied.len(), "Cleared world");
        occupied.len()
    }
}
