//! Reactive per-cell behaviors spawned by tiles.

use crate::ducts::{DuctNetworks, NetworkId};
use crate::grid::Grid;
use servo_core::{BehaviorKind, Position};

/// Behavior owned by a single grid cell.
///
/// Hooks receive the grid and the duct networks explicitly. They must not
/// call back into [`crate::World`]; the world is mid-mutation while they run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellBehavior {
    Duct(DuctCell),
}

/// Duct state: the network this cell currently belongs to
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DuctCell {
    pub(crate) network: Option<NetworkId>,
}

impl DuctCell {
    pub fn network(&self) -> Option<NetworkId> {
        self.network
    }
}

impl CellBehavior {
    /// Fresh behavior for a newly placed tile
    pub fn spawn(kind: BehaviorKind) -> Self {
        match kind {
            BehaviorKind::Duct => CellBehavior::Duct(DuctCell::default()),
        }
    }

    pub fn as_duct(&self) -> Option<&DuctCell> {
        match self {
            CellBehavior::Duct(cell) => Some(cell),
        }
    }

    /// Runs after the tile is stored and this behavior attached
    pub(crate) fn on_place(self, grid: &mut Grid, ducts: &mut DuctNetworks, pos: Position) {
        match self {
            CellBehavior::Duct(_) => ducts.on_conductive_placed(grid, pos),
        }
    }

    /// Runs while the old tile is still in place
    pub(crate) fn on_pre_remove(self, grid: &mut Grid, ducts: &mut DuctNetworks, pos: Position) {
        match self {
            CellBehavior::Duct(_) => ducts.on_conductive_removed(grid, pos),
        }
    }

    /// Runs after the cell has been cleared to air, before detaching
    pub(crate) fn on_remove(self, grid: &mut Grid, ducts: &mut DuctNetworks, pos: Position) {
        match self {
            CellBehavior::Duct(_) => ducts.on_conductive_cleared(grid, pos),
        }
    }
}
