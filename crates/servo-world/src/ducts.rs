//! Item duct networks: connected components of conductive cells.
//!
//! Networks are re-derived locally with flood fills whenever a duct is placed
//! or removed. Placement dissolves every neighboring network and rebuilds one
//! component from the new cell, which also merges components the new cell
//! bridges. Removal dissolves the whole component of the removed cell; the
//! pieces left behind stay without a network until a later placement next to
//! them rediscovers them, unless eager re-splitting is enabled.

use crate::grid::Grid;
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use servo_core::{Position, Tile, WorldConfig};
use slotmap::{new_key_type, SlotMap};
use std::collections::{BTreeMap, BTreeSet};
use tracing::trace;

new_key_type! {
    /// Stable handle for duct networks backed by a generational slot map.
    pub struct NetworkId;
}

/// Display tint of a network, fixed at creation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl NetworkColor {
    /// Tint of a duct that belongs to no network
    pub const WHITE: NetworkColor = NetworkColor {
        r: 255,
        g: 255,
        b: 255,
    };

    fn random(rng: &mut impl Rng) -> Self {
        Self {
            r: rng.gen(),
            g: rng.gen(),
            b: rng.gen(),
        }
    }
}

/// One connected component of ducts
#[derive(Debug, Clone)]
pub struct Network {
    members: BTreeSet<Position>,
    color: NetworkColor,
}

impl Network {
    pub fn color(&self) -> NetworkColor {
        self.color
    }

    /// Member positions in coordinate order
    pub fn members(&self) -> impl Iterator<Item = Position> + '_ {
        self.members.iter().copied()
    }

    pub fn contains(&self, pos: Position) -> bool {
        self.members.contains(&pos)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// Arena of duct networks plus the traversal scratch stack.
///
/// Not re-entrant: every operation runs its flood fill to completion on the
/// shared stack before returning.
#[derive(Debug, Clone)]
pub struct DuctNetworks {
    networks: SlotMap<NetworkId, Network>,
    stack: Vec<Position>,
    rng: ChaCha8Rng,
    eager_resplit: bool,
}

impl DuctNetworks {
    pub fn new(seed: u64, eager_resplit: bool) -> Self {
        Self {
            networks: SlotMap::with_key(),
            stack: Vec::new(),
            rng: ChaCha8Rng::seed_from_u64(seed),
            eager_resplit,
        }
    }

    pub fn from_config(config: &WorldConfig) -> Self {
        Self::new(config.seed, config.eager_duct_resplit)
    }

    pub fn len(&self) -> usize {
        self.networks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.networks.is_empty()
    }

    pub fn get(&self, id: NetworkId) -> Option<&Network> {
        self.networks.get(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (NetworkId, &Network)> {
        self.networks.iter()
    }

    /// Network of the duct at position
    pub fn network_at(&self, grid: &Grid, pos: Position) -> Option<&Network> {
        grid.duct_network(pos).and_then(|id| self.networks.get(id))
    }

    /// Tint the renderer should use for the cell at position
    pub fn color_at(&self, grid: &Grid, pos: Position) -> NetworkColor {
        self.network_at(grid, pos)
            .map_or(NetworkColor::WHITE, Network::color)
    }

    /// A duct was placed at `pos`; its behavior is already attached.
    pub fn on_conductive_placed(&mut self, grid: &mut Grid, pos: Position) {
        for side in pos.neighbors() {
            if grid.is_conductive(side) {
                self.destroy_network_at(grid, side);
            }
        }

        self.create_network_at(grid, pos);
    }

    /// A duct at `pos` is about to be removed; its tile is still in place.
    pub fn on_conductive_removed(&mut self, grid: &mut Grid, pos: Position) {
        self.destroy_network_at(grid, pos);
    }

    /// A duct at `pos` has been cleared to air.
    pub fn on_conductive_cleared(&mut self, grid: &mut Grid, pos: Position) {
        if !self.eager_resplit {
            return;
        }

        for side in pos.neighbors() {
            self.create_network_at(grid, side);
        }
    }

    /// Flood fill a new network over networkless ducts reachable from `start`.
    ///
    /// Returns `None` when `start` is not a networkless duct.
    pub fn create_network_at(&mut self, grid: &mut Grid, start: Position) -> Option<NetworkId> {
        if !is_unassigned_duct(grid, start) {
            return None;
        }

        let mut stack = std::mem::take(&mut self.stack);
        let mut network: Option<NetworkId> = None;
        stack.push(start);

        while let Some(node) = stack.pop() {
            if !is_unassigned_duct(grid, node) {
                continue;
            }

            let id = match network {
                Some(id) => {
                    if let Some(existing) = self.networks.get_mut(id) {
                        existing.members.insert(node);
                    }
                    id
                }
                None => {
                    let id = self.networks.insert(Network {
                        members: BTreeSet::from([node]),
                        color: NetworkColor::random(&mut self.rng),
                    });
                    network = Some(id);
                    id
                }
            };
            grid.set_duct_network(node, Some(id));

            for side in node.neighbors() {
                if is_unassigned_duct(grid, side) {
                    stack.push(side);
                }
            }
        }

        self.stack = stack;

        if let Some(id) = network {
            trace!(
                network = ?id,
                start = %start,
                members = self.networks.get(id).map_or(0, Network::len),
                "Created duct network"
            );
        }

        network
    }

    /// Flood fill from `start` detaching every networked duct reachable from it.
    ///
    /// Returns the number of cells detached.
    pub fn destroy_network_at(&mut self, grid: &mut Grid, start: Position) -> usize {
        if grid.duct_network(start).is_none() {
            return 0;
        }

        let mut stack = std::mem::take(&mut self.stack);
        let mut detached = 0;
        stack.push(start);

        while let Some(node) = stack.pop() {
            let Some(id) = grid.duct_network(node) else {
                continue;
            };

            self.detach(id, node);
            grid.set_duct_network(node, None);
            detached += 1;

            for side in node.neighbors() {
                if grid.duct_network(side).is_some() {
                    stack.push(side);
                }
            }
        }

        self.stack = stack;
        trace!(start = %start, detached, "Destroyed duct network");
        detached
    }

    fn detach(&mut self, id: NetworkId, node: Position) {
        let Some(network) = self.networks.get_mut(id) else {
            debug_assert!(false, "duct at {node} refers to missing network {id:?}");
            return;
        };

        let removed = network.members.remove(&node);
        debug_assert!(
            removed,
            "duct at {node} refers to network {id:?} which does not list it"
        );

        if network.members.is_empty() {
            self.networks.remove(id);
        }
    }

    /// Tiles the networks convert on their next tick, one entry per tile
    pub fn conversions(&self, grid: &Grid) -> Vec<(Position, Tile)> {
        let mut conversions = BTreeMap::new();

        for network in self.networks.values() {
            for node in network.members() {
                for side in node.neighbors() {
                    if let Some(converted) = grid.palette().converts_to(grid.tile(side)) {
                        conversions.insert(side, converted);
                    }
                }
            }
        }

        conversions.into_iter().collect()
    }

    /// Panics unless every network member points back at its network and
    /// every networked duct is listed by the network it names.
    pub fn assert_consistent(&self, grid: &Grid) {
        for (id, network) in self.networks.iter() {
            assert!(!network.is_empty(), "network {id:?} is empty");
            for node in network.members() {
                assert_eq!(
                    grid.duct_network(node),
                    Some(id),
                    "member {node} of network {id:?} does not point back at it"
                );
            }
        }

        for pos in grid.positions() {
            if let Some(id) = grid.duct_network(pos) {
                let listed = self.networks.get(id).is_some_and(|n| n.contains(pos));
                assert!(listed, "duct at {pos} names network {id:?} which does not list it");
            }
        }
    }
}

fn is_unassigned_duct(grid: &Grid, pos: Position) -> bool {
    grid.duct(pos).is_some_and(|cell| cell.network().is_none())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::behavior::CellBehavior;
    use servo_core::{BehaviorKind, TilePalette};

    /// Place a duct the way the world does: tile, behavior, then hook
    fn place_duct(grid: &mut Grid, ducts: &mut DuctNetworks, pos: Position) {
        grid.store_tile(pos, Tile::ItemDuct);
        grid.attach_behavior(pos, Some(CellBehavior::spawn(BehaviorKind::Duct)));
        ducts.on_conductive_placed(grid, pos);
    }

    fn remove_duct(grid: &mut Grid, ducts: &mut DuctNetworks, pos: Position) {
        ducts.on_conductive_removed(grid, pos);
        grid.store_tile(pos, Tile::Air);
        ducts.on_conductive_cleared(grid, pos);
        grid.attach_behavior(pos, None);
    }

    fn setup() -> (Grid, DuctNetworks) {
        (
            Grid::new(8, 4, TilePalette::default()),
            DuctNetworks::new(1, false),
        )
    }

    #[test]
    fn test_single_duct_creates_network() {
        let (mut grid, mut ducts) = setup();
        place_duct(&mut grid, &mut ducts, Position::new(2, 2));

        assert_eq!(ducts.len(), 1);
        let network = ducts.network_at(&grid, Position::new(2, 2)).unwrap();
        assert_eq!(network.members().collect::<Vec<_>>(), vec![Position::new(2, 2)]);
        ducts.assert_consistent(&grid);
    }

    #[test]
    fn test_extending_a_line_keeps_one_network() {
        let (mut grid, mut ducts) = setup();
        for x in 0..5 {
            place_duct(&mut grid, &mut ducts, Position::new(x, 1));
            assert_eq!(ducts.len(), 1);
        }

        let network = ducts.network_at(&grid, Position::new(0, 1)).unwrap();
        assert_eq!(network.len(), 5);
        ducts.assert_consistent(&grid);
    }

    #[test]
    fn test_bridge_merges_networks() {
        let (mut grid, mut ducts) = setup();
        for x in [0, 1, 3, 4] {
            place_duct(&mut grid, &mut ducts, Position::new(x, 1));
        }
        assert_eq!(ducts.len(), 2);
        assert_ne!(
            grid.duct_network(Position::new(1, 1)),
            grid.duct_network(Position::new(3, 1))
        );

        place_duct(&mut grid, &mut ducts, Position::new(2, 1));

        assert_eq!(ducts.len(), 1);
        let network = ducts.network_at(&grid, Position::new(2, 1)).unwrap();
        let expected: Vec<Position> = (0..5).map(|x| Position::new(x, 1)).collect();
        assert_eq!(network.members().collect::<Vec<_>>(), expected);
        ducts.assert_consistent(&grid);
    }

    #[test]
    fn test_removing_bridge_silences_both_halves() {
        let (mut grid, mut ducts) = setup();
        for x in 0..5 {
            place_duct(&mut grid, &mut ducts, Position::new(x, 1));
        }

        remove_duct(&mut grid, &mut ducts, Position::new(2, 1));

        assert!(ducts.is_empty());
        for x in [0, 1, 3, 4] {
            let pos = Position::new(x, 1);
            assert!(grid.is_conductive(pos));
            assert!(grid.duct_network(pos).is_none());
        }
        ducts.assert_consistent(&grid);

        // A placement next to the left half rediscovers only that half
        place_duct(&mut grid, &mut ducts, Position::new(1, 0));
        assert_eq!(ducts.len(), 1);
        let network = ducts.network_at(&grid, Position::new(1, 0)).unwrap();
        assert_eq!(network.len(), 3);
        assert!(network.contains(Position::new(0, 1)));
        assert!(grid.duct_network(Position::new(3, 1)).is_none());
        ducts.assert_consistent(&grid);
    }

    #[test]
    fn test_eager_resplit_rebuilds_both_halves() {
        let mut grid = Grid::new(8, 4, TilePalette::default());
        let mut ducts = DuctNetworks::new(1, true);
        for x in 0..5 {
            place_duct(&mut grid, &mut ducts, Position::new(x, 1));
        }

        remove_duct(&mut grid, &mut ducts, Position::new(2, 1));

        assert_eq!(ducts.len(), 2);
        let left = grid.duct_network(Position::new(0, 1)).unwrap();
        let right = grid.duct_network(Position::new(4, 1)).unwrap();
        assert_ne!(left, right);
        assert_eq!(ducts.get(left).unwrap().len(), 2);
        assert_eq!(ducts.get(right).unwrap().len(), 2);
        assert!(!ducts.get(left).unwrap().contains(Position::new(2, 1)));
        ducts.assert_consistent(&grid);
    }

    #[test]
    fn test_removing_last_duct_drops_network() {
        let (mut grid, mut ducts) = setup();
        let pos = Position::new(0, 0);
        place_duct(&mut grid, &mut ducts, pos);
        let id = grid.duct_network(pos).unwrap();

        remove_duct(&mut grid, &mut ducts, pos);

        assert!(ducts.get(id).is_none());
        assert!(ducts.is_empty());
    }

    #[test]
    fn test_create_ignores_non_ducts_and_assigned_cells() {
        let (mut grid, mut ducts) = setup();
        assert!(ducts.create_network_at(&mut grid, Position::new(3, 3)).is_none());
        assert!(ducts.create_network_at(&mut grid, Position::new(-1, 0)).is_none());

        place_duct(&mut grid, &mut ducts, Position::new(3, 3));
        assert!(ducts.create_network_at(&mut grid, Position::new(3, 3)).is_none());
        assert_eq!(ducts.len(), 1);
        assert_eq!(ducts.destroy_network_at(&mut grid, Position::new(7, 0)), 0);
    }

    #[test]
    fn test_conversions_touch_only_neighbors() {
        let (mut grid, mut ducts) = setup();
        for x in 1..4 {
            place_duct(&mut grid, &mut ducts, Position::new(x, 1));
        }
        grid.store_tile(Position::new(1, 0), Tile::Dirt);
        grid.store_tile(Position::new(2, 2), Tile::Dirt);
        grid.store_tile(Position::new(3, 0), Tile::Dirt);
        grid.store_tile(Position::new(7, 3), Tile::Dirt);
        grid.store_tile(Position::new(0, 0), Tile::Dirt);

        let conversions = ducts.conversions(&grid);
        assert_eq!(
            conversions,
            vec![
                (Position::new(1, 0), Tile::Grass),
                (Position::new(2, 2), Tile::Grass),
                (Position::new(3, 0), Tile::Grass),
            ]
        );
    }

    #[test]
    fn test_conversions_deduplicate_shared_neighbors() {
        let (mut grid, mut ducts) = setup();
        place_duct(&mut grid, &mut ducts, Position::new(1, 1));
        place_duct(&mut grid, &mut ducts, Position::new(2, 0));
        place_duct(&mut grid, &mut ducts, Position::new(1, 0));
        grid.store_tile(Position::new(2, 1), Tile::Dirt);

        assert_eq!(
            ducts.conversions(&grid),
            vec![(Position::new(2, 1), Tile::Grass)]
        );
    }

    #[test]
    fn test_colors_are_seeded() {
        let color_of = |seed| {
            let mut grid = Grid::new(2, 2, TilePalette::default());
            let mut ducts = DuctNetworks::new(seed, false);
            place_duct(&mut grid, &mut ducts, Position::new(0, 0));
            ducts.color_at(&grid, Position::new(0, 0))
        };

        assert_eq!(color_of(9), color_of(9));
        let grid = Grid::new(2, 2, TilePalette::default());
        let ducts = DuctNetworks::new(9, false);
        assert_eq!(ducts.color_at(&grid, Position::new(1, 1)), NetworkColor::WHITE);
    }
}
