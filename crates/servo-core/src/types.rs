//! Core type definitions for the tile world.

use serde::{Deserialize, Serialize};
use std::fmt;

/// 2D cell coordinate. Row 0 is the top of the world; `y` grows downwards.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn add(&self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }

    /// The adjacent cell in the given direction
    pub fn step(&self, direction: Direction) -> Self {
        let (dx, dy) = direction.to_delta();
        self.add(dx, dy)
    }

    /// The four orthogonal neighbors, in `Direction::ALL` order
    pub fn neighbors(&self) -> [Position; 4] {
        Direction::ALL.map(|direction| self.step(direction))
    }

    /// Manhattan distance to another position
    pub fn manhattan_distance(&self, other: &Position) -> i32 {
        (self.x - other.x).abs() + (self.y - other.y).abs()
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Orthogonal direction. Adjacency in the world is 4-connected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    pub fn to_delta(&self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }
}

/// Tile type stored in every grid cell.
///
/// The set is closed: per-tile data lives in a [`crate::TilePalette`] indexed by
/// [`Tile::index`].
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum Tile {
    /// The empty tile
    #[default]
    Air,
    Dirt,
    Grass,
    /// Conductive tile forming duct networks
    ItemDuct,
    Miner,
    Dropper,
}

impl Tile {
    pub const COUNT: usize = 6;

    pub const ALL: [Tile; Tile::COUNT] = [
        Tile::Air,
        Tile::Dirt,
        Tile::Grass,
        Tile::ItemDuct,
        Tile::Miner,
        Tile::Dropper,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Tile> {
        Tile::ALL.get(index).copied()
    }

    pub fn is_air(self) -> bool {
        self == Tile::Air
    }
}

impl fmt::Display for Tile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_neighbors_order() {
        let pos = Position::new(5, 5);
        assert_eq!(
            pos.neighbors(),
            [
                Position::new(5, 4),
                Position::new(5, 6),
                Position::new(4, 5),
                Position::new(6, 5),
            ]
        );
    }

    #[test]
    fn test_manhattan_distance() {
        let pos1 = Position::new(0, 0);
        let pos2 = Position::new(3, 4);
        assert_eq!(pos1.manhattan_distance(&pos2), 7);
    }

    #[test]
    fn test_direction_delta() {
        assert_eq!(Direction::Up.to_delta(), (0, -1));
        assert_eq!(Direction::Down.to_delta(), (0, 1));
        assert_eq!(Direction::Left.to_delta(), (-1, 0));
        assert_eq!(Direction::Right.to_delta(), (1, 0));
    }

    #[test]
    fn test_tile_index_roundtrip() {
        for (i, tile) in Tile::ALL.iter().enumerate() {
            assert_eq!(tile.index(), i);
            assert_eq!(Tile::from_index(i), Some(*tile));
        }
        assert_eq!(Tile::from_index(Tile::COUNT), None);
    }
}
