//! Tile world simulation.
//!
//! A fixed-size grid of tiles with item duct networks maintained by flood
//! fills and a two-channel light field maintained by worklist relaxation.
//! Everything is single-threaded; no operation is re-entrant.

pub mod behavior;
pub mod clock;
pub mod ducts;
pub mod grid;
pub mod lighting;
pub mod world;

pub use behavior::{CellBehavior, DuctCell};
pub use clock::TickClock;
pub use ducts::{DuctNetworks, Network, NetworkColor, NetworkId};
pub use grid::Grid;
pub use lighting::{Light, LightEngine, LightField, SettleStats, MAX_LIGHT};
pub use world::{FrameReport, NetworkSummary, TickReport, World};
