//! Core types and configuration for the Servo tile world.

pub mod types;
pub mod palette;
pub mod config;
pub mod error;

pub use error::{Error, Result};
pub use types::*;
pub use palette::*;
pub use config::*;
