//! Consensus module - proof-of-fractal-work mining, retargeting and chain
//! orchestration.

mod manager;
mod pofw;

pub use manager::*;
pub use pofw::*;

use crate::blockchain::FractalCoordinate;

/// Amount paid to the miner of every accepted block.
pub const BLOCK_REWARD: f64 = 10.0;

/// Target seconds per block for retargeting.
pub const TARGET_BLOCK_TIME_SECS: f64 = 60.0;

/// Blocks between difficulty retargets, also the size of the timing window.
pub const RETARGET_INTERVAL: u64 = 10;

/// Cap on pending transactions snapshotted into a candidate block.
pub const MAX_TRANSACTIONS_PER_BLOCK: usize = 100;

/// Default nonce budget for a single mining call.
pub const DEFAULT_MAX_ITERATIONS: u64 = 10_000_000;

/// Reference points of the fractal space; blocks near them are favoured.
pub const HOTSPOTS: [FractalCoordinate; 3] = [
    FractalCoordinate::new(100.0, 100.0, 100.0),
    FractalCoordinate::new(500.0, 500.0, 500.0),
    FractalCoordinate::new(300.0, 700.0, 200.0),
];

/// Nearest-hotspot distance under which mining is considered easier.
pub const HOTSPOT_NEAR_RADIUS: f64 = 50.0;

/// Nearest-hotspot distance under which mining is neutral.
pub const HOTSPOT_NEUTRAL_RADIUS: f64 = 200.0;
