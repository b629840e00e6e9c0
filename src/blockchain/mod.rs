pub mod block;
pub mod fractal;
pub mod model;

pub use block::Block;
pub use fractal::FractalCoordinate;
pub use model::{BlockRejection, Blockchain};

/// Default Proof-of-Work difficulty (number of leading zeros).
pub const DEFAULT_DIFFICULTY: u32 = 4;

/// Previous hash carried by the genesis block.
pub const GENESIS_PREVIOUS_HASH: &str =
    "0000000000000000000000000000000000000000000000000000000000000000";

/// Miner label used for the genesis block.
pub const GENESIS_MINER: &str = "genesis";

/// Current wall-clock time as fractional seconds since the Unix epoch.
pub fn unix_now() -> f64 {
    chrono::Utc::now().timestamp_micros() as f64 / 1_000_000.0
}
