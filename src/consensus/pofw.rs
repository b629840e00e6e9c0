//! Proof-of-fractal-work engine
//!
//! Nonce search, block validation and the retarget rule.

use log::{debug, info, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use super::{
    HOTSPOT_NEAR_RADIUS, HOTSPOT_NEUTRAL_RADIUS, HOTSPOTS, RETARGET_INTERVAL,
    TARGET_BLOCK_TIME_SECS,
};
use crate::blockchain::{Block, Blockchain, FractalCoordinate};

/// Outcome of a mining attempt.
#[derive(Debug, Clone)]
pub struct MiningResult {
    pub success: bool,
    /// Winning hash, empty on failure.
    pub hash: String,
    /// Winning nonce, 0 on failure.
    pub nonce: u64,
    /// Wall-clock time spent sweeping.
    pub duration: Duration,
    /// The sealed block, present only on success.
    pub block: Option<Block>,
    /// Hotspot factor computed for the block's coordinate (+1 easier, -1 harder).
    pub fractal_factor: i32,
    /// `max(1, difficulty + fractal_factor)`. Reported only, see `mine`.
    pub local_difficulty: u32,
}

impl MiningResult {
    fn failed(duration: Duration, fractal_factor: i32, local_difficulty: u32) -> Self {
        Self {
            success: false,
            hash: String::new(),
            nonce: 0,
            duration,
            block: None,
            fractal_factor,
            local_difficulty,
        }
    }

    pub fn duration_secs(&self) -> f64 {
        self.duration.as_secs_f64()
    }
}

/// Mining and validation engine. `target` is always `difficulty` zeros.
#[derive(Debug, Clone)]
pub struct ProofOfFractalWork {
    difficulty: u32,
    target: String,
    target_block_time: f64,
}

impl ProofOfFractalWork {
    pub fn new(difficulty: u32) -> Self {
        let difficulty = difficulty.max(1);
        Self {
            difficulty,
            target: "0".repeat(difficulty as usize),
            target_block_time: TARGET_BLOCK_TIME_SECS,
        }
    }

    pub fn with_target_block_time(mut self, secs: f64) -> Self {
        self.target_block_time = secs;
        self
    }

    pub fn difficulty(&self) -> u32 {
        self.difficulty
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn target_block_time(&self) -> f64 {
        self.target_block_time
    }

    pub(crate) fn set_difficulty(&mut self, difficulty: u32) {
        self.difficulty = difficulty.max(1);
        self.target = "0".repeat(self.difficulty as usize);
    }

    /// +1 within the near radius of the closest hotspot, 0 within the
    /// neutral radius, -1 otherwise.
    pub fn fractal_factor(coord: &FractalCoordinate) -> i32 {
        let nearest = HOTSPOTS
            .iter()
            .map(|spot| coord.distance(spot))
            .fold(f64::INFINITY, f64::min);

        if nearest < HOTSPOT_NEAR_RADIUS {
            1
        } else if nearest < HOTSPOT_NEUTRAL_RADIUS {
            0
        } else {
            -1
        }
    }

    pub fn local_difficulty(&self, coord: &FractalCoordinate) -> u32 {
        (self.difficulty as i64 + Self::fractal_factor(coord) as i64).max(1) as u32
    }

    /// Sweep nonces from 0 until the hash starts with the global target or
    /// `max_iterations` nonces have been tried.
    ///
    /// The fractal factor is computed and reported but acceptance is gated on
    /// the global target only.
    pub fn mine(&self, block: Block, max_iterations: u64) -> MiningResult {
        self.mine_from(block, 0, max_iterations)
    }

    /// Like `mine`, starting the sweep at `start_nonce`.
    pub fn mine_from(&self, block: Block, start_nonce: u64, max_iterations: u64) -> MiningResult {
        self.sweep(block, start_nonce, max_iterations, None)
    }

    /// Split the nonce space into `shards` disjoint ranges of
    /// `iterations_per_shard` nonces, each swept by its own worker on its own
    /// copy of the block. The first shard to succeed halts the others and its
    /// result is returned, so a lower qualifying nonce may go unvisited.
    pub fn mine_sharded(&self, block: Block, shards: usize, iterations_per_shard: u64) -> MiningResult {
        let shards = shards.max(1);
        let start = Instant::now();
        let found = AtomicBool::new(false);

        let results: Vec<MiningResult> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..shards)
                .map(|i| {
                    let shard_block = block.clone();
                    let found = &found;
                    let start_nonce = (i as u64).saturating_mul(iterations_per_shard);
                    scope.spawn(move || {
                        self.sweep(shard_block, start_nonce, iterations_per_shard, Some(found))
                    })
                })
                .collect();
            handles.into_iter().filter_map(|h| h.join().ok()).collect()
        });

        let factor = Self::fractal_factor(&block.fractal_coord);
        let local = self.local_difficulty(&block.fractal_coord);
        match results
            .into_iter()
            .filter(|r| r.success)
            .min_by_key(|r| r.nonce)
        {
            Some(mut winner) => {
                winner.duration = start.elapsed();
                winner
            }
            None => MiningResult::failed(start.elapsed(), factor, local),
        }
    }

    fn sweep(
        &self,
        mut block: Block,
        start_nonce: u64,
        max_iterations: u64,
        stop: Option<&AtomicBool>,
    ) -> MiningResult {
        let start = Instant::now();
        let factor = Self::fractal_factor(&block.fractal_coord);
        let local = self.local_difficulty(&block.fractal_coord);
        block.difficulty = self.difficulty;

        debug!(
            "MINER - block #{} sweep from nonce {} (diff={}, local={}, factor={})",
            block.index, start_nonce, self.difficulty, local, factor
        );

        let end = start_nonce.saturating_add(max_iterations);
        let mut tried = 0u64;
        for nonce in start_nonce..end {
            if stop.is_some_and(|s| s.load(Ordering::Relaxed)) {
                debug!("MINER - shard starting at {} halted after {} nonces", start_nonce, tried);
                return MiningResult::failed(start.elapsed(), factor, local);
            }
            tried += 1;

            block.nonce = nonce;
            block.seal();

            if block.hash.starts_with(self.target.as_str()) {
                let duration = start.elapsed();
                if let Some(s) = stop {
                    s.store(true, Ordering::Relaxed);
                }
                info!(
                    "Block mined! hash={}..., nonce={}, time={:.3}s",
                    &block.hash[..10],
                    nonce,
                    duration.as_secs_f64()
                );
                return MiningResult {
                    success: true,
                    hash: block.hash.clone(),
                    nonce,
                    duration,
                    block: Some(block),
                    fractal_factor: factor,
                    local_difficulty: local,
                };
            }
        }

        let duration = start.elapsed();
        warn!(
            "Mining failed after {} iterations ({:.3}s)",
            tried,
            duration.as_secs_f64()
        );
        MiningResult::failed(duration, factor, local)
    }

    /// Retarget rule over a timing window.
    ///
    /// ratio = (last.timestamp - first.timestamp) / (target_block_time * 10).
    /// Above 2.0 the difficulty drops by one (never below 1); below 0.5 it
    /// rises by one. Windows with fewer than two blocks leave it unchanged.
    pub fn next_difficulty(current: u32, window: &[Block], target_block_time: f64) -> u32 {
        let (Some(first), Some(last)) = (window.first(), window.last()) else {
            return current;
        };
        if window.len() < 2 {
            return current;
        }

        let expected = target_block_time * RETARGET_INTERVAL as f64;
        if expected <= 0.0 {
            return current;
        }
        let ratio = (last.timestamp - first.timestamp) / expected;

        if ratio > 2.0 {
            current.saturating_sub(1).max(1)
        } else if ratio < 0.5 {
            current.saturating_add(1)
        } else {
            current
        }
    }

    /// Retarget from the most recent window once the chain holds more than
    /// `RETARGET_INTERVAL` blocks. Always resynchronizes the target.
    pub fn adjust_difficulty(&mut self, blockchain: &Blockchain) {
        let len = blockchain.chain.len();
        let interval = RETARGET_INTERVAL as usize;
        if len <= interval {
            return;
        }

        let window = &blockchain.chain[len - interval..];
        let previous = self.difficulty;
        let next = Self::next_difficulty(previous, window, self.target_block_time);
        self.set_difficulty(next);

        if next < previous {
            info!("Decreased difficulty to {}", next);
        } else if next > previous {
            info!("Increased difficulty to {}", next);
        }
    }

    /// The stored hash must match the content and start with the zeros of
    /// the difficulty recorded when the block was mined (at least one).
    pub fn validate_block(&self, block: &Block) -> bool {
        let calculated = block.calculate_hash();
        if calculated != block.hash {
            warn!("Block hash mismatch: {} vs {}", calculated, block.hash);
            return false;
        }

        let required = block.difficulty.max(1);
        if !block.meets_difficulty(required) {
            warn!(
                "Block hash doesn't meet difficulty requirement {}: {}",
                required, block.hash
            );
            return false;
        }

        true
    }
}

impl Default for ProofOfFractalWork {
    fn default() -> Self {
        Self::new(crate::blockchain::DEFAULT_DIFFICULTY)
    }
}
