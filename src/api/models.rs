use crate::blockchain::{Block, Blockchain, FractalCoordinate};
use crate::blocklog::{BlockLog, BlockRecord};
use crate::config::NodeConfig;
use crate::consensus::ConsensusManager;
use crate::transaction::Transaction;
use serde::{Deserialize, Serialize};
use std::sync::Mutex;

/// Shared application state: the single consensus manager behind one lock,
/// plus the node configuration and the mined-block log.
pub struct AppState {
    pub consensus: Mutex<ConsensusManager>,
    pub config: NodeConfig,
    pub block_log: BlockLog,
}

impl AppState {
    pub fn new(config: NodeConfig) -> Self {
        let blockchain = Blockchain::new(config.initial_difficulty);
        let consensus =
            ConsensusManager::with_target_block_time(blockchain, config.target_block_time_secs);
        Self {
            consensus: Mutex::new(consensus),
            block_log: BlockLog::new(&config.block_log_path),
            config,
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(NodeConfig::default())
    }
}

/* ---------- Chain API Models ---------- */

#[derive(Serialize)]
pub struct ChainResponse<'a> {
    pub length: usize,
    pub difficulty: u32,
    pub chain: &'a [Block],
}

#[derive(Serialize)]
pub struct ValidateResponse {
    pub valid: bool,
    pub length: usize,
    pub difficulty: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Deserialize)]
pub struct MineRequest {
    pub miner_address: String,
    /// Random coordinate when omitted.
    #[serde(default)]
    pub coord: Option<FractalCoordinate>,
}

#[derive(Serialize)]
pub struct MineResponse {
    pub mined_index: u64,
    pub hash: String,
    pub nonce: u64,
    pub difficulty: u32,
    pub duration_secs: f64,
    pub fractal_factor: i32,
    pub local_difficulty: u32,
    pub transactions: usize,
}

#[derive(Serialize)]
pub struct DifficultyResponse {
    pub difficulty: u32,
    pub target: String,
}

/* ---------- TX API Models ---------- */

#[derive(Deserialize)]
pub struct NewTxRequest {
    pub sender: String,
    pub receiver: String,
    pub amount: f64,
    #[serde(default)]
    pub data: String,
    /// Current time when omitted.
    #[serde(default)]
    pub timestamp: Option<f64>,
    #[serde(default)]
    pub signature: Option<String>,
}

#[derive(Serialize)]
pub struct NewTxResponse {
    pub tx_id: String,
}

#[derive(Deserialize)]
pub struct GenerateTxRequest {
    pub count: usize,
}

#[derive(Serialize)]
pub struct GenerateTxResponse {
    pub tx_ids: Vec<String>,
    pub pending_size: usize,
}

#[derive(Serialize)]
pub struct PendingResponse {
    pub size: usize,
    pub transactions: Vec<Transaction>,
}

/* ---------- Balance / Stats / Dashboard ---------- */

#[derive(Serialize)]
pub struct BalanceResponse {
    pub address: String,
    pub balance: f64,
}

#[derive(Serialize)]
pub struct StatsResponse {
    pub height: usize,
    pub difficulty: u32,
    pub target_block_time_secs: f64,
    pub retarget_interval: u64,
    pub block_reward: f64,
    pub last_interval_secs: Option<f64>,
    pub avg_interval_secs: Option<f64>,
    pub pending_size: usize,
}

#[derive(Serialize)]
pub struct DashboardResponse {
    pub blocks: Vec<BlockRecord>,
}
