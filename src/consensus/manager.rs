//! Chain orchestration: candidate assembly, settlement of mined blocks and
//! full-chain validation.

use log::{debug, error, info, warn};
use thiserror::Error;
use uuid::Uuid;

use super::{
    BLOCK_REWARD, MAX_TRANSACTIONS_PER_BLOCK, MiningResult, ProofOfFractalWork, RETARGET_INTERVAL,
};
use crate::blockchain::{Block, Blockchain, FractalCoordinate, GENESIS_PREVIOUS_HASH, unix_now};
use crate::transaction::{NETWORK_SENDER, Transaction};

/// First inconsistency found while walking the chain.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ChainFault {
    #[error("invalid genesis block")]
    InvalidGenesis,
    #[error("invalid chain at block {0}: broken link")]
    BrokenLink(usize),
    #[error("invalid chain at block {0}: invalid hash")]
    InvalidHash(usize),
    #[error("invalid chain at block {0}: index mismatch")]
    IndexMismatch(usize),
    #[error("invalid chain at block {position}: recorded difficulty {recorded}, schedule expects {expected}")]
    DifficultyMismatch {
        position: usize,
        recorded: u32,
        expected: u32,
    },
}

/// Owns the chain and the mining engine; the only writer of either.
#[derive(Debug, Clone)]
pub struct ConsensusManager {
    blockchain: Blockchain,
    pofw: ProofOfFractalWork,
}

impl ConsensusManager {
    pub fn new(blockchain: Blockchain) -> Self {
        let pofw = ProofOfFractalWork::new(blockchain.difficulty());
        Self { blockchain, pofw }
    }

    /// Same as `new`, retargeting against `secs` per block.
    pub fn with_target_block_time(blockchain: Blockchain, secs: f64) -> Self {
        let pofw = ProofOfFractalWork::new(blockchain.difficulty()).with_target_block_time(secs);
        Self { blockchain, pofw }
    }

    pub fn blockchain(&self) -> &Blockchain {
        &self.blockchain
    }

    pub fn blockchain_mut(&mut self) -> &mut Blockchain {
        &mut self.blockchain
    }

    pub fn pofw(&self) -> &ProofOfFractalWork {
        &self.pofw
    }

    pub fn difficulty(&self) -> u32 {
        self.pofw.difficulty()
    }

    pub fn add_transaction(&mut self, tx: Transaction) {
        debug!("POOL - queued tx {}", tx.tx_id);
        self.blockchain.add_pending_transaction(tx);
    }

    /// Unmined candidate holding up to `MAX_TRANSACTIONS_PER_BLOCK` of the
    /// oldest pending transactions, linked to the current tip.
    pub fn create_block(&self, miner_address: &str, fractal_coord: FractalCoordinate) -> Block {
        let take = self.blockchain.pending_transactions.len().min(MAX_TRANSACTIONS_PER_BLOCK);
        let transactions = self.blockchain.pending_transactions[..take].to_vec();

        Block::new(
            self.blockchain.len() as u64,
            unix_now(),
            transactions,
            miner_address,
            fractal_coord,
            self.blockchain.last_block().hash.clone(),
        )
    }

    /// Mine `block` and settle it on success: admit it through the chain's
    /// append check, drop its transactions from the pool, queue the miner's
    /// reward and retarget on interval boundaries.
    ///
    /// A block the chain refuses turns the result into a failure.
    pub fn mine_block(&mut self, block: Block, max_iterations: u64) -> MiningResult {
        let mut result = self.pofw.mine(block, max_iterations);
        let Some(mined) = result.block.clone() else {
            return result;
        };

        if !self.blockchain.add_block(mined.clone()) {
            warn!(
                "CONSENSUS - mined block #{} was refused by the chain",
                mined.index
            );
            result.success = false;
            result.block = None;
            return result;
        }

        self.settle(&mined);
        result
    }

    fn settle(&mut self, block: &Block) {
        let pending = &mut self.blockchain.pending_transactions;
        let before = pending.len();
        for tx in &block.transactions {
            if let Some(pos) = pending.iter().position(|p| p.tx_id == tx.tx_id) {
                pending.remove(pos);
            }
        }
        debug!(
            "POOL - cleaned {} -> {} after block #{}",
            before,
            pending.len(),
            block.index
        );

        let reward = Transaction::with_id(
            format!("reward-{}", Uuid::new_v4().simple()),
            NETWORK_SENDER,
            block.miner.clone(),
            BLOCK_REWARD,
            "Mining reward",
            unix_now(),
        );
        self.blockchain.add_pending_transaction(reward);

        if block.index % RETARGET_INTERVAL == 0 {
            self.pofw.adjust_difficulty(&self.blockchain);
            let difficulty = self.pofw.difficulty();
            self.sync_difficulty(difficulty);
        }

        info!(
            "CONSENSUS - sealed block #{} (hash={}, nonce={}, diff={})",
            block.index,
            block.hash,
            block.nonce,
            self.difficulty()
        );
    }

    fn sync_difficulty(&mut self, difficulty: u32) {
        self.pofw.set_difficulty(difficulty);
        self.blockchain.set_difficulty(self.pofw.difficulty());
    }

    pub fn validate_chain(&self) -> bool {
        match self.verify_chain() {
            Ok(()) => true,
            Err(fault) => {
                error!("{}", fault);
                false
            }
        }
    }

    /// Walk the chain and report the first inconsistency.
    ///
    /// Besides linkage, proof-of-work and index continuity, every block's
    /// recorded difficulty must match the schedule obtained by replaying the
    /// retarget rule from the genesis difficulty.
    pub fn verify_chain(&self) -> Result<(), ChainFault> {
        let chain = &self.blockchain.chain;
        let Some(genesis) = chain.first() else {
            return Ok(());
        };
        if genesis.index != 0
            || genesis.previous_hash != GENESIS_PREVIOUS_HASH
            || genesis.hash != genesis.calculate_hash()
        {
            return Err(ChainFault::InvalidGenesis);
        }

        let interval = RETARGET_INTERVAL as usize;
        let mut expected = genesis.difficulty.max(1);

        for i in 1..chain.len() {
            let current = &chain[i];
            let previous = &chain[i - 1];

            if current.previous_hash != previous.hash {
                return Err(ChainFault::BrokenLink(i));
            }
            if !self.pofw.validate_block(current) {
                return Err(ChainFault::InvalidHash(i));
            }
            if current.index != previous.index + 1 {
                return Err(ChainFault::IndexMismatch(i));
            }
            if current.difficulty != expected {
                return Err(ChainFault::DifficultyMismatch {
                    position: i,
                    recorded: current.difficulty,
                    expected,
                });
            }

            if current.index % RETARGET_INTERVAL == 0 && i + 1 > interval {
                let window = &chain[i + 1 - interval..=i];
                expected = ProofOfFractalWork::next_difficulty(
                    expected,
                    window,
                    self.pofw.target_block_time(),
                );
            }
        }

        Ok(())
    }
}
