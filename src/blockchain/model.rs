use log::{debug, warn};
use thiserror::Error;

use super::Block;
use crate::transaction::Transaction;

/// Why a block was refused at the append chokepoint.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BlockRejection {
    #[error("index {got} does not follow chain length {expected}")]
    IndexMismatch { expected: u64, got: u64 },
    #[error("previous hash {got} does not match tip {expected}")]
    PreviousHashMismatch { expected: String, got: String },
    #[error("stored hash does not match block content")]
    HashMismatch,
    #[error("block records difficulty {got}, chain is at {expected}")]
    DifficultyMismatch { expected: u32, got: u32 },
    #[error("hash {hash} lacks {difficulty} leading zeros")]
    InsufficientWork { hash: String, difficulty: u32 },
}

/// In-memory chain with its pending pool and current difficulty.
#[derive(Debug, Clone)]
pub struct Blockchain {
    pub chain: Vec<Block>,
    pub pending_transactions: Vec<Transaction>,
    difficulty: u32,
}

impl Blockchain {
    /// Initialize a new blockchain with a genesis block.
    pub fn new(difficulty: u32) -> Self {
        let difficulty = difficulty.max(1);
        Self {
            chain: vec![Block::genesis(difficulty)],
            pending_transactions: Vec::new(),
            difficulty,
        }
    }

    /// Return the last block in the chain.
    pub fn last_block(&self) -> &Block {
        self.chain
            .last()
            .expect("Blockchain should always have at least the genesis block")
    }

    /// Check the append invariants without mutating the chain.
    pub fn check_block(&self, block: &Block) -> Result<(), BlockRejection> {
        let expected = self.chain.len() as u64;
        if block.index != expected {
            return Err(BlockRejection::IndexMismatch {
                expected,
                got: block.index,
            });
        }

        let tip = &self.last_block().hash;
        if &block.previous_hash != tip {
            return Err(BlockRejection::PreviousHashMismatch {
                expected: tip.clone(),
                got: block.previous_hash.clone(),
            });
        }

        if block.hash != block.calculate_hash() {
            return Err(BlockRejection::HashMismatch);
        }

        if block.difficulty != self.difficulty {
            return Err(BlockRejection::DifficultyMismatch {
                expected: self.difficulty,
                got: block.difficulty,
            });
        }

        if !block.meets_difficulty(self.difficulty) {
            return Err(BlockRejection::InsufficientWork {
                hash: block.hash.clone(),
                difficulty: self.difficulty,
            });
        }

        Ok(())
    }

    /// Validate and append. Returns false (and leaves the chain untouched)
    /// when any append invariant fails.
    pub fn add_block(&mut self, block: Block) -> bool {
        match self.check_block(&block) {
            Ok(()) => {
                debug!("CHAIN - appended block #{} ({})", block.index, block.hash);
                self.chain.push(block);
                true
            }
            Err(reason) => {
                warn!("CHAIN - rejected block #{}: {}", block.index, reason);
                false
            }
        }
    }

    /// Queue a transaction. No de-duplication or balance checks happen here.
    pub fn add_pending_transaction(&mut self, tx: Transaction) {
        self.pending_transactions.push(tx);
    }

    /// Validate the entire chain: hash integrity (genesis included), linkage
    /// and each block's recorded proof-of-work.
    pub fn is_valid_chain(&self) -> bool {
        if let Some(genesis) = self.chain.first() {
            if genesis.hash != genesis.calculate_hash() {
                return false;
            }
        }
        self.chain.windows(2).all(|pair| {
            let (prev, current) = (&pair[0], &pair[1]);
            current.previous_hash == prev.hash
                && current.hash == current.calculate_hash()
                && current.meets_difficulty(current.difficulty.max(1))
        })
    }

    /// Confirmed balance: everything received minus everything sent.
    pub fn balance_of(&self, address: &str) -> f64 {
        let mut balance = 0.0;
        for tx in self.chain.iter().flat_map(|b| b.transactions.iter()) {
            if tx.receiver == address {
                balance += tx.amount;
            }
            if tx.sender == address {
                balance -= tx.amount;
            }
        }
        balance
    }

    pub fn len(&self) -> usize {
        self.chain.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chain.is_empty()
    }

    pub fn difficulty(&self) -> u32 {
        self.difficulty
    }

    // NOTE: Changing difficulty affects future blocks only.
    pub(crate) fn set_difficulty(&mut self, difficulty: u32) {
        self.difficulty = difficulty;
    }
}

#[cfg(test)]
mod tests {
    use super::{BlockRejection, Blockchain};
    use crate::blockchain::{Block, FractalCoordinate};
    use crate::transaction::Transaction;

    /// Brute-force a nonce so the block satisfies `difficulty`.
    fn solve(mut block: Block, difficulty: u32) -> Block {
        block.difficulty = difficulty;
        loop {
            block.seal();
            if block.meets_difficulty(difficulty) {
                return block;
            }
            block.nonce += 1;
        }
    }

    fn next_block(bc: &Blockchain) -> Block {
        Block::new(
            bc.len() as u64,
            100.0,
            vec![Transaction::with_timestamp("a", "b", 1.0, "", 1.0)],
            "miner",
            FractalCoordinate::origin(),
            bc.last_block().hash.clone(),
        )
    }

    #[test]
    fn fresh_chain_has_only_genesis() {
        let bc = Blockchain::new(1);
        assert_eq!(bc.len(), 1);
        assert!(bc.pending_transactions.is_empty());
        assert_eq!(bc.last_block().index, 0);
        assert_eq!(bc.last_block().previous_hash, "0".repeat(64));
        assert!(bc.last_block().transactions.is_empty());
        assert!(bc.is_valid_chain());
    }

    #[test]
    fn accepts_well_formed_block() {
        let mut bc = Blockchain::new(1);
        let block = solve(next_block(&bc), 1);
        assert!(bc.add_block(block));
        assert_eq!(bc.len(), 2);
        assert!(bc.is_valid_chain());
    }

    #[test]
    fn rejects_skipped_index() {
        let mut bc = Blockchain::new(1);
        let mut block = next_block(&bc);
        block.index = 5;
        let block = solve(block, 1);
        assert!(matches!(
            bc.check_block(&block),
            Err(BlockRejection::IndexMismatch { expected: 1, got: 5 })
        ));
        assert!(!bc.add_block(block));
        assert_eq!(bc.len(), 1);
    }

    #[test]
    fn rejects_wrong_previous_hash() {
        let mut bc = Blockchain::new(1);
        let mut block = next_block(&bc);
        block.previous_hash = "deadbeef".into();
        let block = solve(block, 1);
        assert!(matches!(
            bc.check_block(&block),
            Err(BlockRejection::PreviousHashMismatch { .. })
        ));
        assert!(!bc.add_block(block));
    }

    #[test]
    fn rejects_missing_work() {
        let mut bc = Blockchain::new(1);
        let mut block = next_block(&bc);
        block.difficulty = 1;
        // find a nonce whose hash does not start with '0'
        loop {
            block.seal();
            if !block.hash.starts_with('0') {
                break;
            }
            block.nonce += 1;
        }
        assert!(matches!(
            bc.check_block(&block),
            Err(BlockRejection::InsufficientWork { difficulty: 1, .. })
        ));
        assert!(!bc.add_block(block));
    }

    #[test]
    fn rejects_tampered_content() {
        let mut bc = Blockchain::new(1);
        let mut block = solve(next_block(&bc), 1);
        block.miner = "someone-else".into();
        assert_eq!(bc.check_block(&block), Err(BlockRejection::HashMismatch));
        assert!(!bc.add_block(block));
    }

    #[test]
    fn pending_pool_accepts_duplicates() {
        let mut bc = Blockchain::new(1);
        let tx = Transaction::with_timestamp("a", "b", 1.0, "", 1.0);
        bc.add_pending_transaction(tx.clone());
        bc.add_pending_transaction(tx);
        assert_eq!(bc.pending_transactions.len(), 2);
    }

    #[test]
    fn broken_link_invalidates_chain() {
        let mut bc = Blockchain::new(1);
        let block = solve(next_block(&bc), 1);
        assert!(bc.add_block(block));
        bc.chain[1].previous_hash = "garbage".into();
        assert!(!bc.is_valid_chain());
    }

    #[test]
    fn balance_counts_confirmed_transfers() {
        let mut bc = Blockchain::new(1);
        let mut block = next_block(&bc);
        block.transactions = vec![
            Transaction::with_timestamp("network", "alice", 10.0, "", 1.0),
            Transaction::with_timestamp("alice", "bob", 4.0, "", 2.0),
        ];
        let block = solve(block, 1);
        assert!(bc.add_block(block));
        assert_eq!(bc.balance_of("alice"), 6.0);
        assert_eq!(bc.balance_of("bob"), 4.0);
        assert_eq!(bc.balance_of("nobody"), 0.0);
    }

    #[test]
    fn rejects_block_recording_another_difficulty() {
        let mut bc = Blockchain::new(1);
        // solved against the live target but stamped with a stale difficulty
        let mut block = solve(next_block(&bc), 1);
        block.difficulty = 0;
        assert_eq!(
            bc.check_block(&block),
            Err(BlockRejection::DifficultyMismatch { expected: 1, got: 0 })
        );
        assert!(!bc.add_block(block));

        let mut bc = Blockchain::new(2);
        let block = solve(next_block(&bc), 2);
        let mut understated = block.clone();
        understated.difficulty = 1;
        assert!(!bc.add_block(understated));
        assert!(bc.add_block(block));
        assert_eq!(bc.len(), 2);
    }

    #[test]
    fn tampered_genesis_invalidates_chain() {
        let mut bc = Blockchain::new(1);
        assert!(bc.is_valid_chain());
        bc.chain[0].miner = "impostor".into();
        assert!(!bc.is_valid_chain());
    }
}
