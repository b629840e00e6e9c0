use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use sha2::{Digest, Sha256};

use super::{FractalCoordinate, GENESIS_MINER, GENESIS_PREVIOUS_HASH};
use crate::transaction::Transaction;

/// A single block in the chain holding an ordered list of transactions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub index: u64,
    pub timestamp: f64, // fractional Unix seconds
    pub transactions: Vec<Transaction>,
    pub miner: String,
    pub fractal_coord: FractalCoordinate,
    pub previous_hash: String,
    pub nonce: u64,   // Proof-of-Work nonce
    pub hash: String, // Cached hash of the block
    /// Difficulty in force when the block was mined. Not part of the hash.
    #[serde(default)]
    pub difficulty: u32,
}

impl Block {
    /// Create a new block (not mined yet). Nonce and hash start at defaults.
    pub fn new(
        index: u64,
        timestamp: f64,
        transactions: Vec<Transaction>,
        miner: impl Into<String>,
        fractal_coord: FractalCoordinate,
        previous_hash: impl Into<String>,
    ) -> Self {
        Self {
            index,
            timestamp,
            transactions,
            miner: miner.into(),
            fractal_coord,
            previous_hash: previous_hash.into(),
            nonce: 0,
            hash: String::new(),
            difficulty: 0,
        }
    }

    /// Create the genesis block for a chain starting at `difficulty`.
    pub fn genesis(difficulty: u32) -> Self {
        let mut block = Self::new(
            0,
            0.0,
            Vec::new(),
            GENESIS_MINER,
            FractalCoordinate::origin(),
            GENESIS_PREVIOUS_HASH,
        );
        block.difficulty = difficulty;
        block.seal();
        block
    }

    /// Canonical preimage: a sorted-key JSON object over index, timestamp,
    /// transactions, previous_hash, miner, fractal_coord and nonce.
    pub fn canonical_json(&self) -> String {
        let transactions: Vec<Value> = self.transactions.iter().map(transaction_value).collect();
        let value = json!({
            "index": self.index,
            "timestamp": self.timestamp,
            "transactions": transactions,
            "previous_hash": self.previous_hash,
            "miner": self.miner,
            "fractal_coord": {
                "a": self.fractal_coord.a,
                "b": self.fractal_coord.b,
                "c": self.fractal_coord.c,
            },
            "nonce": self.nonce,
        });
        value.to_string()
    }

    /// SHA-256 of the canonical preimage, hex encoded.
    pub fn calculate_hash(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.canonical_json().as_bytes());
        hex::encode(hasher.finalize())
    }

    /// Store the freshly computed hash.
    pub fn seal(&mut self) {
        self.hash = self.calculate_hash();
    }

    /// Whether the cached hash starts with `difficulty` zero characters.
    pub fn meets_difficulty(&self, difficulty: u32) -> bool {
        self.hash.len() >= difficulty as usize
            && self
                .hash
                .chars()
                .take(difficulty as usize)
                .all(|c| c == '0')
    }

    pub fn is_genesis(&self) -> bool {
        self.index == 0 && self.previous_hash == GENESIS_PREVIOUS_HASH
    }
}

fn transaction_value(tx: &Transaction) -> Value {
    let mut value = json!({
        "tx_id": tx.tx_id,
        "sender": tx.sender,
        "receiver": tx.receiver,
        "amount": tx.amount,
        "data": tx.data,
        "timestamp": tx.timestamp,
    });
    if let (Some(signature), Value::Object(map)) = (&tx.signature, &mut value) {
        map.insert("signature".to_string(), Value::String(signature.clone()));
    }
    value
}
