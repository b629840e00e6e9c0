//! Append-only JSON-lines log of mined blocks, read back by the dashboard.

use log::debug;
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::consensus::MiningResult;
use crate::transaction::Transaction;

#[derive(Debug, Error)]
pub enum BlockLogError {
    #[error("block log io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("block log encoding error: {0}")]
    Json(#[from] serde_json::Error),
}

/// One line of the log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockRecord {
    pub hash: String,
    pub nonce: u64,
    /// Seconds spent mining.
    pub duration: f64,
    pub coord: (f64, f64, f64),
    pub block_time: f64,
    pub transactions: Vec<Transaction>,
}

impl BlockRecord {
    /// Record for a successful mining result, `None` when nothing was mined.
    pub fn from_result(result: &MiningResult) -> Option<Self> {
        let block = result.block.as_ref()?;
        Some(Self {
            hash: result.hash.clone(),
            nonce: result.nonce,
            duration: result.duration_secs(),
            coord: block.fractal_coord.as_tuple(),
            block_time: block.timestamp,
            transactions: block.transactions.clone(),
        })
    }
}

#[derive(Debug, Clone)]
pub struct BlockLog {
    path: PathBuf,
}

impl BlockLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&self, record: &BlockRecord) -> Result<(), BlockLogError> {
        let mut line = serde_json::to_string(record)?;
        line.push('\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(line.as_bytes())?;
        debug!("BLOCKLOG - appended {} to {}", record.hash, self.path.display());
        Ok(())
    }

    /// The last `n` records in file order. A missing file reads as empty.
    pub fn recent(&self, n: usize) -> Result<Vec<BlockRecord>, BlockLogError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let records = raw
            .lines()
            .filter(|l| !l.trim().is_empty())
            .map(serde_json::from_str)
            .collect::<Result<Vec<BlockRecord>, _>>()?;

        let skip = records.len().saturating_sub(n);
        Ok(records.into_iter().skip(skip).collect())
    }
}
