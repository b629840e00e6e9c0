use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::blockchain::unix_now;

/// Sender used for transactions minted by the network (mining rewards).
pub const NETWORK_SENDER: &str = "network";

/// A value transfer waiting for (or included in) a block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// A stable identifier computed from content unless supplied explicitly.
    pub tx_id: String,
    pub sender: String,
    pub receiver: String,
    pub amount: f64,
    pub data: String,
    /// Creation time in fractional Unix seconds.
    pub timestamp: f64,
    /// Hex-encoded DER ECDSA signature attached by a signer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
}

impl Transaction {
    /// Build a transaction stamped with the current time.
    pub fn new(
        sender: impl Into<String>,
        receiver: impl Into<String>,
        amount: f64,
        data: impl Into<String>,
    ) -> Self {
        Self::with_timestamp(sender, receiver, amount, data, unix_now())
    }

    /// Build a transaction with a caller-chosen timestamp; the id is derived
    /// deterministically from the content.
    pub fn with_timestamp(
        sender: impl Into<String>,
        receiver: impl Into<String>,
        amount: f64,
        data: impl Into<String>,
        timestamp: f64,
    ) -> Self {
        let mut tx = Self {
            tx_id: String::new(),
            sender: sender.into(),
            receiver: receiver.into(),
            amount,
            data: data.into(),
            timestamp,
            signature: None,
        };
        tx.tx_id = tx.calculate_hash();
        tx
    }

    /// Build a transaction that carries an explicit identifier.
    pub fn with_id(
        tx_id: impl Into<String>,
        sender: impl Into<String>,
        receiver: impl Into<String>,
        amount: f64,
        data: impl Into<String>,
        timestamp: f64,
    ) -> Self {
        Self {
            tx_id: tx_id.into(),
            sender: sender.into(),
            receiver: receiver.into(),
            amount,
            data: data.into(),
            timestamp,
            signature: None,
        }
    }

    /// SHA-256 over sender, receiver, amount, data and timestamp.
    ///
    /// Reals use the shortest round-trip form, so `10.0` renders as `10.0`.
    pub fn calculate_hash(&self) -> String {
        let preimage = format!(
            "{}{}{:?}{}{:?}",
            self.sender, self.receiver, self.amount, self.data, self.timestamp
        );
        let mut hasher = Sha256::new();
        hasher.update(preimage.as_bytes());
        hex::encode(hasher.finalize())
    }

    /// Message covered by a signature: the id followed by every content field.
    pub fn signing_payload(&self) -> Vec<u8> {
        format!(
            "{}{}{}{:?}{}{:?}",
            self.tx_id, self.sender, self.receiver, self.amount, self.data, self.timestamp
        )
        .into_bytes()
    }

    /// SHA-256 of the signing payload.
    pub fn sighash(&self) -> [u8; 32] {
        let mut hasher = Sha256::new();
        hasher.update(self.signing_payload());
        hasher.finalize().into()
    }

    pub fn attach_signature(&mut self, signature: String) {
        self.signature = Some(signature);
    }

    pub fn is_reward(&self) -> bool {
        self.sender == NETWORK_SENDER
    }
}

#[cfg(test)]
mod tests {
    use super::Transaction;

    #[test]
    fn tx_id_is_reproducible() {
        let a = Transaction::with_timestamp("alice", "bob", 10.0, "rent", 1_700_000_000.5);
        let b = Transaction::with_timestamp("alice", "bob", 10.0, "rent", 1_700_000_000.5);
        assert!(!a.tx_id.is_empty());
        assert_eq!(a.tx_id, b.tx_id);
        assert_eq!(a.tx_id, a.calculate_hash());
    }

    #[test]
    fn tx_id_depends_on_every_field() {
        let base = Transaction::with_timestamp("alice", "bob", 10.0, "rent", 1.0);
        let others = [
            Transaction::with_timestamp("carol", "bob", 10.0, "rent", 1.0),
            Transaction::with_timestamp("alice", "dave", 10.0, "rent", 1.0),
            Transaction::with_timestamp("alice", "bob", 10.5, "rent", 1.0),
            Transaction::with_timestamp("alice", "bob", 10.0, "food", 1.0),
            Transaction::with_timestamp("alice", "bob", 10.0, "rent", 2.0),
        ];
        for other in others {
            assert_ne!(base.tx_id, other.tx_id);
        }
    }

    #[test]
    fn explicit_id_is_kept() {
        let tx = Transaction::with_id("reward-1", "network", "miner", 10.0, "Mining reward", 5.0);
        assert_eq!(tx.tx_id, "reward-1");
        assert!(tx.is_reward());
    }

    #[test]
    fn each_transaction_gets_its_own_timestamp() {
        let first = Transaction::new("a", "b", 1.0, "");
        std::thread::sleep(std::time::Duration::from_millis(2));
        let second = Transaction::new("a", "b", 1.0, "");
        assert!(second.timestamp > first.timestamp);
        assert_ne!(first.tx_id, second.tx_id);
    }

    #[test]
    fn unsigned_transactions_omit_signature_field() {
        let tx = Transaction::with_timestamp("a", "b", 1.0, "", 1.0);
        let json = serde_json::to_value(&tx).unwrap();
        assert!(json.get("signature").is_none());

        let mut signed = tx.clone();
        signed.attach_signature("3045".into());
        let json = serde_json::to_value(&signed).unwrap();
        assert_eq!(json["signature"], "3045");
    }
}
