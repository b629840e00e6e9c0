use log::{debug, info};
use rand::rngs::OsRng;
use secp256k1::{Message, PublicKey, Secp256k1, SecretKey, ecdsa::Signature};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::blockchain::{Blockchain, FractalCoordinate, unix_now};
use crate::transaction::Transaction;

/// Prefix of every wallet address.
pub const ADDRESS_PREFIX: &str = "TX";

#[derive(Debug, Error)]
pub enum WalletError {
    #[error("transaction amount must be positive, got {0}")]
    NonPositiveAmount(f64),
    #[error("insufficient funds: balance {balance}, requested {amount}")]
    InsufficientFunds { balance: f64, amount: f64 },
    #[error("invalid key material: {0}")]
    InvalidKey(String),
    #[error("signature error: {0}")]
    Signature(#[from] secp256k1::Error),
    #[error("wallet file error: {0}")]
    Io(#[from] std::io::Error),
    #[error("wallet encoding error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Anything that can authorize transactions on behalf of an address.
pub trait TransactionSigner {
    fn address(&self) -> &str;

    /// Attach a signature over the transaction's signing payload.
    fn sign_transaction(&self, tx: Transaction) -> Result<Transaction, WalletError>;

    /// Whether `tx` was sent by this signer and carries its valid signature.
    fn verify_transaction(&self, tx: &Transaction) -> bool;
}

/// secp256k1 key pair bound to a fractal coordinate, with a cached balance
/// and the history of transactions it created.
#[derive(Debug, Clone)]
pub struct Wallet {
    secret_key: SecretKey,
    public_key: PublicKey,
    address: String,
    pub fractal_coord: FractalCoordinate,
    pub balance: f64,
    pub transactions: Vec<Transaction>,
}

/// On-disk representation. Keys are stored unencrypted.
#[derive(Serialize, Deserialize)]
struct WalletFile {
    address: String,
    private_key: String,
    public_key: String,
    fractal_coord: FractalCoordinate,
    balance: f64,
    #[serde(default)]
    transactions: Vec<Transaction>,
}

impl Wallet {
    /// Fresh key pair at a random coordinate with a zero balance.
    pub fn generate() -> Self {
        let secp = Secp256k1::new();
        let (secret_key, public_key) = secp.generate_keypair(&mut OsRng);
        let fractal_coord = FractalCoordinate::generate();
        let address = derive_address(&public_key, &fractal_coord);
        debug!("WALLET - generated {}", address);
        Self {
            secret_key,
            public_key,
            address,
            fractal_coord,
            balance: 0.0,
            transactions: Vec::new(),
        }
    }

    pub fn public_key_hex(&self) -> String {
        hex::encode(self.public_key.serialize())
    }

    /// Build and sign a transfer from this wallet.
    ///
    /// The cached balance must cover `amount`; call `update_balance` first.
    pub fn create_transaction(
        &mut self,
        receiver: &str,
        amount: f64,
        data: &str,
    ) -> Result<Transaction, WalletError> {
        if amount <= 0.0 {
            return Err(WalletError::NonPositiveAmount(amount));
        }
        if self.balance < amount {
            return Err(WalletError::InsufficientFunds {
                balance: self.balance,
                amount,
            });
        }

        let tx_id = format!(
            "tx-{}-{}",
            chrono::Utc::now().timestamp(),
            hex::encode(rand::random::<[u8; 4]>())
        );
        let tx = Transaction::with_id(tx_id, self.address.clone(), receiver, amount, data, unix_now());
        let tx = self.sign_transaction(tx)?;
        self.transactions.push(tx.clone());
        Ok(tx)
    }

    /// Refresh the cached balance from confirmed blocks.
    pub fn update_balance(&mut self, blockchain: &Blockchain) -> f64 {
        self.balance = blockchain.balance_of(&self.address);
        self.balance
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), WalletError> {
        let file = WalletFile {
            address: self.address.clone(),
            private_key: hex::encode(self.secret_key.secret_bytes()),
            public_key: self.public_key_hex(),
            fractal_coord: self.fractal_coord,
            balance: self.balance,
            transactions: self.transactions.clone(),
        };
        fs::write(path.as_ref(), serde_json::to_string_pretty(&file)?)?;
        info!("WALLET - saved {} to {}", self.address, path.as_ref().display());
        Ok(())
    }

    /// Load a wallet written by `save`. The stored public key and address
    /// must agree with the private key.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, WalletError> {
        let raw = fs::read_to_string(path.as_ref())?;
        let file: WalletFile = serde_json::from_str(&raw)?;

        let sk_bytes = hex::decode(&file.private_key)
            .map_err(|_| WalletError::InvalidKey("private key is not hex".into()))?;
        let secret_key = SecretKey::from_slice(&sk_bytes)?;
        let public_key = PublicKey::from_secret_key(&Secp256k1::new(), &secret_key);

        if hex::encode(public_key.serialize()) != file.public_key {
            return Err(WalletError::InvalidKey(
                "public key does not match private key".into(),
            ));
        }
        if derive_address(&public_key, &file.fractal_coord) != file.address {
            return Err(WalletError::InvalidKey(
                "address does not match key and coordinate".into(),
            ));
        }

        Ok(Self {
            secret_key,
            public_key,
            address: file.address,
            fractal_coord: file.fractal_coord,
            balance: file.balance,
            transactions: file.transactions,
        })
    }
}

impl TransactionSigner for Wallet {
    fn address(&self) -> &str {
        &self.address
    }

    fn sign_transaction(&self, mut tx: Transaction) -> Result<Transaction, WalletError> {
        let secp = Secp256k1::signing_only();
        let msg = Message::from_digest_slice(&tx.sighash())?;
        let sig = secp.sign_ecdsa(&msg, &self.secret_key);
        tx.attach_signature(hex::encode(sig.serialize_der().to_vec()));
        Ok(tx)
    }

    fn verify_transaction(&self, tx: &Transaction) -> bool {
        if tx.sender != self.address {
            return false;
        }
        let Some(sig_hex) = tx.signature.as_deref() else {
            return false;
        };
        verify_signature_hex(&self.public_key, sig_hex, tx.sighash()).unwrap_or(false)
    }
}

/// "TX" followed by the first 40 hex chars of the double SHA-256 of the
/// compressed public key and the coordinate.
fn derive_address(public_key: &PublicKey, coord: &FractalCoordinate) -> String {
    let mut first = Sha256::new();
    first.update(public_key.serialize());
    first.update(format!("{:?}", coord.as_tuple()).as_bytes());
    let second = Sha256::digest(first.finalize());
    format!("{}{}", ADDRESS_PREFIX, &hex::encode(second)[..40])
}

/// Verify a hex DER signature against `msg32`.
fn verify_signature_hex(
    public_key: &PublicKey,
    sig_hex: &str,
    msg32: [u8; 32],
) -> Result<bool, WalletError> {
    let secp = Secp256k1::verification_only();
    let sig_bytes = hex::decode(sig_hex)
        .map_err(|_| WalletError::InvalidKey("signature is not hex".into()))?;
    let sig = Signature::from_der(&sig_bytes)?;
    let msg = Message::from_digest_slice(&msg32)?;
    Ok(secp.verify_ecdsa(&msg, &sig, public_key).is_ok())
}

/// Generate a new secp256k1 keypair and return (priv_hex, pub_hex_compressed, address).
/// The address is bound to a freshly drawn coordinate.
pub fn generate_keypair_hex() -> (String, String, String) {
    let wallet = Wallet::generate();
    (
        hex::encode(wallet.secret_key.secret_bytes()),
        wallet.public_key_hex(),
        wallet.address,
    )
}
