pub mod generator;
pub mod model;

pub use generator::generate_transactions;
pub use model::{NETWORK_SENDER, Transaction};
