use rand::Rng;

use super::model::Transaction;

/// Produce `count` demo transactions with random amounts in [1, 100).
pub fn generate_transactions(count: usize) -> Vec<Transaction> {
    let mut rng = rand::thread_rng();
    (0..count)
        .map(|i| {
            Transaction::new(
                format!("sender{i}"),
                format!("receiver{i}"),
                rng.gen_range(1.0..100.0),
                format!("data{i}"),
            )
        })
        .collect()
}
