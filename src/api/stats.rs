use actix_web::{HttpResponse, Responder, get, web};

use super::models::{AppState, StatsResponse};
use crate::consensus::{BLOCK_REWARD, RETARGET_INTERVAL};

#[get("/stats/")]
pub async fn get_stats(state: web::Data<AppState>) -> impl Responder {
    let cm = state.consensus.lock().expect("mutex poisoned");
    let chain = &cm.blockchain().chain;
    let height = chain.len();

    let last_interval_secs = if height >= 2 {
        Some((chain[height - 1].timestamp - chain[height - 2].timestamp).max(0.0))
    } else {
        None
    };

    // average spacing over the retarget window, genesis excluded
    let window = RETARGET_INTERVAL as usize;
    let avg_interval_secs = if height > window + 1 {
        let first = &chain[height - 1 - window];
        let last = &chain[height - 1];
        Some((last.timestamp - first.timestamp).max(0.0) / window as f64)
    } else {
        None
    };

    HttpResponse::Ok().json(StatsResponse {
        height,
        difficulty: cm.difficulty(),
        target_block_time_secs: cm.pofw().target_block_time(),
        retarget_interval: RETARGET_INTERVAL,
        block_reward: BLOCK_REWARD,
        last_interval_secs,
        avg_interval_secs,
        pending_size: cm.blockchain().pending_transactions.len(),
    })
}
