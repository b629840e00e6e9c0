use actix_web::{HttpResponse, Responder, get, post, web};
use log::{info, warn};

use super::models::{
    AppState, ChainResponse, DifficultyResponse, MineRequest, MineResponse, ValidateResponse,
};
use crate::blockchain::FractalCoordinate;
use crate::blocklog::BlockRecord;

/// Get the full blockchain.
#[get("/chain/")]
pub async fn get_chain(state: web::Data<AppState>) -> impl Responder {
    let cm = state.consensus.lock().expect("mutex poisoned");
    let bc = cm.blockchain();
    let resp = ChainResponse {
        length: bc.len(),
        difficulty: cm.difficulty(),
        chain: &bc.chain,
    };
    HttpResponse::Ok().json(resp)
}

/// Validate the whole chain, reporting the first fault if any.
#[get("/validate/")]
pub async fn validate_chain(state: web::Data<AppState>) -> impl Responder {
    let cm = state.consensus.lock().expect("mutex poisoned");
    let verdict = cm.verify_chain();
    if let Err(fault) = &verdict {
        warn!("VALIDATE - {}", fault);
    }
    HttpResponse::Ok().json(ValidateResponse {
        valid: verdict.is_ok(),
        length: cm.blockchain().len(),
        difficulty: cm.difficulty(),
        reason: verdict.err().map(|f| f.to_string()),
    })
}

/// Mine a new block from the pending pool:
/// - Snapshot up to 100 pending transactions into a candidate
/// - Sweep nonces (bounded by MAX_ITERATIONS)
/// - Admit the block, clean the pool, queue the miner's reward
/// - Append the result to the block log
#[post("/mine/")]
pub async fn mine_block(state: web::Data<AppState>, req: web::Json<MineRequest>) -> impl Responder {
    let miner_address = req.miner_address.trim().to_string();
    if miner_address.is_empty() {
        return HttpResponse::BadRequest().body("miner_address required");
    }
    let coord = req.coord.unwrap_or_else(FractalCoordinate::generate);

    let (result, difficulty) = {
        let mut cm = state.consensus.lock().expect("mutex poisoned");
        let block = cm.create_block(&miner_address, coord);
        let result = cm.mine_block(block, state.config.max_iterations);
        (result, cm.difficulty())
    };

    let Some(record) = BlockRecord::from_result(&result) else {
        warn!(
            "MINER - no block for {} after {:.3}s",
            miner_address,
            result.duration_secs()
        );
        return HttpResponse::ServiceUnavailable()
            .body("mining exhausted its nonce budget or the block was refused");
    };

    if let Err(e) = state.block_log.append(&record) {
        warn!("MINER - block log append failed: {}", e);
    }

    let mined_index = result.block.as_ref().map(|b| b.index).unwrap_or_default();
    let resp = MineResponse {
        mined_index,
        hash: result.hash.clone(),
        nonce: result.nonce,
        difficulty,
        duration_secs: result.duration_secs(),
        fractal_factor: result.fractal_factor,
        local_difficulty: result.local_difficulty,
        transactions: record.transactions.len(),
    };
    info!(
        "MINER - sealed block #{} (hash={}, nonce={})",
        resp.mined_index, resp.hash, resp.nonce
    );
    HttpResponse::Ok().json(resp)
}

/// Get current PoW difficulty.
#[get("/difficulty/")]
pub async fn get_difficulty(state: web::Data<AppState>) -> impl Responder {
    let cm = state.consensus.lock().expect("mutex poisoned");
    HttpResponse::Ok().json(DifficultyResponse {
        difficulty: cm.difficulty(),
        target: cm.pofw().target().to_string(),
    })
}
