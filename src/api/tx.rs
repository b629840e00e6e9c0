use actix_web::{HttpResponse, Responder, get, post, web};
use log::{debug, info, warn};

use super::models::{
    AppState, GenerateTxRequest, GenerateTxResponse, NewTxRequest, NewTxResponse, PendingResponse,
};
use crate::transaction::{Transaction, generate_transactions};

/// Upper bound for one `/tx/generate/` call.
const MAX_GENERATED: usize = 1_000;

/// Submit a new transaction into the pending pool.
#[post("/tx/")]
pub async fn post_transaction(
    state: web::Data<AppState>,
    body: web::Json<NewTxRequest>,
) -> impl Responder {
    let body = body.into_inner();
    if body.sender.trim().is_empty() || body.receiver.trim().is_empty() {
        warn!("POST /tx/ - rejected: missing sender or receiver");
        return HttpResponse::BadRequest().body("sender and receiver required");
    }
    if !body.amount.is_finite() || body.amount <= 0.0 {
        warn!("POST /tx/ - rejected: amount {}", body.amount);
        return HttpResponse::BadRequest().body("amount must be > 0");
    }

    let mut tx = match body.timestamp {
        Some(ts) => Transaction::with_timestamp(body.sender, body.receiver, body.amount, body.data, ts),
        None => Transaction::new(body.sender, body.receiver, body.amount, body.data),
    };
    if let Some(sig) = body.signature {
        tx.attach_signature(sig);
    }
    debug!("POST /tx/ - built tx_id={}", tx.tx_id);

    let tx_id = tx.tx_id.clone();
    let size = {
        let mut cm = state.consensus.lock().expect("mutex poisoned");
        cm.add_transaction(tx);
        cm.blockchain().pending_transactions.len()
    };

    info!("POST /tx/ - tx_id={} queued (pending={})", tx_id, size);
    HttpResponse::Ok().json(NewTxResponse { tx_id })
}

/// Queue `count` synthetic transactions (load testing / demos).
#[post("/tx/generate/")]
pub async fn post_generate(
    state: web::Data<AppState>,
    body: web::Json<GenerateTxRequest>,
) -> impl Responder {
    if body.count == 0 || body.count > MAX_GENERATED {
        return HttpResponse::BadRequest().body(format!("count must be in 1..={MAX_GENERATED}"));
    }

    let txs = generate_transactions(body.count);
    let tx_ids = txs.iter().map(|t| t.tx_id.clone()).collect::<Vec<_>>();

    let mut cm = state.consensus.lock().expect("mutex poisoned");
    for tx in txs {
        cm.add_transaction(tx);
    }
    HttpResponse::Ok().json(GenerateTxResponse {
        tx_ids,
        pending_size: cm.blockchain().pending_transactions.len(),
    })
}

/// List the pending pool in arrival order.
#[get("/pending/")]
pub async fn get_pending(state: web::Data<AppState>) -> impl Responder {
    let cm = state.consensus.lock().expect("mutex poisoned");
    let pending = &cm.blockchain().pending_transactions;
    HttpResponse::Ok().json(PendingResponse {
        size: pending.len(),
        transactions: pending.clone(),
    })
}
