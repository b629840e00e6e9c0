use actix_web::{HttpResponse, Responder, get, web};

use super::models::{AppState, BalanceResponse};

/// Confirmed balance; pending transactions do not count.
#[get("/balance/{address}/")]
pub async fn get_balance(state: web::Data<AppState>, path: web::Path<(String,)>) -> impl Responder {
    let address = path.into_inner().0;

    let balance = {
        let cm = state.consensus.lock().expect("mutex poisoned");
        cm.blockchain().balance_of(&address)
    };

    HttpResponse::Ok().json(BalanceResponse { address, balance })
}
