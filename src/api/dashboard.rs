use actix_web::{HttpResponse, Responder, get, web};
use log::error;

use super::models::{AppState, DashboardResponse};

/// Number of log records shown on the dashboard.
const DASHBOARD_BLOCKS: usize = 10;

/// Most recent mined blocks from the block log, oldest first.
#[get("/dashboard/")]
pub async fn get_dashboard(state: web::Data<AppState>) -> impl Responder {
    match state.block_log.recent(DASHBOARD_BLOCKS) {
        Ok(blocks) => HttpResponse::Ok().json(DashboardResponse { blocks }),
        Err(e) => {
            error!("DASHBOARD - {}", e);
            HttpResponse::InternalServerError().body("block log unavailable")
        }
    }
}
