mod balance;
mod chain;
mod dashboard;
mod health;
pub mod models;
mod stats;
mod tx;
mod wallet;

use actix_web::web::{self, ServiceConfig};

pub use models::AppState;

pub fn init_routes(cfg: &mut ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .service(health::health_check)
            .service(chain::get_chain)
            .service(chain::validate_chain)
            .service(chain::mine_block)
            .service(chain::get_difficulty)
            .service(tx::post_generate)
            .service(tx::post_transaction)
            .service(tx::get_pending)
            .service(balance::get_balance)
            .service(stats::get_stats)
            .service(wallet::create_wallet)
            .service(dashboard::get_dashboard),
    );
}

#[cfg(test)]
mod tests {
    use super::{AppState, init_routes};
    use crate::config::NodeConfig;
    use actix_web::{App, test, web};
    use serde_json::{Value, json};

    fn state(dir: &tempfile::TempDir) -> web::Data<AppState> {
        let config = NodeConfig {
            initial_difficulty: 1,
            max_iterations: 100_000,
            block_log_path: dir.path().join("blocks.json").display().to_string(),
            ..NodeConfig::default()
        };
        web::Data::new(AppState::new(config))
    }

    #[actix_web::test]
    async fn health_responds() {
        let dir = tempfile::tempdir().expect("tempdir");
        let app = test::init_service(App::new().app_data(state(&dir)).configure(init_routes)).await;
        let req = test::TestRequest::get().uri("/api/v1/health/").to_request();
        let resp = test::call_service(&app, req).await;
        assert!(resp.status().is_success());
    }

    #[actix_web::test]
    async fn fresh_chain_is_valid_genesis() {
        let dir = tempfile::tempdir().expect("tempdir");
        let app = test::init_service(App::new().app_data(state(&dir)).configure(init_routes)).await;

        let req = test::TestRequest::get().uri("/api/v1/chain/").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["length"], 1);
        assert_eq!(body["chain"][0]["index"], 0);

        let req = test::TestRequest::get().uri("/api/v1/validate/").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["valid"], true);
    }

    #[actix_web::test]
    async fn rejects_bad_transactions() {
        let dir = tempfile::tempdir().expect("tempdir");
        let app = test::init_service(App::new().app_data(state(&dir)).configure(init_routes)).await;
        let req = test::TestRequest::post()
            .uri("/api/v1/tx/")
            .set_json(json!({"sender": "a", "receiver": "b", "amount": 0.0}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status().as_u16(), 400);
    }

    #[actix_web::test]
    async fn submit_mine_and_read_back() {
        let dir = tempfile::tempdir().expect("tempdir");
        let app = test::init_service(App::new().app_data(state(&dir)).configure(init_routes)).await;

        let req = test::TestRequest::post()
            .uri("/api/v1/tx/")
            .set_json(json!({"sender": "alice", "receiver": "bob", "amount": 5.0, "timestamp": 1.0}))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert!(body["tx_id"].as_str().is_some_and(|id| id.len() == 64));

        let req = test::TestRequest::post()
            .uri("/api/v1/tx/generate/")
            .set_json(json!({"count": 3}))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["pending_size"], 4);

        let req = test::TestRequest::post()
            .uri("/api/v1/mine/")
            .set_json(json!({"miner_address": "miner-1", "coord": {"a": 0.0, "b": 0.0, "c": 0.0}}))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["mined_index"], 1);
        assert_eq!(body["transactions"], 4);
        assert!(body["hash"].as_str().is_some_and(|h| h.starts_with('0')));

        let req = test::TestRequest::get().uri("/api/v1/pending/").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["size"], 1);
        assert_eq!(body["transactions"][0]["receiver"], "miner-1");

        let req = test::TestRequest::get().uri("/api/v1/balance/bob/").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["balance"], 5.0);

        let req = test::TestRequest::get().uri("/api/v1/dashboard/").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["blocks"].as_array().map(Vec::len), Some(1));

        let req = test::TestRequest::get().uri("/api/v1/stats/").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["height"], 2);
        assert_eq!(body["pending_size"], 1);
    }

    #[actix_web::test]
    async fn mining_requires_an_address() {
        let dir = tempfile::tempdir().expect("tempdir");
        let app = test::init_service(App::new().app_data(state(&dir)).configure(init_routes)).await;
        let req = test::TestRequest::post()
            .uri("/api/v1/mine/")
            .set_json(json!({"miner_address": "  "}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status().as_u16(), 400);
    }

    #[actix_web::test]
    async fn new_wallet_has_tx_address() {
        let dir = tempfile::tempdir().expect("tempdir");
        let app = test::init_service(App::new().app_data(state(&dir)).configure(init_routes)).await;
        let req = test::TestRequest::post().uri("/api/v1/wallet/new/").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert!(body["address"].as_str().is_some_and(|a| a.starts_with("TX")));
        assert_eq!(body["public_key"].as_str().map(str::len), Some(66));
    }
}
