use actix_web::{App, HttpServer, web};
use dotenvy::dotenv;
use log::info;

use fractal_ledger::api::{self, AppState};
use fractal_ledger::config::NodeConfig;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let _ = dotenv();
    env_logger::init();

    let config = NodeConfig::from_env();
    let (host, port) = (config.host.clone(), config.port);

    info!(
        "NODE - difficulty={}, max_iterations={}, target_block_time={}s, block_log={}",
        config.initial_difficulty,
        config.max_iterations,
        config.target_block_time_secs,
        config.block_log_path
    );
    println!("⛓️ Starting fractal ledger API at http://{host}:{port}");

    let state = web::Data::new(AppState::new(config));

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .configure(api::init_routes)
    })
    .bind((host.as_str(), port))?
    .run()
    .await
}
