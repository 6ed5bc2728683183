use actix_web::middleware::{DefaultHeaders, Logger};
use actix_web::{web, App, HttpServer};
use log::{info, warn};

use loan_approval_api::config::ServerConfig;
use loan_approval_api::inference::load_classifier;
use loan_approval_api::routes::{self, AppState};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .format_module_path(false)
        .init();

    info!("Starting the Loan Approval Prediction API");

    let config = ServerConfig::from_env();
    let state = AppState::new(load_classifier(&config.model_path));
    if !state.is_model_loaded() {
        warn!("Serving without a model, /predict will answer \"Model not loaded\"");
    }
    let state = web::Data::new(state);

    let bind_address = config.bind_address();
    let json_limit = config.json_limit;

    info!("Listening on http://{}", bind_address);
    info!("Workers: {}", config.workers);
    info!("Endpoints:");
    info!("   GET  /         - welcome message");
    info!("   POST /predict  - loan approval decision");

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(DefaultHeaders::new().add(("X-Content-Type-Options", "nosniff")))
            .wrap(routes::cors())
            .app_data(state.clone())
            .app_data(routes::json_config(json_limit))
            .configure(routes::configure)
            .default_service(web::to(routes::not_found))
    })
    .workers(config.workers)
    .bind(&bind_address)?
    .run()
    .await
}
