use actix_web::{web, App, HttpServer};
use log::info;

use chess_game_client::models::AppState;
use chess_game_client::routes::configure_routes;
use chess_game_client::ServerConfig;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Initialize logger
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = ServerConfig::from_env();
    let address = (config.host.clone(), config.port);
    info!("Starting move server at http://{}:{}", address.0, address.1);

    // Create shared application state
    let app_state = web::Data::new(AppState::new(config));

    // Start HTTP server
    HttpServer::new(move || App::new().app_data(app_state.clone()).configure(configure_routes))
        .bind(address)?
        .run()
        .await
}
