use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};

use forumhub::{
    auth::{AccessFilter, TokenService},
    config::Config,
    db,
    error::error_handlers,
    routes,
    state::AppState,
};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            log::error!("invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    let tokens = TokenService::new(&config.jwt_secret, config.token_ttl())
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))?;
    let pool = db::connect(&config.database_url)
        .await
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
    let state = web::Data::new(AppState::new(pool, tokens, config.bcrypt_cost));

    if let Some(seed) = &config.admin {
        state
            .credentials
            .ensure_admin(seed)
            .await
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;
    }

    log::info!("Starting ForumHub server at {}", config.server_url());

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(AccessFilter)
            .wrap(error_handlers())
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header()
                    .max_age(3600),
            )
            .wrap(Logger::default())
            .configure(routes::config)
    })
    .bind((config.server_host.as_str(), config.server_port))?
    .run()
    .await
}
