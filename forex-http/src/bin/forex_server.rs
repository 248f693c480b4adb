use std::env;
use std::sync::Arc;

use actix_web::middleware::Logger;
use actix_web::{web, App, HttpServer};
use log::info;

use forex::clock::DateTime;
use forex::seed::seed_all;
use forex::service::ForexService;
use forex::store::memory::MemoryStore;
use forex::store::postgres::PostgresStore;
use forex::store::RateStore;
use forex_http::config::ServerConfig;
use forex_http::http::forex_v1::server::configure;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args: Vec<String> = env::args().skip(1).collect();
    let config = ServerConfig::from_args(&args)?;

    let store: Arc<dyn RateStore> = match &config.database {
        Some(db) => {
            let store = PostgresStore::new(&db.host, &db.user, &db.password, &db.dbname)?;
            store.migrate().await?;
            info!("SERVER: Using database {} on {}", db.dbname, db.host);
            Arc::new(store)
        }
        None => {
            let store = MemoryStore::new();
            seed_all(&store, DateTime::now(), config.seed_days).await?;
            info!("SERVER: Using seeded in-memory store");
            Arc::new(store)
        }
    };

    let forex_state = web::Data::new(ForexService::new(store, config.service.clone()));

    info!("SERVER: Listening on {}:{}", config.address, config.port);
    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .app_data(forex_state.clone())
            .configure(configure)
    })
    .bind((config.address.clone(), config.port))?
    .run()
    .await?;
    Ok(())
}
