use std::env;

use anyhow::Context;
use log::info;

use forex::clock::DateTime;
use forex::seed::{seed_all, DEFAULT_SEED_DAYS};
use forex::store::postgres::PostgresStore;
use forex_http::config::DatabaseConfig;

/// forex_seed [host] [user] [password] [dbname] [days]
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args: Vec<String> = env::args().skip(1).collect();

    let db = DatabaseConfig::from_args(args.get(..4).unwrap_or(&args))?;
    let days: u32 = match args.get(4) {
        Some(days) => days
            .parse()
            .with_context(|| format!("Invalid number of days: {days}"))?,
        None => DEFAULT_SEED_DAYS,
    };

    let store = PostgresStore::new(&db.host, &db.user, &db.password, &db.dbname)?;
    store.migrate().await?;
    let written = seed_all(&store, DateTime::now(), days).await?;
    info!("SEED: Finished with {:?} rates in {}", written, db.dbname);
    Ok(())
}
