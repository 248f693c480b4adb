use anyhow::{bail, Context, Result};

use forex::seed::DEFAULT_SEED_DAYS;
use forex::service::ServiceConfig;

pub const DEFAULT_ADDRESS: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8000;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DatabaseConfig {
    pub host: String,
    pub user: String,
    pub password: String,
    pub dbname: String,
}

impl DatabaseConfig {
    /// Expects exactly `host user password dbname`.
    pub fn from_args(args: &[String]) -> Result<Self> {
        match args {
            [host, user, password, dbname] => Ok(Self {
                host: host.clone(),
                user: user.clone(),
                password: password.clone(),
                dbname: dbname.clone(),
            }),
            _ => bail!("Database needs host, user, password and dbname"),
        }
    }
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub address: String,
    pub port: u16,
    //In-memory store when None
    pub database: Option<DatabaseConfig>,
    pub seed_days: u32,
    pub service: ServiceConfig,
}

impl ServerConfig {
    /// Positional arguments, program name excluded: `[address] [port] [host user password dbname]`.
    pub fn from_args(args: &[String]) -> Result<Self> {
        let address = args
            .first()
            .cloned()
            .unwrap_or_else(|| DEFAULT_ADDRESS.to_string());

        let port = match args.get(1) {
            Some(port) => port
                .parse()
                .with_context(|| format!("Invalid port: {port}"))?,
            None => DEFAULT_PORT,
        };

        let database = match args.get(2..) {
            Some(rest) if !rest.is_empty() => Some(DatabaseConfig::from_args(rest)?),
            _ => None,
        };

        Ok(Self {
            address,
            port,
            database,
            seed_days: DEFAULT_SEED_DAYS,
            service: ServiceConfig::default(),
        })
    }
}
