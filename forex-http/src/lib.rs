//! JSON server over the [forex] service along with a client for it.
//!
//! ``
//! cargo run --bin forex_server [ipv4_address] [port] [db_host db_user db_password db_name]
//! ``
//!
//! Without database arguments the server runs against an in-memory store seeded with the
//! supported currencies and a trailing window of rates.
pub mod config;
pub mod http;
