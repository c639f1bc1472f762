pub mod app;
pub mod cli;
pub mod commands;
pub mod config;
pub mod server;

pub const DEFAULT_LOG_FILTER: &str =
    "conforma=info,conforma_core=info,conforma_broker=info,conforma_engines=info,conforma_network=info";
