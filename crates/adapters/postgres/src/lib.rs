//! cobro-adapter-postgres - PostgreSQL adapter

mod config;
mod connection;
mod queries;

pub use config::*;
pub use connection::*;
pub use queries::*;
