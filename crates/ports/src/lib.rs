//! cobro-ports - abstract database seams
//!
//! Handlers talk to the database only through these traits, so the HTTP
//! layer can be exercised without a live server.

mod connection;
mod unit_of_work;

pub use connection::*;
pub use unit_of_work::*;
