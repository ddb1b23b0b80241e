//! cobro-bootstrap - service startup skeleton

mod runtime;
mod starter;

pub use runtime::*;
pub use starter::*;
