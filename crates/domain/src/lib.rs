//! cobro-domain - invoice and payment notification model

pub mod invoice;
pub mod payment;

pub use invoice::*;
pub use payment::*;
