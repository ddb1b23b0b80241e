//! cobro-api - invoice lookup and payment notification HTTP service

pub mod api;
pub mod state;

pub use api::{
    app, build_router, PaymentRecorded, DB_ERROR_INVOICES, DB_ERROR_PAYMENT, PAYMENT_RECORDED,
    UNEXPECTED_ERROR,
};
pub use state::{AppState, DB_UNAVAILABLE};
