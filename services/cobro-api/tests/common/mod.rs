//! Recording mocks for the database ports

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    body::Body,
    extract::connect_info::MockConnectInfo,
    http::{Request, Response},
    Router,
};
use cobro_api::{app, AppState};
use cobro_domain::{CustomerId, Invoice, PaymentNotification};
use cobro_errors::{AppError, AppResult};
use cobro_ports::{BillingConnection, ConnectionProvider, UnitOfWork};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Connect,
    Begin,
    FetchInvoices { id_type: String, id_number: String },
    InsertPayment(Box<PaymentNotification>),
    Commit,
    Rollback,
    Ping,
    Close,
}

/// What the mock database does
#[derive(Debug, Clone, Default)]
pub struct Script {
    pub connect_fails: bool,
    pub invoices: Vec<Invoice>,
    pub fetch_error: Option<String>,
    pub fetch_panics: bool,
    pub insert_id: Option<i64>,
    pub insert_error: Option<String>,
    pub commit_error: Option<String>,
    pub ping_error: Option<String>,
}

#[derive(Clone, Default)]
pub struct MockProvider {
    pub calls: Arc<Mutex<Vec<Call>>>,
    pub script: Script,
}

impl MockProvider {
    pub fn new(script: Script) -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
            script,
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, matches: impl Fn(&Call) -> bool) -> usize {
        self.calls().iter().filter(|c| matches(c)).count()
    }

    pub fn router(&self) -> Router {
        app(AppState::new(Arc::new(self.clone())))
    }

    /// Router that sees every request as coming from `peer`
    pub fn router_with_peer(&self, peer: SocketAddr) -> Router {
        self.router().layer(MockConnectInfo(peer))
    }
}

#[async_trait]
impl ConnectionProvider for MockProvider {
    async fn connect(&self) -> Option<Box<dyn BillingConnection>> {
        self.calls.lock().unwrap().push(Call::Connect);
        if self.script.connect_fails {
            return None;
        }
        Some(Box::new(MockConnection {
            calls: self.calls.clone(),
            script: self.script.clone(),
        }))
    }
}

pub struct MockConnection {
    calls: Arc<Mutex<Vec<Call>>>,
    script: Script,
}

impl MockConnection {
    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

fn scripted(error: &Option<String>) -> AppResult<()> {
    match error {
        Some(msg) => Err(AppError::database(msg.clone())),
        None => Ok(()),
    }
}

#[async_trait]
impl UnitOfWork for MockConnection {
    async fn begin(&mut self) -> AppResult<()> {
        self.record(Call::Begin);
        Ok(())
    }

    async fn commit(&mut self) -> AppResult<()> {
        self.record(Call::Commit);
        scripted(&self.script.commit_error)
    }

    async fn rollback(&mut self) -> AppResult<()> {
        self.record(Call::Rollback);
        Ok(())
    }
}

#[async_trait]
impl BillingConnection for MockConnection {
    async fn fetch_invoices(&mut self, customer: &CustomerId) -> AppResult<Vec<Invoice>> {
        self.record(Call::FetchInvoices {
            id_type: customer.id_type.clone(),
            id_number: customer.id_number.clone(),
        });
        if self.script.fetch_panics {
            panic!("driver crashed");
        }
        scripted(&self.script.fetch_error)?;
        Ok(self.script.invoices.clone())
    }

    async fn insert_payment(
        &mut self,
        notification: &PaymentNotification,
    ) -> AppResult<Option<i64>> {
        self.record(Call::InsertPayment(Box::new(notification.clone())));
        scripted(&self.script.insert_error)?;
        Ok(self.script.insert_id)
    }

    async fn ping(&mut self) -> AppResult<()> {
        self.record(Call::Ping);
        scripted(&self.script.ping_error)
    }

    async fn close(self: Box<Self>) {
        self.record(Call::Close);
    }
}

pub fn is_connect(call: &Call) -> bool {
    matches!(call, Call::Connect)
}

pub fn is_close(call: &Call) -> bool {
    matches!(call, Call::Close)
}

pub fn is_insert(call: &Call) -> bool {
    matches!(call, Call::InsertPayment(_))
}

pub fn is_commit(call: &Call) -> bool {
    matches!(call, Call::Commit)
}

pub fn is_rollback(call: &Call) -> bool {
    matches!(call, Call::Rollback)
}

pub async fn send(router: Router, request: Request<Body>) -> (u16, Value) {
    let response: Response<Body> = router.oneshot(request).await.unwrap();
    let status = response.status().as_u16();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| {
            Value::String(String::from_utf8_lossy(&bytes).into_owned())
        })
    };
    (status, body)
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub fn post_json(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn invoice(number: i64, amount: &str) -> Invoice {
    let amount = rust_decimal::Decimal::from_str_exact(amount).unwrap();
    Invoice {
        invoice_number: number,
        local_amount: Some(amount),
        policy_number: Some("AUTO-0042".to_string()),
        receipt_number: Some(number * 10),
        fractionation: Some("MENSUAL".to_string()),
        due_date: chrono::NaiveDate::from_ymd_opt(2024, 3, 31),
        currency_amount: Some(amount),
        selection_indicator: None,
        id_type: "V".to_string(),
        id_number: "12345678".to_string(),
    }
}
