//! Payment notifications reported by the bank

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use cobro_errors::{AppError, AppResult};
use rust_decimal::Decimal;
use serde_json::{Map, Value};

pub const REQUIRED_FIELDS: [&str; 6] = [
    "referencia_cliente",
    "monto",
    "moneda",
    "estado",
    "fecha_transaccion",
    "firma_recibida",
];

pub const INVALID_BODY: &str = "El cuerpo de la solicitud debe ser un objeto JSON.";
pub const INVALID_TRANSACTION_DATE: &str =
    "Formato de 'fecha_transaccion' inválido. Use formato ISO (YYYY-MM-DDTHH:MM:SS).";

/// Value stored in `firma_valida` / `procesado` when the sender omits it
pub const FLAG_NO: &str = "N";

/// A validated notification, ready to be stored
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentNotification {
    pub client_reference: String,
    pub amount: Decimal,
    pub currency: String,
    pub status: String,
    /// Wall-clock time reported by the sender; any offset is dropped
    pub transaction_at: NaiveDateTime,
    pub received_signature: String,
    pub signature_valid: String,
    pub raw_payload: Option<String>,
    pub processed: String,
    pub error_message: Option<String>,
    /// Peer address of the request, never taken from the body
    pub origin_ip: Option<String>,
}

impl PaymentNotification {
    /// Validate a request body
    ///
    /// Missing fields are reported together, before type and date checks.
    pub fn from_json(body: &Value) -> AppResult<Self> {
        let fields = body
            .as_object()
            .ok_or_else(|| AppError::validation(INVALID_BODY))?;

        let missing: Vec<&str> = REQUIRED_FIELDS
            .iter()
            .copied()
            .filter(|name| fields.get(*name).is_none_or(Value::is_null))
            .collect();
        if !missing.is_empty() {
            return Err(AppError::validation(format!(
                "Faltan campos obligatorios: {}",
                missing.join(", ")
            )));
        }

        let transaction_at = fields
            .get("fecha_transaccion")
            .and_then(Value::as_str)
            .and_then(parse_iso8601)
            .ok_or_else(|| AppError::validation(INVALID_TRANSACTION_DATE))?;

        Ok(Self {
            client_reference: required_str(fields, "referencia_cliente")?.to_string(),
            amount: parse_amount(&fields["monto"])?,
            currency: required_str(fields, "moneda")?.to_string(),
            status: required_str(fields, "estado")?.to_string(),
            transaction_at,
            received_signature: required_str(fields, "firma_recibida")?.to_string(),
            signature_valid: optional_str(fields, "firma_valida")?
                .unwrap_or(FLAG_NO)
                .to_string(),
            raw_payload: raw_payload(fields.get("datos_completos")),
            processed: optional_str(fields, "procesado")?
                .unwrap_or(FLAG_NO)
                .to_string(),
            error_message: optional_str(fields, "mensaje_error")?.map(str::to_string),
            origin_ip: None,
        })
    }

    pub fn with_origin_ip(mut self, origin_ip: Option<String>) -> Self {
        self.origin_ip = origin_ip;
        self
    }
}

fn required_str<'a>(fields: &'a Map<String, Value>, name: &str) -> AppResult<&'a str> {
    fields
        .get(name)
        .and_then(Value::as_str)
        .ok_or_else(|| not_text(name))
}

fn optional_str<'a>(fields: &'a Map<String, Value>, name: &str) -> AppResult<Option<&'a str>> {
    match fields.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(_) => Err(not_text(name)),
    }
}

fn not_text(name: &str) -> AppError {
    AppError::validation(format!("El campo '{}' debe ser texto.", name))
}

/// Text is stored as is, any other JSON value as its serialized form
fn raw_payload(value: Option<&Value>) -> Option<String> {
    match value {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s.clone()),
        Some(other) => Some(other.to_string()),
    }
}

/// `monto` accepts a JSON number or a numeric string
fn parse_amount(value: &Value) -> AppResult<Decimal> {
    let text = match value {
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.trim().to_string(),
        _ => String::new(),
    };

    Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .map_err(|_| AppError::validation("El campo 'monto' debe ser numérico."))
}

const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

const OFFSET_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%dT%H:%M%:z",
    "%Y-%m-%d %H:%M%:z",
];

/// Parse an ISO-8601 date or date-time
///
/// A date alone means midnight. When an offset is present the local
/// wall-clock time is kept and the offset discarded.
pub fn parse_iso8601(input: &str) -> Option<NaiveDateTime> {
    let s = input.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_local());
    }
    if let Some(dt) = OFFSET_FORMATS
        .iter()
        .find_map(|f| DateTime::parse_from_str(s, f).ok())
    {
        return Some(dt.naive_local());
    }
    if let Some(dt) = NAIVE_FORMATS
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(s, f).ok())
    {
        return Some(dt);
    }

    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}
