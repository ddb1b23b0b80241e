//! Pending invoices of a customer

use chrono::NaiveDate;
use cobro_errors::{AppError, AppResult};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub const MISSING_CUSTOMER_ID: &str = "Los parámetros 'tipo_id' y 'num_id' son obligatorios.";

/// Customer identification used to look up invoices (`tipo_id`, `num_id`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomerId {
    /// Identification type, e.g. `V`, `J`, `G`
    pub id_type: String,
    pub id_number: String,
}

impl CustomerId {
    /// Both parts must be present and not blank
    pub fn from_params(id_type: Option<&str>, id_number: Option<&str>) -> AppResult<Self> {
        match (non_blank(id_type), non_blank(id_number)) {
            (Some(id_type), Some(id_number)) => Ok(Self {
                id_type: id_type.to_string(),
                id_number: id_number.to_string(),
            }),
            _ => Err(AppError::validation(MISSING_CUSTOMER_ID)),
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

/// One row of the pending invoice report
///
/// Field names on the wire are the report's column labels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invoice {
    #[serde(rename = "NUMERO_FACTURA")]
    pub invoice_number: i64,
    #[serde(rename = "MONTO_FACTURA_LOCAL", with = "rust_decimal::serde::float_option")]
    pub local_amount: Option<Decimal>,
    #[serde(rename = "NUMERO_POLIZA")]
    pub policy_number: Option<String>,
    #[serde(rename = "NUMERO_RECIBO")]
    pub receipt_number: Option<i64>,
    #[serde(rename = "FRACCIONAMIENTO")]
    pub fractionation: Option<String>,
    #[serde(rename = "FECHA_VENCIMIENTO")]
    pub due_date: Option<NaiveDate>,
    #[serde(rename = "MONTO_FACTURA_MONEDA", with = "rust_decimal::serde::float_option")]
    pub currency_amount: Option<Decimal>,
    #[serde(rename = "INDICADOR_SELECCION")]
    pub selection_indicator: Option<String>,
    #[serde(rename = "TIPO_IDENTIFICACION")]
    pub id_type: String,
    #[serde(rename = "NUMERO_IDENTIFICACION")]
    pub id_number: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_customer_id_requires_both_params() {
        assert!(CustomerId::from_params(Some("V"), Some("12345678")).is_ok());

        for (id_type, id_number) in [
            (None, Some("12345678")),
            (Some("V"), None),
            (None, None),
            (Some(""), Some("12345678")),
            (Some("V"), Some("   ")),
        ] {
            let err = CustomerId::from_params(id_type, id_number).unwrap_err();
            assert_eq!(err.status_code(), 400);
            assert_eq!(err.message(), MISSING_CUSTOMER_ID);
        }
    }

    #[test]
    fn test_invoice_serializes_report_labels() {
        let invoice = Invoice {
            invoice_number: 1001,
            local_amount: Some(Decimal::from_str("150.25").unwrap()),
            policy_number: Some("POL-7".to_string()),
            receipt_number: Some(55),
            fractionation: Some("M".to_string()),
            due_date: NaiveDate::from_ymd_opt(2024, 3, 31),
            currency_amount: None,
            selection_indicator: Some("S".to_string()),
            id_type: "V".to_string(),
            id_number: "12345678".to_string(),
        };

        let value = serde_json::to_value(&invoice).unwrap();
        let object = value.as_object().unwrap();
        let mut keys: Vec<&str> = object.keys().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(
            keys,
            vec![
                "FECHA_VENCIMIENTO",
                "FRACCIONAMIENTO",
                "INDICADOR_SELECCION",
                "MONTO_FACTURA_LOCAL",
                "MONTO_FACTURA_MONEDA",
                "NUMERO_FACTURA",
                "NUMERO_IDENTIFICACION",
                "NUMERO_POLIZA",
                "NUMERO_RECIBO",
                "TIPO_IDENTIFICACION",
            ]
        );
        assert_eq!(object["MONTO_FACTURA_LOCAL"], serde_json::json!(150.25));
        assert_eq!(object["MONTO_FACTURA_MONEDA"], serde_json::Value::Null);
        assert_eq!(object["FECHA_VENCIMIENTO"], "2024-03-31");
    }
}
