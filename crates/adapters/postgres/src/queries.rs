//! SQL statements and row mapping

use chrono::NaiveDate;
use cobro_config::IdStrategy;
use cobro_domain::Invoice;
use rust_decimal::Decimal;

/// Pending invoices of one customer
///
/// Casts pin the decoded types regardless of how the columns are declared.
/// Grouping by every selected column reproduces the report's row set; there
/// is no aggregate. `blval` is outer-joined so policies without an active
/// payment method still appear.
pub const SELECT_PENDING_INVOICES: &str = r#"
SELECT
    fc.idefact::bigint              AS numero_factura,
    fc.mtofactlocal::numeric        AS monto_factura_local,
    p.numpol::text                  AS numero_poliza,
    r.numrec::bigint                AS numero_recibo,
    r.codfraccionamiento::text      AS fraccionamiento,
    fc.fecvencfact::date            AS fecha_vencimiento,
    fc.mtofactmoneda::numeric       AS monto_factura_moneda,
    ndf.indsel::text                AS indicador_seleccion,
    fc.tipoid::text                 AS tipo_identificacion,
    fc.numid::text                  AS numero_identificacion
FROM acsel.factura_cia fc
INNER JOIN acsel.not_deposito_fact ndf ON fc.idefact = ndf.idefact
INNER JOIN acsel.acreencia_cia a ON fc.idefact = a.idefact
INNER JOIN acsel.recibo r ON a.numacre = r.numacre
INNER JOIN atrioweb.poliza p ON r.idepol = p.idepol
LEFT JOIN acsel.blval l
    ON p.codprod = l.codlval AND l.tipolval = 'FTOPAGO' AND l.activo = 'S'
WHERE fc.tipoid = $1 AND fc.numid = $2
GROUP BY
    fc.idefact, fc.mtofactlocal, p.numpol, r.numrec, r.codfraccionamiento,
    fc.fecvencfact, fc.mtofactmoneda, ndf.indsel, fc.tipoid, fc.numid
ORDER BY fc.idefact
"#;

const PAYMENT_COLUMNS: &str = "referencia_cliente, monto, moneda, estado, fecha_transaccion, \
     firma_recibida, firma_valida, datos_completos, fecha_procesamiento, \
     ip_origen, procesado, mensaje_error";

const PAYMENT_VALUES: &str = "$1, $2, $3, $4, $5, $6, $7, $8, CURRENT_TIMESTAMP, $9, $10, $11";

/// Insert into `acsel.banesco_transacciones`
///
/// Bind order: referencia_cliente, monto, moneda, estado, fecha_transaccion,
/// firma_recibida, firma_valida, datos_completos, ip_origen, procesado,
/// mensaje_error.
pub fn insert_payment_sql(strategy: &IdStrategy) -> String {
    match strategy {
        IdStrategy::Database => format!(
            "INSERT INTO acsel.banesco_transacciones ({}) VALUES ({}) RETURNING id::bigint",
            PAYMENT_COLUMNS, PAYMENT_VALUES
        ),
        // Sequence names are validated as identifiers when the config loads
        IdStrategy::Sequence(sequence) => format!(
            "INSERT INTO acsel.banesco_transacciones (id, {}) VALUES (nextval('{}'), {}) RETURNING id::bigint",
            PAYMENT_COLUMNS, sequence, PAYMENT_VALUES
        ),
    }
}

/// Database row for [`Invoice`]
#[derive(Debug, sqlx::FromRow)]
pub struct InvoiceRow {
    pub numero_factura: i64,
    pub monto_factura_local: Option<Decimal>,
    pub numero_poliza: Option<String>,
    pub numero_recibo: Option<i64>,
    pub fraccionamiento: Option<String>,
    pub fecha_vencimiento: Option<NaiveDate>,
    pub monto_factura_moneda: Option<Decimal>,
    pub indicador_seleccion: Option<String>,
    pub tipo_identificacion: String,
    pub numero_identificacion: String,
}

impl From<InvoiceRow> for Invoice {
    fn from(row: InvoiceRow) -> Self {
        Self {
            invoice_number: row.numero_factura,
            local_amount: row.monto_factura_local,
            policy_number: row.numero_poliza,
            receipt_number: row.numero_recibo,
            fractionation: row.fraccionamiento,
            due_date: row.fecha_vencimiento,
            currency_amount: row.monto_factura_moneda,
            selection_indicator: row.indicador_seleccion,
            id_type: row.tipo_identificacion,
            id_number: row.numero_identificacion,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invoice_query_shape() {
        assert!(SELECT_PENDING_INVOICES.contains("WHERE fc.tipoid = $1 AND fc.numid = $2"));
        assert!(SELECT_PENDING_INVOICES.contains("LEFT JOIN acsel.blval l"));
        assert!(SELECT_PENDING_INVOICES.trim_end().ends_with("ORDER BY fc.idefact"));
    }

    #[test]
    fn test_insert_lets_database_assign_key() {
        let sql = insert_payment_sql(&IdStrategy::Database);
        assert!(sql.starts_with("INSERT INTO acsel.banesco_transacciones (referencia_cliente,"));
        assert!(sql.contains("CURRENT_TIMESTAMP"));
        assert!(!sql.contains("nextval"));
        assert!(sql.ends_with("RETURNING id::bigint"));
    }

    #[test]
    fn test_insert_with_sequence() {
        let sql = insert_payment_sql(&IdStrategy::Sequence("acsel.banesco_seq".to_string()));
        assert!(sql.contains("(id, referencia_cliente,"));
        assert!(sql.contains("VALUES (nextval('acsel.banesco_seq'), $1,"));
    }

    #[test]
    fn test_bind_placeholders_are_contiguous() {
        let sql = insert_payment_sql(&IdStrategy::Database);
        for n in 1..=11 {
            assert!(sql.contains(&format!("${}", n)), "missing ${}", n);
        }
        assert!(!sql.contains("$12"));
    }

    #[test]
    fn test_row_into_invoice() {
        let row = InvoiceRow {
            numero_factura: 42,
            monto_factura_local: None,
            numero_poliza: Some("P-1".to_string()),
            numero_recibo: Some(7),
            fraccionamiento: None,
            fecha_vencimiento: NaiveDate::from_ymd_opt(2025, 1, 15),
            monto_factura_moneda: None,
            indicador_seleccion: Some("S".to_string()),
            tipo_identificacion: "J".to_string(),
            numero_identificacion: "30111222".to_string(),
        };

        let invoice = Invoice::from(row);
        assert_eq!(invoice.invoice_number, 42);
        assert_eq!(invoice.policy_number.as_deref(), Some("P-1"));
        assert_eq!(invoice.id_type, "J");
        assert_eq!(invoice.id_number, "30111222");
    }
}
