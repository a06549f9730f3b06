//! JLCPCB adapter, backed by the free JLCSearch catalog API.
//!
//! No credentials required. Supports structured filters: the component value
//! goes into the `search` parameter and the footprint into `package`.

use async_trait::async_trait;
use serde_json::Value;

use super::{http_client, parse_price, parse_stock, status_error, string_field};
use crate::error::SupplierError;
use crate::types::{CanonicalQuery, PartRecord, SupplierId};
use crate::Supplier;

pub const JLCSEARCH_BASE: &str = "https://jlcsearch.tscircuit.com";
const PART_URL_BASE: &str = "https://jlcpcb.com/part";
const RESULT_LIMIT: usize = 10;

pub struct JlcpcbSupplier {
    client: reqwest::Client,
    base_url: String,
}

impl JlcpcbSupplier {
    pub fn new(base_url: Option<String>) -> Result<Self, SupplierError> {
        Ok(Self {
            client: http_client()?,
            base_url: base_url.unwrap_or_else(|| JLCSEARCH_BASE.to_string()),
        })
    }
}

#[async_trait]
impl Supplier for JlcpcbSupplier {
    fn id(&self) -> SupplierId {
        SupplierId::Jlcpcb
    }

    fn description(&self) -> &'static str {
        "JLCPCB parts catalog via the free JLCSearch API."
    }

    fn is_configured(&self) -> bool {
        true
    }

    async fn fetch(&self, query: &CanonicalQuery) -> Result<Vec<PartRecord>, SupplierError> {
        let search = if query.value.is_empty() {
            query.keyword()
        } else {
            query.value.clone()
        };

        let mut params: Vec<(&str, String)> = vec![
            ("search", search),
            ("limit", RESULT_LIMIT.to_string()),
            ("full", "true".to_string()),
        ];
        if !query.footprint.is_empty() {
            params.push(("package", query.footprint.clone()));
        }

        let url = format!("{}/components/list.json", self.base_url);
        tracing::debug!(url = %url, search = %query.keyword(), "Executing JLCSearch lookup");

        let resp = self
            .client
            .get(&url)
            .query(&params)
            .send()
            .await
            .map_err(SupplierError::HttpRequest)?;
        if let Some(err) = status_error("JLCSearch", resp.status()) {
            return Err(err);
        }
        let body: Value = resp.json().await.map_err(SupplierError::HttpRequest)?;

        parse_body(&body)
    }
}

fn parse_body(body: &Value) -> Result<Vec<PartRecord>, SupplierError> {
    let components = body
        .get("components")
        .and_then(|v| v.as_array())
        .ok_or_else(|| {
            SupplierError::MalformedResponse("JLCSearch body missing 'components' array".into())
        })?;

    Ok(components
        .iter()
        .filter_map(|comp| {
            let record = parse_component(comp);
            if record.is_none() {
                tracing::debug!("Skipping JLCSearch component without a usable LCSC code");
            }
            record
        })
        .collect())
}

/// The LCSC order code, rendered as the conventional "C..." form. Numeric
/// codes come in under `lcsc`, already-prefixed strings under `lcscCode`.
fn lcsc_code(comp: &Value) -> Option<String> {
    match comp.get("lcsc") {
        Some(Value::Number(n)) => n.as_u64().map(|n| format!("C{}", n)),
        Some(Value::String(s)) if !s.trim().is_empty() => {
            let s = s.trim();
            if s.chars().all(|c| c.is_ascii_digit()) {
                Some(format!("C{}", s))
            } else {
                Some(s.to_string())
            }
        }
        _ => string_field(comp, "lcscCode"),
    }
}

fn parse_component(comp: &Value) -> Option<PartRecord> {
    let code = lcsc_code(comp)?;
    let mut record = PartRecord::new(
        SupplierId::Jlcpcb,
        format!("{}/{}", PART_URL_BASE, code),
    )
    .with_catalog_part_number(code);

    if let Some(mpn) = string_field(comp, "mfrPartNo") {
        record = record.with_manufacturer_part_number(mpn);
    }
    if let Some(mfr) = string_field(comp, "mfr").or_else(|| string_field(comp, "manufacturer")) {
        record = record.with_manufacturer(mfr);
    }
    if let Some(description) = string_field(comp, "description") {
        record = record.with_description(description);
    }
    if let Some(package) = string_field(comp, "package") {
        record = record.with_footprint(package);
    }
    if let Some(stock) = parse_stock(comp.get("stock").or_else(|| comp.get("stockQty"))) {
        record = record.with_stock_quantity(stock);
    }
    if let Some(price) = parse_price(comp.get("price")) {
        record = record.with_unit_price(price);
    }
    if let Some(datasheet) = string_field(comp, "datasheet") {
        record = record.with_datasheet_url(datasheet);
    }

    Some(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use serde_json::json;

    #[test]
    fn test_parse_component_full() {
        let comp = json!({
            "lcsc": 106224,
            "mfr": "YAGEO",
            "mfrPartNo": "RC0402FR-07100KL",
            "description": "100kOhms 1% 0402 Chip Resistor",
            "package": "0402",
            "stock": 5000,
            "price": 0.003
        });

        let record = parse_component(&comp).unwrap();
        assert_eq!(record.supplier, SupplierId::Jlcpcb);
        assert_eq!(record.catalog_part_number.as_deref(), Some("C106224"));
        assert_eq!(record.manufacturer.as_deref(), Some("YAGEO"));
        assert_eq!(record.stock_quantity, Some(5000));
        assert_eq!(record.unit_price, Some(Decimal::new(3, 3)));
        assert_eq!(record.purchase_url, "https://jlcpcb.com/part/C106224");
        assert!(record.datasheet_url.is_none());
    }

    #[test]
    fn test_parse_component_alternate_field_names() {
        let comp = json!({
            "lcscCode": "C25744",
            "manufacturer": "UNI-ROYAL",
            "stockQty": "12,000",
            "price": "0.0011"
        });

        let record = parse_component(&comp).unwrap();
        assert_eq!(record.catalog_part_number.as_deref(), Some("C25744"));
        assert_eq!(record.manufacturer.as_deref(), Some("UNI-ROYAL"));
        assert_eq!(record.stock_quantity, Some(12_000));
        assert_eq!(record.unit_price, Some("0.0011".parse().unwrap()));
    }

    #[test]
    fn test_component_without_lcsc_code_is_skipped() {
        let comp = json!({"mfr": "YAGEO", "description": "no id"});
        assert!(parse_component(&comp).is_none());
    }

    #[test]
    fn test_malformed_component_does_not_taint_the_response() {
        let body = json!({
            "components": [
                {"mfr": "YAGEO", "description": "no usable id"},
                {"lcsc": 106224, "mfr": "YAGEO", "stock": 5000}
            ]
        });

        let records = parse_body(&body).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].catalog_part_number.as_deref(), Some("C106224"));
    }

    #[test]
    fn test_body_without_components_array_is_malformed() {
        let err = parse_body(&json!({"total": 0})).unwrap_err();
        assert!(matches!(err, SupplierError::MalformedResponse(_)));
    }

    #[test]
    fn test_unparsable_price_and_stock_are_absent() {
        let comp = json!({
            "lcsc": 1,
            "stock": "contact sales",
            "price": "n/a"
        });
        let record = parse_component(&comp).unwrap();
        assert_eq!(record.stock_quantity, None);
        assert_eq!(record.unit_price, None);
    }
}
