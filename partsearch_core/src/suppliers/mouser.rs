//! Mouser adapter.
//!
//! Keyed-credential keyword search. Mouser reports some failures (bad key,
//! throttling) inside a 200 response's `Errors` array, so those are mapped
//! onto the shared taxonomy in addition to the HTTP status.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{json, Value};

use super::{http_client, parse_price, status_error, string_field};
use crate::config::{ConfigSchema, Field, FieldType, MouserCredentials};
use crate::error::SupplierError;
use crate::types::{CanonicalQuery, PartRecord, SupplierId};
use crate::Supplier;

pub const MOUSER_API_BASE: &str = "https://api.mouser.com/api/v1";
const KEYWORD_SEARCH_URL: &str = "https://www.mouser.com/ProductSearch/?Keyword=";
const RESULT_LIMIT: u32 = 10;

/// Availability is free text like "5000 In Stock"; the first integer is the
/// stock count.
static AVAILABILITY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d[\d,]*").expect("availability pattern"));

pub struct MouserSupplier {
    client: reqwest::Client,
    credentials: Option<MouserCredentials>,
    base_url: String,
}

impl MouserSupplier {
    pub fn new(
        credentials: Option<MouserCredentials>,
        base_url: Option<String>,
    ) -> Result<Self, SupplierError> {
        Ok(Self {
            client: http_client()?,
            credentials,
            base_url: base_url.unwrap_or_else(|| MOUSER_API_BASE.to_string()),
        })
    }
}

#[async_trait]
impl Supplier for MouserSupplier {
    fn id(&self) -> SupplierId {
        SupplierId::Mouser
    }

    fn description(&self) -> &'static str {
        "Mouser keyword product search (API key)."
    }

    fn is_configured(&self) -> bool {
        self.credentials
            .as_ref()
            .map(|c| !c.api_key.is_empty())
            .unwrap_or(false)
    }

    async fn fetch(&self, query: &CanonicalQuery) -> Result<Vec<PartRecord>, SupplierError> {
        let credentials = self.credentials.as_ref().ok_or_else(|| {
            SupplierError::Authentication("Mouser API key not configured".into())
        })?;

        let keyword = query.keyword();
        tracing::debug!(keyword = %keyword, "Executing Mouser keyword search");

        let resp = self
            .client
            .post(format!("{}/product/search", self.base_url))
            .bearer_auth(&credentials.api_key)
            .json(&json!({
                "SearchByKeywordRequest": {
                    "keyword": keyword,
                    "records": RESULT_LIMIT,
                    "searchOptions": "InStock"
                }
            }))
            .send()
            .await
            .map_err(SupplierError::HttpRequest)?;
        if let Some(err) = status_error("Mouser", resp.status()) {
            return Err(err);
        }
        let body: Value = resp.json().await.map_err(SupplierError::HttpRequest)?;

        parse_body(&body)
    }

    fn config_schema(&self) -> ConfigSchema {
        ConfigSchema {
            fields: vec![Field {
                name: "api_key".into(),
                label: "Mouser API Key".into(),
                field_type: FieldType::Secret,
                required: true,
                description: Some("Search API key from mouser.com/api-hub".into()),
            }],
        }
    }
}

fn parse_body(body: &Value) -> Result<Vec<PartRecord>, SupplierError> {
    if let Some(err) = body_error(body) {
        return Err(err);
    }

    let parts = body
        .get("SearchResults")
        .and_then(|r| r.get("Parts"))
        .and_then(|v| v.as_array())
        .ok_or_else(|| {
            SupplierError::MalformedResponse(
                "Mouser body missing 'SearchResults.Parts' array".into(),
            )
        })?;

    Ok(parts
        .iter()
        .filter_map(|part| {
            let record = parse_part(part);
            if record.is_none() {
                tracing::debug!("Skipping Mouser part without part number or URL");
            }
            record
        })
        .collect())
}

/// Application-level errors Mouser reports inside a 200 body.
fn body_error(body: &Value) -> Option<SupplierError> {
    let errors = body.get("Errors").and_then(|v| v.as_array())?;
    let first = errors.first()?;
    let code = first.get("Code").and_then(|v| v.as_str()).unwrap_or("");
    let message = first
        .get("Message")
        .and_then(|v| v.as_str())
        .unwrap_or("unspecified Mouser API error");

    if code.eq_ignore_ascii_case("TooManyRequests") {
        Some(SupplierError::RateLimited(format!("Mouser: {}", message)))
    } else if code.eq_ignore_ascii_case("Unauthorized")
        || code.eq_ignore_ascii_case("InvalidAuthorization")
        || message.to_ascii_lowercase().contains("api key")
    {
        Some(SupplierError::Authentication(format!("Mouser: {}", message)))
    } else {
        Some(SupplierError::Other(format!("Mouser: {}", message)))
    }
}

fn parse_availability(part: &Value) -> Option<u64> {
    let raw = part.get("Availability")?;
    let text = match raw {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    AVAILABILITY_RE
        .find(&text)
        .and_then(|m| m.as_str().replace(',', "").parse().ok())
}

fn parse_part(part: &Value) -> Option<PartRecord> {
    let mpn = string_field(part, "ManufacturerPartNumber");
    let detail_url = string_field(part, "ProductDetailUrl");

    let purchase_url = match (&detail_url, &mpn) {
        (Some(url), _) => url.clone(),
        (None, Some(mpn)) => format!("{}{}", KEYWORD_SEARCH_URL, urlencoding::encode(mpn)),
        (None, None) => return None,
    };

    let mut record = PartRecord::new(SupplierId::Mouser, purchase_url);
    if let Some(mpn) = mpn {
        record = record.with_manufacturer_part_number(mpn);
    }
    if let Some(mfr) = string_field(part, "Manufacturer") {
        record = record.with_manufacturer(mfr);
    }
    if let Some(number) = string_field(part, "MouserPartNumber") {
        record = record.with_catalog_part_number(number);
    }
    if let Some(description) = string_field(part, "Description") {
        record = record.with_description(description);
    }
    if let Some(stock) = parse_availability(part) {
        record = record.with_stock_quantity(stock);
    }
    let first_price = part
        .get("PriceBreaks")
        .and_then(|v| v.as_array())
        .and_then(|breaks| breaks.first())
        .and_then(|b| b.get("Price"));
    if let Some(price) = parse_price(first_price) {
        record = record.with_unit_price(price);
    }
    if let Some(datasheet) = string_field(part, "DataSheetUrl") {
        record = record.with_datasheet_url(datasheet);
    }

    Some(record)
}
