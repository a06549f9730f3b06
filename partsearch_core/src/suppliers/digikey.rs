//! Digi-Key adapter.
//!
//! Authenticates with an OAuth2 client-credentials grant; the access token
//! is cached on the adapter until shortly before expiry, so repeated
//! searches reuse one token. Search itself is a free-text keyword lookup.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Mutex;

use super::{http_client, parse_price, parse_stock, status_error, string_field};
use crate::config::{ConfigSchema, DigikeyCredentials, Field, FieldType};
use crate::error::SupplierError;
use crate::types::{CanonicalQuery, PartRecord, SupplierId};
use crate::Supplier;

pub const DIGIKEY_API_BASE: &str = "https://api.digikey.com";
const KEYWORD_SEARCH_URL: &str = "https://www.digikey.com/en/products/filter?keywords=";
const RESULT_LIMIT: usize = 10;

/// Renew this long before the token actually expires.
const TOKEN_EXPIRY_SLACK: Duration = Duration::from_secs(60);

struct CachedToken {
    access_token: String,
    expires_at: Instant,
}

pub struct DigikeySupplier {
    client: reqwest::Client,
    credentials: Option<DigikeyCredentials>,
    base_url: String,
    token: Mutex<Option<CachedToken>>,
}

impl DigikeySupplier {
    pub fn new(
        credentials: Option<DigikeyCredentials>,
        base_url: Option<String>,
    ) -> Result<Self, SupplierError> {
        Ok(Self {
            client: http_client()?,
            credentials,
            base_url: base_url.unwrap_or_else(|| DIGIKEY_API_BASE.to_string()),
            token: Mutex::new(None),
        })
    }

    async fn access_token(&self, credentials: &DigikeyCredentials) -> Result<String, SupplierError> {
        let mut guard = self.token.lock().await;
        if let Some(token) = guard.as_ref() {
            if token.expires_at > Instant::now() {
                return Ok(token.access_token.clone());
            }
        }

        tracing::debug!("Requesting Digi-Key client-credentials token");
        let resp = self
            .client
            .post(format!("{}/v1/oauth2/token", self.base_url))
            .form(&[
                ("client_id", credentials.client_id.as_str()),
                ("client_secret", credentials.client_secret.as_str()),
                ("grant_type", "client_credentials"),
            ])
            .send()
            .await
            .map_err(SupplierError::HttpRequest)?;

        let status = resp.status();
        // A rejected grant comes back 401, but some gateways answer 400 with
        // an invalid_client body; both mean the credentials are bad.
        if status == reqwest::StatusCode::BAD_REQUEST {
            return Err(SupplierError::Authentication(
                "Digi-Key token request rejected: invalid client credentials".into(),
            ));
        }
        if let Some(err) = status_error("Digi-Key", status) {
            return Err(err);
        }

        let body: Value = resp.json().await.map_err(SupplierError::HttpRequest)?;
        let access_token = body
            .get("access_token")
            .and_then(|v| v.as_str())
            .ok_or_else(|| {
                SupplierError::MalformedResponse(
                    "Digi-Key token response missing 'access_token'".into(),
                )
            })?
            .to_string();
        let expires_in = body
            .get("expires_in")
            .and_then(|v| v.as_u64())
            .unwrap_or(600);

        *guard = Some(CachedToken {
            access_token: access_token.clone(),
            expires_at: Instant::now()
                + Duration::from_secs(expires_in).saturating_sub(TOKEN_EXPIRY_SLACK),
        });
        Ok(access_token)
    }
}

#[async_trait]
impl Supplier for DigikeySupplier {
    fn id(&self) -> SupplierId {
        SupplierId::Digikey
    }

    fn description(&self) -> &'static str {
        "Digi-Key product search (OAuth2 client credentials)."
    }

    fn is_configured(&self) -> bool {
        self.credentials
            .as_ref()
            .map(|c| !c.client_id.is_empty() && !c.client_secret.is_empty())
            .unwrap_or(false)
    }

    async fn fetch(&self, query: &CanonicalQuery) -> Result<Vec<PartRecord>, SupplierError> {
        let credentials = self.credentials.as_ref().ok_or_else(|| {
            SupplierError::Authentication("Digi-Key credentials not configured".into())
        })?;
        let token = self.access_token(credentials).await?;

        let keyword = query.keyword();
        tracing::debug!(keyword = %keyword, "Executing Digi-Key keyword search");

        let limit = RESULT_LIMIT.to_string();
        let resp = self
            .client
            .get(format!("{}/Products/v3/Search/Keyword", self.base_url))
            .bearer_auth(&token)
            .header("X-Digikey-Client-Id", &credentials.client_id)
            .query(&[("Keyword", keyword.as_str()), ("limit", limit.as_str())])
            .send()
            .await
            .map_err(SupplierError::HttpRequest)?;
        if let Some(err) = status_error("Digi-Key", resp.status()) {
            return Err(err);
        }
        let body: Value = resp.json().await.map_err(SupplierError::HttpRequest)?;

        parse_body(&body)
    }

    fn config_schema(&self) -> ConfigSchema {
        ConfigSchema {
            fields: vec![
                Field {
                    name: "client_id".into(),
                    label: "Digi-Key Client ID".into(),
                    field_type: FieldType::Text,
                    required: true,
                    description: Some("OAuth2 client id from the Digi-Key developer portal".into()),
                },
                Field {
                    name: "client_secret".into(),
                    label: "Digi-Key Client Secret".into(),
                    field_type: FieldType::Secret,
                    required: true,
                    description: None,
                },
            ],
        }
    }
}

fn parse_body(body: &Value) -> Result<Vec<PartRecord>, SupplierError> {
    let products = body
        .get("Products")
        .and_then(|v| v.as_array())
        .ok_or_else(|| {
            SupplierError::MalformedResponse("Digi-Key body missing 'Products' array".into())
        })?;

    Ok(products
        .iter()
        .take(RESULT_LIMIT)
        .filter_map(|product| {
            let record = parse_product(product);
            if record.is_none() {
                tracing::debug!("Skipping Digi-Key product without part number or URL");
            }
            record
        })
        .collect())
}

fn parse_product(product: &Value) -> Option<PartRecord> {
    let mpn = string_field(product, "ManufacturerPartNumber");
    let product_url = string_field(product, "ProductUrl");

    // A record is only useful if the user can reach the part page; fall back
    // to a keyword-search URL when the API omits ProductUrl.
    let purchase_url = match (&product_url, &mpn) {
        (Some(url), _) => url.clone(),
        (None, Some(mpn)) => format!("{}{}", KEYWORD_SEARCH_URL, urlencoding::encode(mpn)),
        (None, None) => return None,
    };

    let mut record = PartRecord::new(SupplierId::Digikey, purchase_url);
    if let Some(mpn) = mpn {
        record = record.with_manufacturer_part_number(mpn);
    }
    if let Some(mfr) = product
        .get("Manufacturer")
        .and_then(|m| m.get("Name"))
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
    {
        record = record.with_manufacturer(mfr);
    }
    if let Some(number) = string_field(product, "DigiKeyPartNumber") {
        record = record.with_catalog_part_number(number);
    }
    if let Some(description) = string_field(product, "DetailedDescription")
        .or_else(|| string_field(product, "ProductDescription"))
    {
        record = record.with_description(description);
    }
    if let Some(stock) = parse_stock(product.get("QuantityAvailable")) {
        record = record.with_stock_quantity(stock);
    }
    let first_price = product
        .get("StandardPricing")
        .and_then(|v| v.as_array())
        .and_then(|breaks| breaks.first())
        .and_then(|b| b.get("UnitPrice"));
    if let Some(price) = parse_price(first_price) {
        record = record.with_unit_price(price);
    }
    if let Some(datasheet) = string_field(product, "DatasheetUrl") {
        record = record.with_datasheet_url(datasheet);
    }

    Some(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_product_full() {
        let product = json!({
            "ManufacturerPartNumber": "RC0402FR-07100KL",
            "Manufacturer": {"Name": "YAGEO"},
            "DigiKeyPartNumber": "311-100KLRCT-ND",
            "DetailedDescription": "RES SMD 100K OHM 1% 1/16W 0402",
            "QuantityAvailable": 250000,
            "StandardPricing": [{"BreakQuantity": 1, "UnitPrice": 0.1}],
            "ProductUrl": "https://www.digikey.com/product-detail/RC0402FR-07100KL",
            "DatasheetUrl": "https://www.yageo.com/datasheet.pdf"
        });

        let record = parse_product(&product).unwrap();
        assert_eq!(record.supplier, SupplierId::Digikey);
        assert_eq!(
            record.manufacturer_part_number.as_deref(),
            Some("RC0402FR-07100KL")
        );
        assert_eq!(record.manufacturer.as_deref(), Some("YAGEO"));
        assert_eq!(record.catalog_part_number.as_deref(), Some("311-100KLRCT-ND"));
        assert_eq!(record.stock_quantity, Some(250_000));
        assert_eq!(record.unit_price, Some("0.1".parse().unwrap()));
        assert!(record.datasheet_url.is_some());
    }

    #[test]
    fn test_parse_product_url_fallback() {
        let product = json!({"ManufacturerPartNumber": "GRM155R71C104KA88D"});
        let record = parse_product(&product).unwrap();
        assert_eq!(
            record.purchase_url,
            "https://www.digikey.com/en/products/filter?keywords=GRM155R71C104KA88D"
        );
        // Pricing the supplier never reported stays absent.
        assert!(record.unit_price.is_none());
        assert!(record.stock_quantity.is_none());
    }

    #[test]
    fn test_parse_product_without_identity_is_skipped() {
        let product = json!({"DetailedDescription": "mystery part"});
        assert!(parse_product(&product).is_none());
    }

    #[test]
    fn test_malformed_product_does_not_taint_the_response() {
        let body = json!({
            "Products": [
                {"DetailedDescription": "mystery part"},
                {"ManufacturerPartNumber": "RC0402FR-07100KL",
                 "ProductUrl": "https://www.digikey.com/product-detail/RC0402FR-07100KL"}
            ]
        });

        let records = parse_body(&body).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(
            records[0].manufacturer_part_number.as_deref(),
            Some("RC0402FR-07100KL")
        );
    }

    #[test]
    fn test_body_without_products_array_is_malformed() {
        let err = parse_body(&json!({"ProductsCount": 0})).unwrap_err();
        assert!(matches!(err, SupplierError::MalformedResponse(_)));
    }

    #[test]
    fn test_is_configured_requires_both_fields() {
        let unconfigured = DigikeySupplier::new(None, None).unwrap();
        assert!(!unconfigured.is_configured());

        let partial = DigikeySupplier::new(
            Some(DigikeyCredentials {
                client_id: "id".into(),
                client_secret: String::new(),
            }),
            None,
        )
        .unwrap();
        assert!(!partial.is_configured());

        let configured = DigikeySupplier::new(
            Some(DigikeyCredentials {
                client_id: "id".into(),
                client_secret: "secret".into(),
            }),
            None,
        )
        .unwrap();
        assert!(configured.is_configured());
    }
}
