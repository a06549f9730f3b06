//! Supplier catalog adapters.
//!
//! Each module knows how to build one outbound request for one supplier,
//! parse its response into [`crate::types::PartRecord`]s, and map
//! supplier-specific failures onto the shared error taxonomy. Parsing is
//! record-isolated: a malformed entry is skipped with a debug log and the
//! rest of the response stays usable.

pub mod digikey;
pub mod jlcpcb;
pub mod mouser;

use reqwest::StatusCode;
use rust_decimal::Decimal;
use serde_json::Value;

use crate::error::SupplierError;

pub(crate) const USER_AGENT: &str = concat!("partsearch/", env!("CARGO_PKG_VERSION"));

pub(crate) fn http_client() -> Result<reqwest::Client, SupplierError> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| SupplierError::Other(e.to_string()))
}

/// Shared HTTP status classification for supplier endpoints.
///
/// Returns `None` for 2xx; the adapter then decides whether the body parses.
pub(crate) fn status_error(supplier: &str, status: StatusCode) -> Option<SupplierError> {
    if status.is_success() {
        return None;
    }
    Some(match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => SupplierError::Authentication(
            format!("{} rejected credentials: HTTP {}", supplier, status),
        ),
        StatusCode::TOO_MANY_REQUESTS => SupplierError::RateLimited(format!(
            "{} rate limit exceeded: HTTP {}",
            supplier, status
        )),
        _ => SupplierError::Other(format!("{} error: HTTP {}", supplier, status)),
    })
}

/// Parse a price field into a fixed-precision decimal.
///
/// Suppliers report prices as JSON numbers or as strings, sometimes with
/// thousands separators. Unparsable values are dropped, never defaulted to
/// zero.
pub(crate) fn parse_price(value: Option<&Value>) -> Option<Decimal> {
    match value? {
        Value::Number(n) => n.to_string().parse().ok(),
        Value::String(s) => {
            let cleaned = s.trim().trim_start_matches('$').replace(',', "");
            if cleaned.is_empty() {
                None
            } else {
                cleaned.parse().ok()
            }
        }
        _ => None,
    }
}

/// Parse a stock-quantity field. Same rule as prices: unparsable means
/// absent, not zero.
pub(crate) fn parse_stock(value: Option<&Value>) -> Option<u64> {
    match value? {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().replace(',', "").parse().ok(),
        _ => None,
    }
}

pub(crate) fn string_field(item: &Value, key: &str) -> Option<String> {
    item.get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
}
