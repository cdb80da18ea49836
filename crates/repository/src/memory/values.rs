//! Value validation and canonical text forms.

use chrono::{DateTime, SecondsFormat, Utc};
use ng_cnd::PropertyType;

use crate::error::{StoreError, StoreResult};

/// Lookups a value may depend on.
pub(crate) trait ValueContext {
    fn check_name(&self, name: &str) -> StoreResult<()>;
    fn is_referenceable_id(&self, id: &str) -> bool;
}

/// Validate `raw` as `property_type` and return its canonical text.
pub(crate) fn canonicalize(
    raw: &str,
    property_type: PropertyType,
    ctx: &dyn ValueContext,
) -> StoreResult<String> {
    let invalid = || StoreError::ValueFormat(format!("'{raw}' is not a valid {property_type}"));
    match property_type {
        PropertyType::Long => raw
            .trim()
            .parse::<i64>()
            .map(|n| n.to_string())
            .map_err(|_| invalid()),
        PropertyType::Double => raw
            .trim()
            .parse::<f64>()
            .map(|n| format!("{n:?}"))
            .map_err(|_| invalid()),
        PropertyType::Boolean => match raw.trim().to_ascii_lowercase().as_str() {
            "true" => Ok("true".into()),
            "false" => Ok("false".into()),
            _ => Err(invalid()),
        },
        PropertyType::Date => DateTime::parse_from_rfc3339(raw.trim())
            .map(|d| {
                d.with_timezone(&Utc)
                    .to_rfc3339_opts(SecondsFormat::Millis, true)
            })
            .map_err(|_| invalid()),
        PropertyType::Decimal => {
            let text = raw.trim();
            if is_decimal(text) {
                Ok(text.to_string())
            } else {
                Err(invalid())
            }
        }
        PropertyType::Name => {
            if raw.is_empty() || raw.contains('/') {
                return Err(invalid());
            }
            ctx.check_name(raw)?;
            Ok(raw.to_string())
        }
        PropertyType::Path => {
            if raw.is_empty() {
                return Err(invalid());
            }
            Ok(raw.to_string())
        }
        PropertyType::Reference => {
            if ctx.is_referenceable_id(raw) {
                Ok(raw.to_string())
            } else {
                Err(StoreError::ValueFormat(format!(
                    "reference '{raw}' does not resolve to a referenceable node"
                )))
            }
        }
        PropertyType::String
        | PropertyType::Binary
        | PropertyType::WeakReference
        | PropertyType::Uri
        | PropertyType::Undefined => Ok(raw.to_string()),
    }
}

/// `-?digits(.digits)?`
fn is_decimal(text: &str) -> bool {
    let unsigned = text.strip_prefix('-').unwrap_or(text);
    let (int, frac) = match unsigned.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (unsigned, None),
    };
    let digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    digits(int) && frac.map_or(true, digits)
}
