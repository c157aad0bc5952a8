// 📍 Geolocation default - best-effort initial location

use super::scope::LocationScope;
use serde_json::Value;

/// Country/region guessed from an IP-geolocation payload
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeoLocation {
    pub country_code: Option<String>,
    pub region_code: Option<String>,
}

fn field<'a>(payload: &'a Value, keys: &[&str]) -> Option<&'a str> {
    keys.iter()
        .filter_map(|k| payload.get(*k))
        .filter_map(Value::as_str)
        .map(str::trim)
        .find(|s| !s.is_empty())
}

impl GeoLocation {
    /// Accepts `country_code`/`countryCode` and `region_code`/`region`.
    /// Anything unusable yields None.
    pub fn from_payload(payload: &Value) -> Option<Self> {
        let country = field(payload, &["country_code", "countryCode"])?;
        if country.len() != 2 || !country.chars().all(|c| c.is_ascii_alphabetic()) {
            tracing::debug!(country, "ignoring malformed geolocation country");
            return None;
        }

        Some(GeoLocation {
            country_code: Some(country.to_uppercase()),
            region_code: field(payload, &["region_code", "region"]).map(str::to_string),
        })
    }

    pub fn parse(json: &str) -> Option<Self> {
        let value: Value = serde_json::from_str(json).ok()?;
        GeoLocation::from_payload(&value)
    }

    pub fn to_scope(&self) -> LocationScope {
        LocationScope::new(self.country_code.as_deref(), self.region_code.as_deref())
    }
}

/// Default scope from a geolocation payload; unscoped when unavailable
pub fn default_scope(payload: Option<&Value>) -> LocationScope {
    payload
        .and_then(GeoLocation::from_payload)
        .map(|geo| geo.to_scope())
        .unwrap_or_default()
}
