// 🏦 Bank Record - one institution as returned by the backend
//
// The backend payload is loosely shaped: numbers arrive as strings, lists as
// comma-separated strings, tags as `{code}` objects, subtrees as null. Every
// field is decoded leniently and defaulted instead of failing the record.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeSet;

// ============================================================================
// RATING CATEGORY
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RatingCategory {
    Great,
    Good,
    Ok,
    Bad,
    Worst,
    #[default]
    Unknown,
}

impl RatingCategory {
    pub const ALL: [RatingCategory; 6] = [
        RatingCategory::Great,
        RatingCategory::Good,
        RatingCategory::Ok,
        RatingCategory::Bad,
        RatingCategory::Worst,
        RatingCategory::Unknown,
    ];

    /// Unrecognized values map to `Unknown`
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "great" => RatingCategory::Great,
            "good" => RatingCategory::Good,
            "ok" => RatingCategory::Ok,
            "bad" => RatingCategory::Bad,
            "worst" => RatingCategory::Worst,
            _ => RatingCategory::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RatingCategory::Great => "great",
            RatingCategory::Good => "good",
            RatingCategory::Ok => "ok",
            RatingCategory::Bad => "bad",
            RatingCategory::Worst => "worst",
            RatingCategory::Unknown => "unknown",
        }
    }
}

impl<'de> Deserialize<'de> for RatingCategory {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(value
            .as_str()
            .map(RatingCategory::parse)
            .unwrap_or_default())
    }
}

// ============================================================================
// HARVEST DATA
// ============================================================================

/// Top-level groups of the harvest tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum HarvestCategory {
    CustomersServed,
    DepositProducts,
    LoanProducts,
    Services,
    Policies,
    FinancialFeatures,
}

impl HarvestCategory {
    pub const ALL: [HarvestCategory; 6] = [
        HarvestCategory::CustomersServed,
        HarvestCategory::DepositProducts,
        HarvestCategory::LoanProducts,
        HarvestCategory::Services,
        HarvestCategory::Policies,
        HarvestCategory::FinancialFeatures,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            HarvestCategory::CustomersServed => "customersServed",
            HarvestCategory::DepositProducts => "depositProducts",
            HarvestCategory::LoanProducts => "loanProducts",
            HarvestCategory::Services => "services",
            HarvestCategory::Policies => "policies",
            HarvestCategory::FinancialFeatures => "financialFeatures",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            HarvestCategory::CustomersServed => "Customers served",
            HarvestCategory::DepositProducts => "Deposit products",
            HarvestCategory::LoanProducts => "Loan products",
            HarvestCategory::Services => "Services",
            HarvestCategory::Policies => "Policies",
            HarvestCategory::FinancialFeatures => "Financial features",
        }
    }
}

/// Nested per-institution attributes. Each group is independently optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HarvestData {
    #[serde(default, deserialize_with = "lenient_object")]
    pub customers_served: Option<Map<String, Value>>,
    #[serde(default, deserialize_with = "lenient_object")]
    pub deposit_products: Option<Map<String, Value>>,
    #[serde(default, deserialize_with = "lenient_object")]
    pub loan_products: Option<Map<String, Value>>,
    #[serde(default, deserialize_with = "lenient_object")]
    pub services: Option<Map<String, Value>>,
    #[serde(default, deserialize_with = "lenient_object")]
    pub policies: Option<Map<String, Value>>,
    #[serde(default, deserialize_with = "lenient_object")]
    pub financial_features: Option<Map<String, Value>>,
}

impl HarvestData {
    pub fn category(&self, category: HarvestCategory) -> Option<&Map<String, Value>> {
        match category {
            HarvestCategory::CustomersServed => self.customers_served.as_ref(),
            HarvestCategory::DepositProducts => self.deposit_products.as_ref(),
            HarvestCategory::LoanProducts => self.loan_products.as_ref(),
            HarvestCategory::Services => self.services.as_ref(),
            HarvestCategory::Policies => self.policies.as_ref(),
            HarvestCategory::FinancialFeatures => self.financial_features.as_ref(),
        }
    }

    pub fn category_mut(&mut self, category: HarvestCategory) -> &mut Option<Map<String, Value>> {
        match category {
            HarvestCategory::CustomersServed => &mut self.customers_served,
            HarvestCategory::DepositProducts => &mut self.deposit_products,
            HarvestCategory::LoanProducts => &mut self.loan_products,
            HarvestCategory::Services => &mut self.services,
            HarvestCategory::Policies => &mut self.policies,
            HarvestCategory::FinancialFeatures => &mut self.financial_features,
        }
    }

    /// Whether `key` is flagged offered inside `category`.
    /// A missing group or entry is "not offered".
    pub fn offers(&self, category: HarvestCategory, key: &str) -> bool {
        self.category(category)
            .and_then(|group| group.get(key))
            .map(is_offered)
            .unwrap_or(false)
    }

    /// Every `interest_rates` list under deposit products, flattened
    pub fn interest_rates(&self) -> Vec<&Value> {
        let Some(deposits) = self.deposit_products.as_ref() else {
            return Vec::new();
        };

        let top_level = deposits.get("interest_rates").into_iter();
        let per_product = deposits
            .values()
            .filter_map(|product| product.get("interest_rates"));

        top_level
            .chain(per_product)
            .filter_map(Value::as_array)
            .flatten()
            .collect()
    }

    /// `policies.deposit_protection`, None when the policy data is absent
    pub fn deposit_protection(&self) -> Option<bool> {
        let policies = self.policies.as_ref()?;
        policies.get("deposit_protection").map(is_offered)
    }
}

/// Offer flag of a harvest entry: `true`, `"yes"`, or `{ "offered": ... }`
pub fn is_offered(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::String(s) => matches!(
            s.trim().to_lowercase().as_str(),
            "yes" | "true" | "offered"
        ),
        Value::Object(obj) => obj.get("offered").map(is_offered).unwrap_or(false),
        _ => false,
    }
}

/// Number from a JSON number or numeric string. Non-finite results are None.
pub fn coerce_number(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().trim_end_matches('%').trim().parse::<f64>().ok()?,
        _ => return None,
    };
    n.is_finite().then_some(n)
}

/// "us-ca" / "US-CA" / "ca" → "CA"
pub fn normalize_region(tag: &str) -> String {
    let upper = tag.trim().to_uppercase();
    match upper.rsplit_once('-') {
        Some((_, region)) if !region.is_empty() => region.to_string(),
        _ => upper,
    }
}

// ============================================================================
// BANK RECORD
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BankRecord {
    #[serde(default, deserialize_with = "lenient_string")]
    pub id: String,

    #[serde(default, deserialize_with = "lenient_string")]
    pub name: String,

    /// Alternative names that should find this bank in search
    #[serde(default, alias = "aliases", deserialize_with = "lenient_string_list")]
    pub alias_names: Vec<String>,

    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub website: Option<String>,

    /// ISO 3166-1 alpha-2, uppercased
    #[serde(default, alias = "countries", deserialize_with = "lenient_country_set")]
    pub country_codes: BTreeSet<String>,

    /// US state/region tags, normalized to the bare region code
    #[serde(default, alias = "stateLicensed", deserialize_with = "lenient_region_set")]
    pub state_license_tags: BTreeSet<String>,

    #[serde(default, alias = "rating")]
    pub rating_category: RatingCategory,

    #[serde(default, deserialize_with = "lenient_bool")]
    pub top_pick: bool,

    #[serde(default, deserialize_with = "lenient_bool")]
    pub alliance_member: bool,

    #[serde(default, deserialize_with = "lenient_number")]
    pub alliance_rating: Option<f64>,

    #[serde(default, deserialize_with = "lenient_harvest")]
    pub harvest_data: Option<HarvestData>,
}

impl BankRecord {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        BankRecord {
            id: id.into(),
            name: name.into(),
            ..Default::default()
        }
    }

    /// Add an alias to this bank (duplicates and the name itself are ignored)
    pub fn add_alias(&mut self, alias: impl Into<String>) {
        let alias = alias.into();
        if !self.alias_names.contains(&alias) && alias != self.name {
            self.alias_names.push(alias);
        }
    }

    /// Builder: add a country code
    pub fn in_country(mut self, code: &str) -> Self {
        self.country_codes.insert(code.trim().to_uppercase());
        self
    }

    /// Builder: add a state/region license tag
    pub fn licensed_in(mut self, region: &str) -> Self {
        self.state_license_tags.insert(normalize_region(region));
        self
    }

    /// Builder: set sort-relevant curation fields
    pub fn ranked(mut self, top_pick: bool, alliance_rating: Option<f64>) -> Self {
        self.top_pick = top_pick;
        self.alliance_rating = alliance_rating;
        self
    }

    /// Get all names (name + aliases)
    pub fn all_names(&self) -> Vec<&str> {
        std::iter::once(self.name.as_str())
            .chain(self.alias_names.iter().map(String::as_str))
            .collect()
    }

    /// Alliance rating for ordering: missing or non-finite is 0
    pub fn rating_score(&self) -> f64 {
        match self.alliance_rating {
            Some(r) if r.is_finite() && r != 0.0 => r,
            _ => 0.0,
        }
    }

    pub fn offers(&self, category: HarvestCategory, key: &str) -> bool {
        self.harvest_data
            .as_ref()
            .map(|h| h.offers(category, key))
            .unwrap_or(false)
    }

    pub fn has_category(&self, category: HarvestCategory) -> bool {
        self.harvest_data
            .as_ref()
            .and_then(|h| h.category(category))
            .is_some()
    }
}

// ============================================================================
// LENIENT DECODERS
// ============================================================================

fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(lenient_opt_string(deserializer)?.unwrap_or_default())
}

fn lenient_opt_string<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

fn lenient_bool<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Bool(b) => b,
        Value::Number(n) => n.as_f64().map(|n| n != 0.0).unwrap_or(false),
        Value::String(s) => matches!(s.trim().to_lowercase().as_str(), "true" | "yes" | "1"),
        _ => false,
    })
}

fn lenient_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(coerce_number(&value))
}

fn lenient_object<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<Map<String, Value>>, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Object(map) => Some(map),
        _ => None,
    })
}

fn lenient_harvest<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<HarvestData>, D::Error> {
    let value = Value::deserialize(deserializer)?;
    if !value.is_object() {
        return Ok(None);
    }
    Ok(serde_json::from_value(value).ok())
}

/// Array of strings/objects, or a comma-separated string
fn tag_strings(value: Value) -> Vec<String> {
    let raw: Vec<String> = match value {
        Value::String(s) => s.split(',').map(str::to_string).collect(),
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s),
                Value::Object(obj) => ["code", "tag", "name"]
                    .iter()
                    .find_map(|k| obj.get(*k).and_then(Value::as_str).map(str::to_string)),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    };

    raw.into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn lenient_string_list<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Vec<String>, D::Error> {
    let value = Value::deserialize(deserializer)?;
    let mut names: Vec<String> = Vec::new();
    for name in tag_strings(value) {
        if !names.contains(&name) {
            names.push(name);
        }
    }
    Ok(names)
}

fn lenient_country_set<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<BTreeSet<String>, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(tag_strings(value)
        .into_iter()
        .map(|c| c.to_uppercase())
        .collect())
}

fn lenient_region_set<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<BTreeSet<String>, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(tag_strings(value)
        .iter()
        .map(|r| normalize_region(r))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_rating_category_parse() {
        assert_eq!(RatingCategory::parse("Great"), RatingCategory::Great);
        assert_eq!(RatingCategory::parse(" worst "), RatingCategory::Worst);
        assert_eq!(RatingCategory::parse("excellent"), RatingCategory::Unknown);
    }

    #[test]
    fn test_record_full_decode() {
        let record: BankRecord = serde_json::from_value(json!({
            "id": 17,
            "name": "Triodos Bank",
            "aliasNames": ["Triodos", "Triodos UK"],
            "website": "https://triodos.co.uk",
            "countries": [{ "code": "gb" }, "nl"],
            "stateLicensed": [],
            "rating": "great",
            "topPick": true,
            "allianceMember": "yes",
            "allianceRating": "4.5",
            "harvestData": {
                "depositProducts": { "savings": { "offered": true } },
                "loanProducts": null
            }
        }))
        .unwrap();

        assert_eq!(record.id, "17");
        assert_eq!(record.alias_names, vec!["Triodos", "Triodos UK"]);
        assert!(record.country_codes.contains("GB"));
        assert!(record.country_codes.contains("NL"));
        assert_eq!(record.rating_category, RatingCategory::Great);
        assert!(record.top_pick);
        assert!(record.alliance_member);
        assert_eq!(record.alliance_rating, Some(4.5));

        let harvest = record.harvest_data.as_ref().unwrap();
        assert!(harvest.offers(HarvestCategory::DepositProducts, "savings"));
        assert!(harvest.loan_products.is_none());
        assert!(harvest.services.is_none());
    }

    #[test]
    fn test_record_defaults_everything() {
        let record: BankRecord = serde_json::from_value(json!({
            "name": "Bare Bank",
            "rating": null,
            "topPick": null,
            "allianceRating": "n/a",
            "harvestData": "garbage"
        }))
        .unwrap();

        assert_eq!(record.rating_category, RatingCategory::Unknown);
        assert!(!record.top_pick);
        assert_eq!(record.alliance_rating, None);
        assert_eq!(record.rating_score(), 0.0);
        assert!(record.harvest_data.is_none());
        assert!(record.alias_names.is_empty());
    }

    #[test]
    fn test_aliases_from_comma_string() {
        let record: BankRecord = serde_json::from_value(json!({
            "name": "Bank of America",
            "aliases": "BofA, BoA, ,BofA"
        }))
        .unwrap();

        assert_eq!(record.alias_names, vec!["BofA", "BoA"]);
        assert_eq!(record.all_names(), vec!["Bank of America", "BofA", "BoA"]);
    }

    #[test]
    fn test_region_normalization() {
        assert_eq!(normalize_region("us-ca"), "CA");
        assert_eq!(normalize_region(" NY "), "NY");

        let record: BankRecord = serde_json::from_value(json!({
            "name": "Local CU",
            "stateLicensed": [{ "tag": "US-TX" }, "ok"]
        }))
        .unwrap();
        assert!(record.state_license_tags.contains("TX"));
        assert!(record.state_license_tags.contains("OK"));
    }

    #[test]
    fn test_is_offered_shapes() {
        assert!(is_offered(&json!(true)));
        assert!(is_offered(&json!("Yes")));
        assert!(is_offered(&json!({ "offered": true, "explanation": "..." })));
        assert!(!is_offered(&json!({ "offered": false })));
        assert!(!is_offered(&json!({})));
        assert!(!is_offered(&json!(1)));
        assert!(!is_offered(&json!(null)));
    }

    #[test]
    fn test_coerce_number() {
        assert_eq!(coerce_number(&json!(5)), Some(5.0));
        assert_eq!(coerce_number(&json!(" 3.5 ")), Some(3.5));
        assert_eq!(coerce_number(&json!("2%")), Some(2.0));
        assert_eq!(coerce_number(&json!("bad")), None);
        assert_eq!(coerce_number(&json!("NaN")), None);
        assert_eq!(coerce_number(&json!("inf")), None);
        assert_eq!(coerce_number(&json!(null)), None);
    }

    #[test]
    fn test_interest_rates_collected() {
        let harvest: HarvestData = serde_json::from_value(json!({
            "depositProducts": {
                "interest_rates": [{ "high_rate": 1 }],
                "savings": { "offered": true, "interest_rates": [{ "high_rate": "2.5" }] },
                "checking": { "offered": true }
            }
        }))
        .unwrap();

        assert_eq!(harvest.interest_rates().len(), 2);
        assert!(HarvestData::default().interest_rates().is_empty());
    }

    #[test]
    fn test_deposit_protection() {
        let mut harvest = HarvestData::default();
        assert_eq!(harvest.deposit_protection(), None);

        *harvest.category_mut(HarvestCategory::Policies) =
            Some(json!({ "deposit_protection": { "offered": true } }).as_object().unwrap().clone());
        assert_eq!(harvest.deposit_protection(), Some(true));
    }

    #[test]
    fn test_add_alias() {
        let mut bank = BankRecord::new("1", "Bank of America");
        bank.add_alias("BofA");
        bank.add_alias("BofA");
        bank.add_alias("Bank of America");
        assert_eq!(bank.alias_names, vec!["BofA"]);
    }
}
