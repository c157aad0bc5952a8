// 🏷️ Display Fields - derived values shown on bank cards

use super::record::{coerce_number, is_offered, BankRecord, HarvestCategory, HarvestData, RatingCategory};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Shown when a value is unavailable
pub const NO_VALUE: &str = "-";

// ============================================================================
// INTEREST RATE / DEPOSIT PROTECTION
// ============================================================================

/// "Up to X%" over the numeric `high_rate` entries; dash when none.
/// Non-numeric entries are skipped, numeric strings are coerced.
pub fn interest_rate_display<'a, I>(rates: I) -> String
where
    I: IntoIterator<Item = &'a Value>,
{
    let max = rates
        .into_iter()
        .filter_map(|rate| rate.get("high_rate"))
        .filter_map(coerce_number)
        .fold(None, |acc: Option<f64>, rate| {
            Some(acc.map_or(rate, |m| m.max(rate)))
        });

    match max {
        Some(rate) => format!("Up to {}%", rate),
        None => NO_VALUE.to_string(),
    }
}

pub fn deposit_protection_display(protected: Option<bool>) -> String {
    match protected {
        Some(true) => "YES".to_string(),
        _ => NO_VALUE.to_string(),
    }
}

// ============================================================================
// FEATURE EXTRACTION
// ============================================================================

/// One feature hidden for a set of countries
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExclusionRule {
    pub feature: String,
    pub countries: Vec<String>,
}

impl ExclusionRule {
    pub fn new(feature: &str, countries: &[&str]) -> Self {
        ExclusionRule {
            feature: feature.to_string(),
            countries: countries.iter().map(|c| c.to_uppercase()).collect(),
        }
    }

    fn applies(&self, feature: &str, country: Option<&str>) -> bool {
        self.feature == feature
            && country
                .map(|c| self.countries.iter().any(|x| x.eq_ignore_ascii_case(c)))
                .unwrap_or(false)
    }
}

/// Features not listed for some countries. Defaults hide credit cards in
/// GB and FR; replace the table through configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureExclusions {
    rules: Vec<ExclusionRule>,
}

impl FeatureExclusions {
    pub fn new(rules: Vec<ExclusionRule>) -> Self {
        FeatureExclusions { rules }
    }

    pub fn none() -> Self {
        FeatureExclusions { rules: Vec::new() }
    }

    pub fn rules(&self) -> &[ExclusionRule] {
        &self.rules
    }

    pub fn is_excluded(&self, feature: &str, country: Option<&str>) -> bool {
        self.rules.iter().any(|r| r.applies(feature, country))
    }
}

impl Default for FeatureExclusions {
    fn default() -> Self {
        FeatureExclusions::new(vec![ExclusionRule::new("credit_cards", &["GB", "FR"])])
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeatureGroup {
    pub category: HarvestCategory,
    pub label: String,
    pub features: Vec<String>,
}

/// Categories listed on a card, in display order
pub const FEATURE_CATEGORIES: [HarvestCategory; 5] = [
    HarvestCategory::CustomersServed,
    HarvestCategory::DepositProducts,
    HarvestCategory::LoanProducts,
    HarvestCategory::Services,
    HarvestCategory::FinancialFeatures,
];

/// "small_business_lending" → "Small business lending"
pub fn feature_label(key: &str) -> String {
    let words = key.replace(['_', '-'], " ");
    let mut chars = words.trim().chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Offered entries grouped by category. Empty groups are omitted.
pub fn extract_features(
    harvest: &HarvestData,
    country: Option<&str>,
    exclusions: &FeatureExclusions,
) -> Vec<FeatureGroup> {
    FEATURE_CATEGORIES
        .iter()
        .filter_map(|category| {
            let group = harvest.category(*category)?;
            let features: Vec<String> = group
                .iter()
                .filter(|(_, value)| is_offered(value))
                .filter(|(key, _)| !exclusions.is_excluded(key, country))
                .map(|(key, _)| feature_label(key))
                .collect();

            (!features.is_empty()).then(|| FeatureGroup {
                category: *category,
                label: category.label().to_string(),
                features,
            })
        })
        .collect()
}

// ============================================================================
// BANK CARD
// ============================================================================

/// Display projection of a ranked record
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BankCard {
    pub id: String,
    pub name: String,
    pub website: Option<String>,
    pub rating: RatingCategory,
    pub top_pick: bool,
    pub alliance_member: bool,
    pub interest_rate: String,
    pub deposit_protection: String,
    pub features: Vec<FeatureGroup>,
}

impl BankCard {
    pub fn from_record(
        record: &BankRecord,
        country: Option<&str>,
        exclusions: &FeatureExclusions,
    ) -> Self {
        let (interest_rate, deposit_protection, features) = match &record.harvest_data {
            Some(harvest) => (
                interest_rate_display(harvest.interest_rates()),
                deposit_protection_display(harvest.deposit_protection()),
                extract_features(harvest, country, exclusions),
            ),
            None => (NO_VALUE.to_string(), NO_VALUE.to_string(), Vec::new()),
        };

        BankCard {
            id: record.id.clone(),
            name: record.name.clone(),
            website: record.website.clone(),
            rating: record.rating_category,
            top_pick: record.top_pick,
            alliance_member: record.alliance_member,
            interest_rate,
            deposit_protection,
            features,
        }
    }
}
