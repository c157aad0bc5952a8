// 🎛️ Category Filters - boolean filter state over harvest data
//
// Every category map always holds every key of its fixed key set; toggling
// flips a flag but can never add or drop a key.

use super::record::{BankRecord, HarvestCategory};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;

// ============================================================================
// FILTER KEYS
// ============================================================================

pub trait FilterKey: Copy + Ord + std::fmt::Debug + 'static {
    const ALL: &'static [Self];
    const CATEGORY: HarvestCategory;

    /// Key inside the harvest category map
    fn as_key(&self) -> &'static str;
    fn label(&self) -> &'static str;

    fn parse(key: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|k| k.as_key() == key)
    }
}

macro_rules! filter_keys {
    (
        $name:ident => $category:expr;
        $( $variant:ident = $key:literal, $label:literal; )+
    ) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum $name {
            $( $variant, )+
        }

        impl FilterKey for $name {
            const ALL: &'static [Self] = &[ $( $name::$variant, )+ ];
            const CATEGORY: HarvestCategory = $category;

            fn as_key(&self) -> &'static str {
                match self {
                    $( $name::$variant => $key, )+
                }
            }

            fn label(&self) -> &'static str {
                match self {
                    $( $name::$variant => $label, )+
                }
            }
        }
    };
}

filter_keys! {
    CustomerKey => HarvestCategory::CustomersServed;
    Retail = "retail", "Individuals";
    Sme = "sme", "Small businesses";
    Corporate = "corporate", "Corporations";
    Charities = "charities", "Charities";
}

filter_keys! {
    DepositKey => HarvestCategory::DepositProducts;
    Checking = "checking", "Current accounts";
    Savings = "savings", "Savings accounts";
    Isa = "isa", "ISAs";
    TermDeposits = "term_deposits", "Term deposits";
}

filter_keys! {
    LoanKey => HarvestCategory::LoanProducts;
    Mortgages = "mortgages", "Mortgages";
    PersonalLoans = "personal_loans", "Personal loans";
    SmallBusinessLending = "small_business_lending", "Small business lending";
    CorporateLending = "corporate_lending", "Corporate lending";
    CreditCards = "credit_cards", "Credit cards";
}

filter_keys! {
    ServiceKey => HarvestCategory::Services;
    LocalBranches = "local_branches", "Local branches";
    MobileBanking = "mobile_banking", "Mobile banking";
    AtmNetwork = "atm_network", "ATM network";
    FinancialAdvice = "financial_advice", "Financial advice";
}

// ============================================================================
// CATEGORY FILTER
// ============================================================================

/// Flags for one category; always complete over `K::ALL`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryFilter<K: FilterKey> {
    flags: BTreeMap<K, bool>,
}

impl<K: FilterKey> CategoryFilter<K> {
    pub fn new() -> Self {
        CategoryFilter {
            flags: K::ALL.iter().map(|k| (*k, false)).collect(),
        }
    }

    pub fn set(&mut self, key: K, value: bool) {
        self.flags.insert(key, value);
    }

    pub fn toggle(&mut self, key: K) {
        let current = self.is_set(key);
        self.set(key, !current);
    }

    pub fn is_set(&self, key: K) -> bool {
        self.flags.get(&key).copied().unwrap_or(false)
    }

    /// Keys currently set true
    pub fn active_keys(&self) -> Vec<K> {
        self.flags
            .iter()
            .filter(|(_, on)| **on)
            .map(|(k, _)| *k)
            .collect()
    }

    /// A category with no key set imposes no constraint
    pub fn is_active(&self) -> bool {
        self.flags.values().any(|on| *on)
    }

    pub fn len(&self) -> usize {
        self.flags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (K, bool)> + '_ {
        self.flags.iter().map(|(k, on)| (*k, *on))
    }

    /// Record passes iff, when active, its category data exists and offers
    /// every key set true
    pub fn matches(&self, record: &BankRecord) -> bool {
        let active = self.active_keys();
        if active.is_empty() {
            return true;
        }
        if !record.has_category(K::CATEGORY) {
            return false;
        }
        active
            .iter()
            .all(|key| record.offers(K::CATEGORY, key.as_key()))
    }
}

impl<K: FilterKey> Default for CategoryFilter<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: FilterKey> Serialize for CategoryFilter<K> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let map: BTreeMap<&str, bool> = self.iter().map(|(k, on)| (k.as_key(), on)).collect();
        map.serialize(serializer)
    }
}

/// Unknown keys are ignored; missing keys stay false
impl<'de, K: FilterKey> Deserialize<'de> for CategoryFilter<K> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<BTreeMap<String, bool>>::deserialize(deserializer)?.unwrap_or_default();
        let mut filter = CategoryFilter::new();
        for (key, on) in raw {
            if let Some(k) = K::parse(&key) {
                filter.set(k, on);
            }
        }
        Ok(filter)
    }
}

// ============================================================================
// FILTER STATE
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FilterState {
    pub customers_served: CategoryFilter<CustomerKey>,
    pub deposit_products: CategoryFilter<DepositKey>,
    pub loan_products: CategoryFilter<LoanKey>,
    pub services: CategoryFilter<ServiceKey>,
}

/// A `category:key` pair that names no known filter
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown filter '{0}' (expected category:key, e.g. depositProducts:savings)")]
pub struct UnknownFilter(pub String);

impl FilterState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Dirty iff any flag differs from the all-false default
    pub fn is_dirty(&self) -> bool {
        self.customers_served.is_active()
            || self.deposit_products.is_active()
            || self.loan_products.is_active()
            || self.services.is_active()
    }

    pub fn reset(&mut self) {
        *self = FilterState::default();
    }

    pub fn matches(&self, record: &BankRecord) -> bool {
        self.customers_served.matches(record)
            && self.deposit_products.matches(record)
            && self.loan_products.matches(record)
            && self.services.matches(record)
    }

    /// Set a flag by wire names, e.g. `("depositProducts", "savings")`
    pub fn set_by_name(&mut self, category: &str, key: &str, value: bool) -> Result<(), UnknownFilter> {
        let unknown = || UnknownFilter(format!("{}:{}", category, key));
        match category {
            "customersServed" => self
                .customers_served
                .set(CustomerKey::parse(key).ok_or_else(unknown)?, value),
            "depositProducts" => self
                .deposit_products
                .set(DepositKey::parse(key).ok_or_else(unknown)?, value),
            "loanProducts" => self
                .loan_products
                .set(LoanKey::parse(key).ok_or_else(unknown)?, value),
            "services" => self
                .services
                .set(ServiceKey::parse(key).ok_or_else(unknown)?, value),
            _ => return Err(unknown()),
        }
        Ok(())
    }

    /// Parse `category:key` and set it true
    pub fn enable(&mut self, spec: &str) -> Result<(), UnknownFilter> {
        let (category, key) = spec
            .split_once(':')
            .ok_or_else(|| UnknownFilter(spec.to_string()))?;
        self.set_by_name(category.trim(), key.trim(), true)
    }

    /// Active filters as `category:key` strings
    pub fn active_specs(&self) -> Vec<String> {
        fn specs<K: FilterKey>(filter: &CategoryFilter<K>) -> impl Iterator<Item = String> + '_ {
            filter
                .active_keys()
                .into_iter()
                .map(|k| format!("{}:{}", K::CATEGORY.key(), k.as_key()))
        }

        specs(&self.customers_served)
            .chain(specs(&self.deposit_products))
            .chain(specs(&self.loan_products))
            .chain(specs(&self.services))
            .collect()
    }
}

/// One toggle as presented to a user
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterEntry {
    pub category: HarvestCategory,
    pub key: &'static str,
    pub label: &'static str,
    pub enabled: bool,
}

impl FilterEntry {
    pub fn spec(&self) -> String {
        format!("{}:{}", self.category.key(), self.key)
    }
}

impl FilterState {
    /// Every toggle across all categories, in display order
    pub fn entries(&self) -> Vec<FilterEntry> {
        fn entries_of<K: FilterKey>(filter: &CategoryFilter<K>) -> impl Iterator<Item = FilterEntry> + '_ {
            filter.iter().map(|(k, on)| FilterEntry {
                category: K::CATEGORY,
                key: k.as_key(),
                label: k.label(),
                enabled: on,
            })
        }

        entries_of(&self.customers_served)
            .chain(entries_of(&self.deposit_products))
            .chain(entries_of(&self.loan_products))
            .chain(entries_of(&self.services))
            .collect()
    }

    /// Flip the flag an entry describes
    pub fn toggle_entry(&mut self, entry: &FilterEntry) -> Result<(), UnknownFilter> {
        self.set_by_name(entry.category.key(), entry.key, !entry.enabled)
    }
}

/// Keep only records passing every active category filter
pub fn filter(records: Vec<BankRecord>, state: &FilterState) -> Vec<BankRecord> {
    if !state.is_dirty() {
        return records;
    }
    records.into_iter().filter(|r| state.matches(r)).collect()
}
