use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::domain::{MarketingType, Property};

/// Slider bounds and steps offered by the browse filters.
pub mod limits {
    pub const PRICE_MIN: f64 = 0.0;
    pub const PRICE_MAX: f64 = 2_000_000.0;
    pub const PRICE_STEP: f64 = 10_000.0;
    pub const SIZE_MIN: f64 = 0.0;
    pub const SIZE_MAX: f64 = 200.0;
    pub const SIZE_STEP: f64 = 5.0;
}

pub const ALL_NEIGHBORHOODS: &str = "All Neighborhoods";
pub const ALL_BEDROOMS: &str = "All";

/// Neighborhoods offered as filter chips.
pub const NEIGHBORHOODS: &[&str] = &[
    "Prenzlauer Berg",
    "Charlottenburg",
    "Kreuzberg",
    "Mitte",
    "Friedrichshain",
];

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FilterParseError {
    #[error("unknown property type '{0}', expected all, buy or rent")]
    PropertyType(String),
    #[error("unknown bedroom bucket '{0}', expected All, a number or 4+")]
    Bedrooms(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeFilter {
    #[default]
    All,
    Buy,
    Rent,
}

impl TypeFilter {
    pub fn admits(self, marketing_type: MarketingType) -> bool {
        match self {
            TypeFilter::All => true,
            TypeFilter::Buy => marketing_type == MarketingType::Buy,
            TypeFilter::Rent => marketing_type == MarketingType::Rent,
        }
    }
}

impl FromStr for TypeFilter {
    type Err = FilterParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(Self::All),
            "buy" => Ok(Self::Buy),
            "rent" => Ok(Self::Rent),
            _ => Err(FilterParseError::PropertyType(value.to_string())),
        }
    }
}

/// Bedroom filter chip. Serialized as `"All"`, `"1"`, `"2"`, ... or `"4+"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum BedroomBucket {
    All,
    Exactly(u32),
    FourPlus,
}

impl BedroomBucket {
    pub const OPTIONS: [BedroomBucket; 5] = [
        BedroomBucket::All,
        BedroomBucket::Exactly(1),
        BedroomBucket::Exactly(2),
        BedroomBucket::Exactly(3),
        BedroomBucket::FourPlus,
    ];

    pub fn admits(self, beds: u32) -> bool {
        match self {
            BedroomBucket::All => true,
            BedroomBucket::Exactly(count) => beds == count,
            BedroomBucket::FourPlus => beds >= 4,
        }
    }
}

impl fmt::Display for BedroomBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BedroomBucket::All => f.write_str(ALL_BEDROOMS),
            BedroomBucket::Exactly(count) => write!(f, "{count}"),
            BedroomBucket::FourPlus => f.write_str("4+"),
        }
    }
}

impl FromStr for BedroomBucket {
    type Err = FilterParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        if trimmed.eq_ignore_ascii_case(ALL_BEDROOMS) {
            return Ok(Self::All);
        }
        if trimmed == "4+" {
            return Ok(Self::FourPlus);
        }
        trimmed
            .parse::<u32>()
            .map(Self::Exactly)
            .map_err(|_| FilterParseError::Bedrooms(value.to_string()))
    }
}

impl TryFrom<String> for BedroomBucket {
    type Error = FilterParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<BedroomBucket> for String {
    fn from(value: BedroomBucket) -> Self {
        value.to_string()
    }
}

/// Neighborhood filter chip; `"All Neighborhoods"` is the unrestricted sentinel.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum NeighborhoodChoice {
    All,
    Named(String),
}

impl NeighborhoodChoice {
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named(name.into())
    }

    pub fn admits(&self, neighborhood: &str) -> bool {
        match self {
            NeighborhoodChoice::All => true,
            NeighborhoodChoice::Named(name) => name == neighborhood,
        }
    }
}

impl From<String> for NeighborhoodChoice {
    fn from(value: String) -> Self {
        if value == ALL_NEIGHBORHOODS {
            Self::All
        } else {
            Self::Named(value)
        }
    }
}

impl From<NeighborhoodChoice> for String {
    fn from(value: NeighborhoodChoice) -> Self {
        match value {
            NeighborhoodChoice::All => ALL_NEIGHBORHOODS.to_string(),
            NeighborhoodChoice::Named(name) => name,
        }
    }
}

/// Browse filter selection. Ranges are inclusive on both ends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterCriteria {
    #[serde(rename = "type")]
    pub property_type: TypeFilter,
    pub price_min: f64,
    pub price_max: f64,
    pub bedrooms: Vec<BedroomBucket>,
    pub neighborhoods: Vec<NeighborhoodChoice>,
    pub size_min: f64,
    pub size_max: f64,
}

impl Default for FilterCriteria {
    fn default() -> Self {
        Self {
            property_type: TypeFilter::All,
            price_min: limits::PRICE_MIN,
            price_max: limits::PRICE_MAX,
            bedrooms: vec![BedroomBucket::All],
            neighborhoods: vec![NeighborhoodChoice::All],
            size_min: limits::SIZE_MIN,
            size_max: limits::SIZE_MAX,
        }
    }
}

/// Whether `property` satisfies every clause of `criteria`.
pub fn matches(property: &Property, criteria: &FilterCriteria) -> bool {
    criteria.property_type.admits(property.marketing_type)
        && price_in_range(property.price, criteria)
        && selection_admits(&criteria.bedrooms, &BedroomBucket::All, |bucket| {
            bucket.admits(property.beds)
        })
        && selection_admits(&criteria.neighborhoods, &NeighborhoodChoice::All, |choice| {
            choice.admits(&property.neighborhood)
        })
        && criteria.size_min <= property.sqm
        && property.sqm <= criteria.size_max
}

/// Returns the matching properties in their original order.
pub fn filter_all(properties: &[Property], criteria: &FilterCriteria) -> Vec<Property> {
    properties
        .iter()
        .filter(|property| matches(property, criteria))
        .cloned()
        .collect()
}

/// Number of listings shown on the home page teaser.
pub const FEATURED_COUNT: usize = 4;

/// The `count` most recently created listings, newest first.
///
/// Ties on `created_at` go to the more recently updated listing; undated
/// listings sort last. Fully tied listings keep their input order.
pub fn featured(properties: &[Property], count: usize) -> Vec<Property> {
    let mut ranked: Vec<&Property> = properties.iter().collect();
    ranked.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| b.updated_at.cmp(&a.updated_at))
    });
    ranked.into_iter().take(count).cloned().collect()
}

/// Toggles `candidate` in a multi-select set guarded by an `all` sentinel.
///
/// Selecting a concrete value replaces the sentinel, selecting the sentinel clears
/// every concrete value, and removing the last concrete value restores the sentinel.
pub fn toggle<T: PartialEq + Clone>(current: &[T], candidate: T, all: T) -> Vec<T> {
    if current.is_empty() || current.contains(&all) {
        if candidate == all {
            return vec![all];
        }
        return vec![candidate];
    }

    if candidate == all {
        return vec![all];
    }

    if current.contains(&candidate) {
        let remaining: Vec<T> = current
            .iter()
            .filter(|value| **value != candidate)
            .cloned()
            .collect();
        if remaining.is_empty() {
            vec![all]
        } else {
            remaining
        }
    } else {
        let mut next = current.to_vec();
        next.push(candidate);
        next
    }
}

// Non-finite prices never satisfy a range.
fn price_in_range(price: f64, criteria: &FilterCriteria) -> bool {
    price.is_finite() && criteria.price_min <= price && price <= criteria.price_max
}

// An empty selection is treated like the sentinel.
fn selection_admits<T: PartialEq>(
    selection: &[T],
    all: &T,
    mut admits: impl FnMut(&T) -> bool,
) -> bool {
    selection.is_empty() || selection.contains(all) || selection.iter().any(|value| admits(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listings::test_support::property;
    use chrono::{TimeZone, Utc};

    fn criteria() -> FilterCriteria {
        FilterCriteria::default()
    }

    #[test]
    fn price_bounds_are_inclusive() {
        let mut criteria = criteria();
        criteria.price_min = 100_000.0;
        criteria.price_max = 500_000.0;

        let at_min = Property { price: 100_000.0, ..property(1) };
        let at_max = Property { price: 500_000.0, ..property(2) };
        let below = Property { price: 99_999.0, ..property(3) };
        let above = Property { price: 500_001.0, ..property(4) };

        assert!(matches(&at_min, &criteria));
        assert!(matches(&at_max, &criteria));
        assert!(!matches(&below, &criteria));
        assert!(!matches(&above, &criteria));
    }

    #[test]
    fn non_finite_price_fails_the_price_clause() {
        let unparsed = Property { price: f64::NAN, ..property(1) };
        let unbounded = Property { price: f64::INFINITY, ..property(2) };
        let mut wide_open = criteria();
        wide_open.price_max = f64::INFINITY;

        assert!(!matches(&unparsed, &criteria()));
        assert!(!matches(&unparsed, &wide_open));
        assert!(!matches(&unbounded, &wide_open));
    }

    #[test]
    fn four_plus_bucket_matches_four_and_more() {
        let mut criteria = criteria();
        criteria.bedrooms = vec![BedroomBucket::FourPlus];

        assert!(matches(&Property { beds: 4, ..property(1) }, &criteria));
        assert!(matches(&Property { beds: 7, ..property(2) }, &criteria));
        assert!(!matches(&Property { beds: 3, ..property(3) }, &criteria));
    }

    #[test]
    fn bedroom_buckets_are_alternatives() {
        let mut criteria = criteria();
        criteria.bedrooms = vec![BedroomBucket::Exactly(1), BedroomBucket::Exactly(3)];

        assert!(matches(&Property { beds: 1, ..property(1) }, &criteria));
        assert!(matches(&Property { beds: 3, ..property(2) }, &criteria));
        assert!(!matches(&Property { beds: 2, ..property(3) }, &criteria));
    }

    #[test]
    fn sentinels_admit_any_value() {
        let criteria = criteria();
        let odd = Property {
            beds: 42,
            neighborhood: "Somewhere Else".to_string(),
            ..property(1)
        };
        assert!(matches(&odd, &criteria));
    }

    #[test]
    fn neighborhood_requires_exact_membership() {
        let mut criteria = criteria();
        criteria.neighborhoods = vec![
            NeighborhoodChoice::named("Mitte"),
            NeighborhoodChoice::named("Kreuzberg"),
        ];

        let mitte = Property { neighborhood: "Mitte".to_string(), ..property(1) };
        let lowercase = Property { neighborhood: "mitte".to_string(), ..property(2) };
        assert!(matches(&mitte, &criteria));
        assert!(!matches(&lowercase, &criteria));
    }

    #[test]
    fn type_filter_restricts_marketing_type() {
        let mut criteria = criteria();
        criteria.property_type = TypeFilter::Rent;

        let rent = Property { marketing_type: MarketingType::Rent, ..property(1) };
        let buy = Property { marketing_type: MarketingType::Buy, ..property(2) };
        assert!(matches(&rent, &criteria));
        assert!(!matches(&buy, &criteria));
    }

    #[test]
    fn size_bounds_are_inclusive() {
        let mut criteria = criteria();
        criteria.size_min = 50.0;
        criteria.size_max = 80.0;

        assert!(matches(&Property { sqm: 50.0, ..property(1) }, &criteria));
        assert!(matches(&Property { sqm: 80.0, ..property(2) }, &criteria));
        assert!(!matches(&Property { sqm: 80.5, ..property(3) }, &criteria));
    }

    #[test]
    fn filter_all_keeps_input_order() {
        let list = vec![
            Property { beds: 2, ..property(3) },
            Property { beds: 1, ..property(1) },
            Property { beds: 2, ..property(2) },
        ];
        let mut criteria = criteria();
        criteria.bedrooms = vec![BedroomBucket::Exactly(2)];

        let ids: Vec<i64> = filter_all(&list, &criteria).iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![3, 2]);
    }

    #[test]
    fn featured_picks_newest_listings_first() {
        let at = |day: u32| Utc.with_ymd_and_hms(2025, 9, day, 9, 0, 0).single();
        let list = vec![
            Property { created_at: at(1), ..property(1) },
            Property { created_at: None, ..property(2) },
            Property { created_at: at(20), ..property(3) },
            Property { created_at: at(10), updated_at: at(11), ..property(4) },
            Property { created_at: at(10), updated_at: at(15), ..property(5) },
            Property { created_at: at(5), ..property(6) },
        ];

        let ids: Vec<i64> = featured(&list, FEATURED_COUNT).iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![3, 5, 4, 6]);

        let everything: Vec<i64> = featured(&list, 10).iter().map(|p| p.id).collect();
        assert_eq!(everything, vec![3, 5, 4, 6, 1, 2]);
        assert!(featured(&list, 0).is_empty());
    }

    #[test]
    fn toggle_replaces_sentinel_with_first_selection() {
        let next = toggle(&[BedroomBucket::All], BedroomBucket::Exactly(2), BedroomBucket::All);
        assert_eq!(next, vec![BedroomBucket::Exactly(2)]);
    }

    #[test]
    fn toggle_sentinel_when_selected_is_a_no_op() {
        let next = toggle(&[BedroomBucket::All], BedroomBucket::All, BedroomBucket::All);
        assert_eq!(next, vec![BedroomBucket::All]);
    }

    #[test]
    fn toggle_sentinel_clears_concrete_selections() {
        let current = [BedroomBucket::Exactly(1), BedroomBucket::FourPlus];
        let next = toggle(&current, BedroomBucket::All, BedroomBucket::All);
        assert_eq!(next, vec![BedroomBucket::All]);
    }

    #[test]
    fn toggle_adds_and_removes_values() {
        let current = vec![NeighborhoodChoice::named("Mitte")];
        let added = toggle(&current, NeighborhoodChoice::named("Kreuzberg"), NeighborhoodChoice::All);
        assert_eq!(
            added,
            vec![NeighborhoodChoice::named("Mitte"), NeighborhoodChoice::named("Kreuzberg")]
        );

        let removed = toggle(&added, NeighborhoodChoice::named("Mitte"), NeighborhoodChoice::All);
        assert_eq!(removed, vec![NeighborhoodChoice::named("Kreuzberg")]);
    }

    #[test]
    fn removing_last_selection_restores_sentinel() {
        let next = toggle(&[BedroomBucket::Exactly(3)], BedroomBucket::Exactly(3), BedroomBucket::All);
        assert_eq!(next, vec![BedroomBucket::All]);
    }

    #[test]
    fn criteria_round_trip_through_json_wire_names() {
        let json = serde_json::json!({
            "type": "rent",
            "priceMin": 0,
            "priceMax": 1500,
            "bedrooms": ["2", "4+"],
            "neighborhoods": ["All Neighborhoods"],
            "sizeMin": 40,
            "sizeMax": 120,
        });
        let criteria: FilterCriteria = serde_json::from_value(json).expect("criteria parse");
        assert_eq!(criteria.property_type, TypeFilter::Rent);
        assert_eq!(
            criteria.bedrooms,
            vec![BedroomBucket::Exactly(2), BedroomBucket::FourPlus]
        );
        assert_eq!(criteria.neighborhoods, vec![NeighborhoodChoice::All]);

        let bad: Result<FilterCriteria, _> = serde_json::from_value(serde_json::json!({
            "type": "all", "priceMin": 0, "priceMax": 1, "bedrooms": ["many"],
            "neighborhoods": [], "sizeMin": 0, "sizeMax": 1,
        }));
        assert!(bad.is_err());
    }
}
