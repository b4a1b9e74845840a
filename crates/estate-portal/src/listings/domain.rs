use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Marketing classification of a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MarketingType {
    Buy,
    Rent,
}

impl MarketingType {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Buy => "BUY",
            Self::Rent => "RENT",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Buy => "For sale",
            Self::Rent => "For rent",
        }
    }
}

impl fmt::Display for MarketingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown marketing type '{0}', expected BUY or RENT")]
pub struct UnknownMarketingType(pub String);

impl FromStr for MarketingType {
    type Err = UnknownMarketingType;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_uppercase().as_str() {
            "BUY" => Ok(Self::Buy),
            "RENT" => Ok(Self::Rent),
            _ => Err(UnknownMarketingType(value.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressParts {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub street: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub house_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zip_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    /// Pre-formatted address as supplied upstream.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formatted: Option<String>,
    #[serde(default)]
    pub hidden: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RentTerms {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_rent: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_rent: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_charge: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heating_costs: Option<f64>,
    /// Free text upstream, e.g. "3 Kaltmieten".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deposit: Option<String>,
}

impl RentTerms {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyDetails {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rooms: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub construction_year: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub energy_rating: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heating_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub floor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number_of_floors: Option<u32>,
    #[serde(default)]
    pub cellar: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plot_area: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usable_floor_space: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_per_sqm: Option<f64>,
    #[serde(default)]
    pub price_on_inquiry: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub free_from: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_id: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Descriptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub furnishing: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub other: Option<String>,
}

/// Internal listing record served to browse and detail views.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Property {
    pub id: i64,
    pub title: String,
    pub location: String,
    pub neighborhood: String,
    pub image: String,
    pub images: Vec<String>,
    pub price: f64,
    pub currency: String,
    pub beds: u32,
    pub baths: u32,
    pub sqm: f64,
    #[serde(rename = "type")]
    pub marketing_type: MarketingType,
    pub is_new: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<Coordinates>,
    #[serde(default)]
    pub address: AddressParts,
    #[serde(default, skip_serializing_if = "RentTerms::is_empty")]
    pub rent: RentTerms,
    #[serde(default)]
    pub details: PropertyDetails,
    #[serde(default)]
    pub descriptions: Descriptions,
    #[serde(default)]
    pub archived: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}
