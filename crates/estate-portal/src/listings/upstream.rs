//! Wire schema of the third-party listings API.
//!
//! Fields are deliberately loose: the upstream mixes numbers, numeric strings and
//! string flags for the same attribute across accounts. Nothing in here is exposed
//! past the normalizer.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::statuses::status_name;

/// A value the upstream sends either as a JSON number or as a string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LooseNumber {
    Number(f64),
    Text(String),
}

impl LooseNumber {
    /// Plain numeric reading; formatted strings ("1.200 €") are not accepted here.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            LooseNumber::Number(value) => Some(*value).filter(|value| value.is_finite()),
            LooseNumber::Text(text) => text
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|value| value.is_finite()),
        }
    }

    pub fn as_count(&self) -> Option<u32> {
        self.as_f64()
            .filter(|value| *value >= 0.0)
            .map(|value| value.floor().min(u32::MAX as f64) as u32)
    }

    pub fn as_text(&self) -> Option<String> {
        match self {
            LooseNumber::Number(value) if value.fract() == 0.0 => Some(format!("{value:.0}")),
            LooseNumber::Number(value) => Some(value.to_string()),
            LooseNumber::Text(text) => {
                let trimmed = text.trim();
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            }
        }
    }
}

/// A boolean the upstream sometimes encodes as `"true"`, `"1"` or `1`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LooseFlag {
    Bool(bool),
    Number(i64),
    Text(String),
}

impl LooseFlag {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            LooseFlag::Bool(value) => Some(*value),
            LooseFlag::Number(value) => Some(*value != 0),
            LooseFlag::Text(text) => match text.trim().to_ascii_lowercase().as_str() {
                "true" | "1" | "yes" => Some(true),
                "false" | "0" | "no" | "" => Some(false),
                _ => None,
            },
        }
    }
}

pub(crate) fn flag(value: &Option<LooseFlag>) -> bool {
    value.as_ref().and_then(LooseFlag::as_bool).unwrap_or(false)
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpstreamImage {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub is_floorplan: Option<LooseFlag>,
    #[serde(default)]
    pub is_private: Option<LooseFlag>,
    #[serde(default)]
    pub position: Option<LooseNumber>,
}

impl UpstreamImage {
    /// Photos that may be shown publicly in the gallery.
    pub(crate) fn is_public_photo(&self) -> bool {
        !flag(&self.is_floorplan) && !flag(&self.is_private)
    }

    pub(crate) fn sort_position(&self) -> f64 {
        self.position
            .as_ref()
            .and_then(LooseNumber::as_f64)
            .unwrap_or(0.0)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct UpstreamProperty {
    pub id: Option<LooseNumber>,
    pub name: Option<String>,
    pub title: Option<String>,
    pub archived: Option<LooseFlag>,
    pub marketing_type: Option<String>,
    pub property_status_id: Option<LooseNumber>,

    pub street: Option<String>,
    pub house_number: Option<String>,
    pub zip_code: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub region: Option<String>,
    pub address: Option<String>,
    pub short_address: Option<String>,
    pub location_name: Option<String>,
    pub hide_address: Option<LooseFlag>,
    pub lat: Option<LooseNumber>,
    pub lng: Option<LooseNumber>,

    pub price: Option<LooseNumber>,
    pub base_rent: Option<LooseNumber>,
    pub total_rent: Option<LooseNumber>,
    pub service_charge: Option<LooseNumber>,
    pub heating_costs: Option<LooseNumber>,
    pub deposit: Option<LooseNumber>,
    pub price_per_sqm: Option<LooseNumber>,
    pub price_on_inquiry: Option<LooseFlag>,
    pub currency: Option<String>,
    pub free_from: Option<String>,

    pub number_of_rooms: Option<LooseNumber>,
    pub number_of_bed_rooms: Option<LooseNumber>,
    pub number_of_bath_rooms: Option<LooseNumber>,
    pub living_space: Option<LooseNumber>,
    pub property_space_value: Option<LooseNumber>,
    pub plot_area: Option<LooseNumber>,
    pub usable_floor_space: Option<LooseNumber>,

    pub object_type: Option<String>,
    pub rs_type: Option<String>,
    pub rs_category: Option<String>,
    pub construction_year: Option<LooseNumber>,
    pub energy_efficiency_class: Option<String>,
    pub heating_type: Option<String>,
    pub condition: Option<String>,
    pub floor: Option<LooseNumber>,
    pub number_of_floors: Option<LooseNumber>,
    pub cellar: Option<LooseFlag>,

    pub description_note: Option<String>,
    pub long_description_note: Option<String>,
    pub location_note: Option<String>,
    pub long_location_note: Option<String>,
    pub furnishing_note: Option<String>,
    pub long_furnishing_note: Option<String>,
    pub other_note: Option<String>,
    pub long_other_note: Option<String>,

    pub images: Option<Vec<UpstreamImage>>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

/// One page of `/properties`. Records stay raw JSON so a single malformed entry
/// can be skipped without failing the page.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpstreamPage {
    #[serde(default)]
    pub data: Vec<Value>,
    #[serde(default)]
    pub total: u64,
}

/// Entry of the upstream property status taxonomy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpstreamStatus {
    pub id: u32,
    pub name: String,
    #[serde(default)]
    pub position: i32,
}

/// The taxonomy exactly as the upstream sent it; the proxy relays it unchanged.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct UpstreamStatuses {
    #[serde(default)]
    pub data: Vec<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl UpstreamStatuses {
    /// Typed entries. Entries without a numeric id are skipped; a missing name
    /// falls back to the known name for that code.
    pub fn entries(&self) -> Vec<UpstreamStatus> {
        self.data.iter().filter_map(status_entry).collect()
    }
}

fn status_entry(raw: &Value) -> Option<UpstreamStatus> {
    let id = raw
        .get("id")
        .and_then(Value::as_u64)
        .and_then(|id| u32::try_from(id).ok())?;
    let name = raw
        .get("name")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .or_else(|| status_name(id))?
        .to_string();
    let position = raw
        .get("position")
        .and_then(Value::as_i64)
        .and_then(|position| i32::try_from(position).ok())
        .unwrap_or(0);
    Some(UpstreamStatus { id, name, position })
}
