use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};
use serde_json::Value;
use tracing::{debug, warn};

use super::domain::{
    AddressParts, Coordinates, Descriptions, MarketingType, Property, PropertyDetails, RentTerms,
};
use super::upstream::{flag, LooseNumber, UpstreamImage, UpstreamProperty};

/// Listings created within this many days are flagged as new.
pub const NEW_LISTING_WINDOW_DAYS: i64 = 30;
pub const DEFAULT_CURRENCY: &str = "EUR";

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum NormalizeError {
    #[error("record does not match the listing schema: {0}")]
    Malformed(String),
    #[error("listing id is missing or not an integer")]
    InvalidId,
    #[error("marketing type {0:?} is not BUY or RENT")]
    UnknownMarketingType(Option<String>),
    #[error("price '{0}' is not a non-negative amount")]
    InvalidPrice(String),
}

/// Normalizes a page of raw upstream records.
///
/// Records that fail to normalize are logged and skipped; archived listings are
/// dropped afterwards. Input order is kept for everything that survives.
pub fn normalize_batch(records: Vec<Value>, now: DateTime<Utc>) -> Vec<Property> {
    let mut properties = Vec::with_capacity(records.len());

    for raw in records {
        let listing_id = record_id_hint(&raw);
        let normalized = serde_json::from_value::<UpstreamProperty>(raw)
            .map_err(|err| NormalizeError::Malformed(err.to_string()))
            .and_then(|record| normalize(&record, now));

        match normalized {
            Ok(property) if property.archived => {
                debug!(listing_id = property.id, "dropping archived listing");
            }
            Ok(property) => properties.push(property),
            Err(err) => {
                warn!(%listing_id, error = %err, "skipping listing that failed to normalize");
            }
        }
    }

    properties
}

/// Maps one upstream record onto the internal [`Property`] shape.
pub fn normalize(record: &UpstreamProperty, now: DateTime<Utc>) -> Result<Property, NormalizeError> {
    let id = record
        .id
        .as_ref()
        .and_then(LooseNumber::as_f64)
        .filter(|id| id.fract() == 0.0 && id.abs() < i64::MAX as f64)
        .map(|id| id as i64)
        .ok_or(NormalizeError::InvalidId)?;

    let marketing_type = record
        .marketing_type
        .as_deref()
        .ok_or(NormalizeError::UnknownMarketingType(None))?
        .parse::<MarketingType>()
        .map_err(|err| NormalizeError::UnknownMarketingType(Some(err.0)))?;

    let price = listing_price(record, marketing_type)?;
    let (image, images) = select_images(record.images.as_deref().unwrap_or_default());

    let address = AddressParts {
        street: text(&record.street),
        house_number: text(&record.house_number),
        zip_code: text(&record.zip_code),
        city: text(&record.city),
        country: text(&record.country),
        region: text(&record.region),
        formatted: text(&record.address).or_else(|| text(&record.short_address)),
        hidden: flag(&record.hide_address),
    };

    let created_at = record.created_at.as_deref().and_then(parse_timestamp);
    let is_new = created_at
        .map(|created| created > now - Duration::days(NEW_LISTING_WINDOW_DAYS))
        .unwrap_or(false);

    Ok(Property {
        id,
        title: text(&record.title)
            .or_else(|| text(&record.name))
            .unwrap_or_default(),
        location: format_location(record),
        neighborhood: text(&record.location_name)
            .or_else(|| text(&record.city))
            .unwrap_or_default(),
        image,
        images,
        price,
        currency: text(&record.currency).unwrap_or_else(|| DEFAULT_CURRENCY.to_string()),
        beds: count(&record.number_of_bed_rooms)
            .or_else(|| count(&record.number_of_rooms))
            .unwrap_or(0),
        baths: count(&record.number_of_bath_rooms).unwrap_or(0),
        sqm: area(&record.living_space)
            .or_else(|| area(&record.property_space_value))
            .unwrap_or(0.0),
        marketing_type,
        is_new,
        coordinates: coordinates(record),
        address,
        rent: RentTerms {
            base_rent: amount(&record.base_rent),
            total_rent: amount(&record.total_rent),
            service_charge: amount(&record.service_charge),
            heating_costs: amount(&record.heating_costs),
            deposit: record.deposit.as_ref().and_then(LooseNumber::as_text),
        },
        details: PropertyDetails {
            rooms: amount(&record.number_of_rooms),
            object_type: text(&record.object_type),
            kind: text(&record.rs_type),
            category: text(&record.rs_category),
            construction_year: count(&record.construction_year).filter(|year| *year > 0),
            energy_rating: text(&record.energy_efficiency_class),
            heating_type: text(&record.heating_type),
            condition: text(&record.condition),
            floor: record.floor.as_ref().and_then(LooseNumber::as_text),
            number_of_floors: count(&record.number_of_floors),
            cellar: flag(&record.cellar),
            plot_area: area(&record.plot_area),
            usable_floor_space: area(&record.usable_floor_space),
            price_per_sqm: amount(&record.price_per_sqm),
            price_on_inquiry: flag(&record.price_on_inquiry),
            free_from: text(&record.free_from),
            status_id: count(&record.property_status_id),
        },
        descriptions: Descriptions {
            description: text(&record.long_description_note)
                .or_else(|| text(&record.description_note)),
            location: text(&record.long_location_note).or_else(|| text(&record.location_note)),
            furnishing: text(&record.long_furnishing_note)
                .or_else(|| text(&record.furnishing_note)),
            other: text(&record.long_other_note).or_else(|| text(&record.other_note)),
        },
        archived: flag(&record.archived),
        created_at,
        updated_at: record.updated_at.as_deref().and_then(parse_timestamp),
    })
}

/// Parses a price that may carry a currency symbol and thousands separators,
/// e.g. `"€1,200,000"`, `"1.200.000 €"` or `"950,50"`.
pub fn parse_price(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, '.' | ',' | '-'))
        .collect();
    if !cleaned.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }

    let last_dot = cleaned.rfind('.');
    let last_comma = cleaned.rfind(',');
    let decimal_separator = match (last_dot, last_comma) {
        (Some(dot), Some(comma)) => Some(if dot > comma { '.' } else { ',' }),
        (Some(_), None) => single_separator_role(&cleaned, '.'),
        (None, Some(_)) => single_separator_role(&cleaned, ','),
        (None, None) => None,
    };

    let canonical: String = cleaned
        .chars()
        .filter_map(|c| match c {
            '.' | ',' if Some(c) == decimal_separator => Some('.'),
            '.' | ',' => None,
            other => Some(other),
        })
        .collect();

    canonical.parse::<f64>().ok().filter(|value| value.is_finite())
}

/// Decides whether the only separator kind present marks decimals.
fn single_separator_role(cleaned: &str, separator: char) -> Option<char> {
    if cleaned.matches(separator).count() > 1 {
        return None;
    }
    let digits_after = cleaned
        .rsplit(separator)
        .next()
        .map(|tail| tail.chars().filter(char::is_ascii_digit).count())
        .unwrap_or(0);
    if digits_after == 3 {
        None
    } else {
        Some(separator)
    }
}

fn listing_price(
    record: &UpstreamProperty,
    marketing_type: MarketingType,
) -> Result<f64, NormalizeError> {
    let source = match marketing_type {
        MarketingType::Rent => price_source(&record.total_rent).or(price_source(&record.base_rent)),
        MarketingType::Buy => price_source(&record.price),
    };

    match source {
        None => Ok(0.0),
        Some(LooseNumber::Number(value)) if value.is_finite() && *value >= 0.0 => Ok(*value),
        Some(LooseNumber::Number(value)) => Err(NormalizeError::InvalidPrice(value.to_string())),
        Some(LooseNumber::Text(raw)) => parse_price(raw)
            .filter(|value| *value >= 0.0)
            .ok_or_else(|| NormalizeError::InvalidPrice(raw.clone())),
    }
}

/// Blank text and a zero amount count as "no price given" so the next source applies.
fn price_source(value: &Option<LooseNumber>) -> Option<&LooseNumber> {
    value.as_ref().filter(|value| match value {
        LooseNumber::Number(amount) => *amount != 0.0,
        LooseNumber::Text(raw) => !raw.trim().is_empty(),
    })
}

fn select_images(images: &[UpstreamImage]) -> (String, Vec<String>) {
    let mut public: Vec<&UpstreamImage> = images
        .iter()
        .filter(|image| image.is_public_photo() && text(&image.url).is_some())
        .collect();

    let primary = public
        .first()
        .and_then(|image| text(&image.url))
        .unwrap_or_default();

    public.sort_by(|a, b| a.sort_position().total_cmp(&b.sort_position()));
    let gallery = public
        .into_iter()
        .filter_map(|image| text(&image.url))
        .collect();

    (primary, gallery)
}

fn format_location(record: &UpstreamProperty) -> String {
    if let Some(formatted) = text(&record.address) {
        return formatted;
    }

    [
        &record.street,
        &record.house_number,
        &record.zip_code,
        &record.city,
    ]
    .into_iter()
    .filter_map(text)
    .collect::<Vec<_>>()
    .join(" ")
}

fn coordinates(record: &UpstreamProperty) -> Option<Coordinates> {
    let lat = record.lat.as_ref().and_then(LooseNumber::as_f64)?;
    let lng = record.lng.as_ref().and_then(LooseNumber::as_f64)?;
    Some(Coordinates { lat, lng })
}

fn text(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

fn count(value: &Option<LooseNumber>) -> Option<u32> {
    value.as_ref().and_then(LooseNumber::as_count)
}

fn amount(value: &Option<LooseNumber>) -> Option<f64> {
    value.as_ref().and_then(LooseNumber::as_f64)
}

fn area(value: &Option<LooseNumber>) -> Option<f64> {
    amount(value).filter(|area| *area >= 0.0)
}

fn record_id_hint(raw: &Value) -> String {
    match raw.get("id") {
        Some(Value::String(id)) => id.clone(),
        Some(Value::Number(id)) => id.to_string(),
        _ => "<unknown>".to_string(),
    }
}

pub(crate) fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.with_timezone(&Utc));
    }

    if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S") {
        return Some(dt.and_utc());
    }

    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}
