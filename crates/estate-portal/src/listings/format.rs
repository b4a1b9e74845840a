//! Display formatting for listing detail views.

/// Formats a whole-unit amount the way German listings show it: `1.250.000 €`.
/// Fractions are rounded; unknown currencies keep their ISO code.
pub fn format_price(amount: f64, currency: &str) -> String {
    let rounded = amount.round();
    let negative = rounded < 0.0;
    let digits = format!("{:.0}", rounded.abs());

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, digit) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(digit);
    }

    let symbol = match currency.trim().to_ascii_uppercase().as_str() {
        "EUR" | "" => "€".to_string(),
        "USD" => "$".to_string(),
        "GBP" => "£".to_string(),
        "CHF" => "CHF".to_string(),
        other => other.to_string(),
    };

    let sign = if negative { "-" } else { "" };
    format!("{sign}{grouped} {symbol}")
}

/// `"CENTRAL_HEATING"` -> `"Central Heating"`.
pub fn format_enum_value(value: &str) -> String {
    value
        .split('_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => {
                    first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase()
                }
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn property_kind_label(kind: &str) -> String {
    let known = match kind {
        "APARTMENT" => "Apartment",
        "HOUSE" => "House",
        "PENTHOUSE" => "Penthouse",
        "LOFT" => "Loft",
        "MAISONETTE" => "Maisonette",
        "TERRACED_FLAT" => "Terraced Flat",
        "GROUND_FLOOR" => "Ground Floor Apartment",
        "ROOF_STOREY" => "Roof Storey",
        "STUDIO" => "Studio",
        "OFFICE" => "Office",
        "COMMERCIAL" => "Commercial",
        "INVESTMENT" => "Investment",
        _ => return format_enum_value(kind),
    };
    known.to_string()
}

pub fn heating_label(heating: &str) -> String {
    let known = match heating {
        "COMBINED_HEAT_AND_POWER_FOSSIL_FUELS" => "Combined Heat and Power",
        _ => return format_enum_value(heating),
    };
    known.to_string()
}

pub fn condition_label(condition: &str) -> String {
    format_enum_value(condition)
}
