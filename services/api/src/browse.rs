use clap::Args;
use estate_portal::error::AppError;
use estate_portal::listings::filter::limits;
use estate_portal::listings::format::format_price;
use estate_portal::listings::statuses::active_ids_from_taxonomy;
use estate_portal::listings::{
    reduce, BedroomBucket, BrowseAction, BrowseState, LatestRequest, ListingDisplay,
    ListingsClient, MarketingType, NeighborhoodChoice, Property, TypeFilter,
};

const DEFAULT_PROXY_URL: &str = "http://127.0.0.1:3000";

#[derive(Args, Debug)]
pub(crate) struct ListingsArgs {
    /// Base URL of a running listings proxy
    #[arg(long, default_value = DEFAULT_PROXY_URL)]
    pub(crate) proxy_url: String,
    /// Locale forwarded to the listings API
    #[arg(long, default_value = "en")]
    pub(crate) locale: String,
    /// all, buy or rent
    #[arg(long = "type", default_value = "all")]
    pub(crate) property_type: TypeFilter,
    #[arg(long)]
    pub(crate) price_min: Option<f64>,
    #[arg(long)]
    pub(crate) price_max: Option<f64>,
    /// Bedroom bucket (1, 2, 3 or 4+); repeat to select several
    #[arg(long = "bedrooms")]
    pub(crate) bedrooms: Vec<BedroomBucket>,
    /// Neighborhood name; repeat to select several
    #[arg(long = "neighborhood")]
    pub(crate) neighborhoods: Vec<String>,
    #[arg(long)]
    pub(crate) size_min: Option<f64>,
    #[arg(long)]
    pub(crate) size_max: Option<f64>,
    /// Print matching listings as JSON instead of a table
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Args, Debug)]
pub(crate) struct StatusesArgs {
    /// Base URL of a running listings proxy
    #[arg(long, default_value = DEFAULT_PROXY_URL)]
    pub(crate) proxy_url: String,
}

pub(crate) async fn run_listings(args: ListingsArgs) -> Result<(), AppError> {
    let client = ListingsClient::new(args.proxy_url.as_str())?;
    let guard = LatestRequest::new();
    let ticket = guard.begin();

    let marketing_type = match args.property_type {
        TypeFilter::All => None,
        TypeFilter::Buy => Some(MarketingType::Buy),
        TypeFilter::Rent => Some(MarketingType::Rent),
    };

    let state = reduce(BrowseState::default(), BrowseAction::FetchStarted(ticket));
    let state = match client.fetch(&args.locale, marketing_type, None).await {
        Ok(properties) => reduce(
            state,
            BrowseAction::FetchSucceeded { ticket, properties },
        ),
        Err(err) => {
            let state = reduce(state, BrowseAction::fetch_failed(ticket, &err));
            render(&state, false)?;
            return Err(err.into());
        }
    };

    let state = filter_actions(&args)
        .into_iter()
        .fold(state, reduce);
    render(&state, args.json)
}

pub(crate) async fn run_statuses(args: StatusesArgs) -> Result<(), AppError> {
    let client = ListingsClient::new(args.proxy_url.as_str())?;
    let statuses = client.statuses().await?;

    let active = active_ids_from_taxonomy(&statuses);

    println!("Listing statuses");
    for status in statuses {
        let marker = if active.contains(&status.id) {
            " (active)"
        } else {
            ""
        };
        println!("  {:>6}  {}{}", status.id, status.name, marker);
    }
    Ok(())
}

pub(crate) fn filter_actions(args: &ListingsArgs) -> Vec<BrowseAction> {
    let mut actions = vec![
        BrowseAction::SetType(args.property_type),
        BrowseAction::SetPriceRange {
            min: args.price_min.unwrap_or(limits::PRICE_MIN),
            max: args.price_max.unwrap_or(limits::PRICE_MAX),
        },
        BrowseAction::SetSizeRange {
            min: args.size_min.unwrap_or(limits::SIZE_MIN),
            max: args.size_max.unwrap_or(limits::SIZE_MAX),
        },
    ];
    actions.extend(
        args.bedrooms
            .iter()
            .copied()
            .map(BrowseAction::ToggleBedroom),
    );
    actions.extend(
        args.neighborhoods
            .iter()
            .map(|name| BrowseAction::ToggleNeighborhood(NeighborhoodChoice::from(name.clone()))),
    );
    actions
}

fn render(state: &BrowseState, as_json: bool) -> Result<(), AppError> {
    match state.display() {
        ListingDisplay::Loading { placeholders } => {
            println!("Loading listings ({placeholders} placeholders)");
        }
        ListingDisplay::Failed(message) => {
            println!("Could not load listings: {message}");
        }
        ListingDisplay::Empty => {
            let (_, total) = state.counts();
            println!("No properties match your filters ({total} loaded)");
        }
        ListingDisplay::Results(visible) if as_json => {
            let json = serde_json::to_string_pretty(&visible).map_err(std::io::Error::from)?;
            println!("{json}");
        }
        ListingDisplay::Results(visible) => {
            let (shown, total) = state.counts();
            println!("Showing {shown} of {total} properties");
            for property in visible {
                println!("{}", summary_line(property));
            }
        }
    }
    Ok(())
}

fn summary_line(property: &Property) -> String {
    let new_marker = if property.is_new { " [new]" } else { "" };
    format!(
        "  #{:<8} {}{} | {} | {} | {} bd, {} ba, {:.0} m² | {}",
        property.id,
        property.title,
        new_marker,
        property.neighborhood,
        format_price(property.price, &property.currency),
        property.beds,
        property.baths,
        property.sqm,
        property.marketing_type.label(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> ListingsArgs {
        ListingsArgs {
            proxy_url: DEFAULT_PROXY_URL.to_string(),
            locale: "en".to_string(),
            property_type: TypeFilter::Rent,
            price_min: Some(2_000.0),
            price_max: Some(500.0),
            bedrooms: vec![BedroomBucket::Exactly(2), BedroomBucket::FourPlus],
            neighborhoods: vec!["Mitte".to_string()],
            size_min: None,
            size_max: None,
            json: false,
        }
    }

    #[test]
    fn cli_flags_become_browse_actions() {
        let state = filter_actions(&args())
            .into_iter()
            .fold(BrowseState::default(), reduce);

        assert_eq!(state.filters.property_type, TypeFilter::Rent);
        assert_eq!(state.filters.price_min, 500.0);
        assert_eq!(state.filters.price_max, 2_000.0);
        assert_eq!(
            state.filters.bedrooms,
            vec![BedroomBucket::Exactly(2), BedroomBucket::FourPlus]
        );
        assert_eq!(
            state.filters.neighborhoods,
            vec![NeighborhoodChoice::named("Mitte")]
        );
        assert_eq!(state.filters.size_max, limits::SIZE_MAX);
    }
}
