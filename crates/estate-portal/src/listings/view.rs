//! Browse state for the listings grid, driven by a pure reducer.

use super::client::{FetchError, RequestTicket};
use super::domain::Property;
use super::filter::{
    matches, toggle, BedroomBucket, FilterCriteria, NeighborhoodChoice, TypeFilter,
};

/// Skeleton cards rendered while a fetch is in flight.
pub const LOADING_PLACEHOLDERS: usize = 4;

#[derive(Debug, Clone, PartialEq)]
pub enum LoadStatus {
    Idle,
    Loading,
    Loaded,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct BrowseState {
    pub filters: FilterCriteria,
    pub properties: Vec<Property>,
    pub status: LoadStatus,
    /// Ticket of the fetch whose response will be applied; older responses are dropped.
    pub pending: Option<RequestTicket>,
}

impl Default for BrowseState {
    fn default() -> Self {
        Self {
            filters: FilterCriteria::default(),
            properties: Vec::new(),
            status: LoadStatus::Idle,
            pending: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum BrowseAction {
    FetchStarted(RequestTicket),
    FetchSucceeded {
        ticket: RequestTicket,
        properties: Vec<Property>,
    },
    FetchFailed {
        ticket: RequestTicket,
        message: String,
    },
    SetType(TypeFilter),
    SetPriceRange { min: f64, max: f64 },
    SetSizeRange { min: f64, max: f64 },
    ToggleBedroom(BedroomBucket),
    ToggleNeighborhood(NeighborhoodChoice),
    ResetFilters,
}

impl BrowseAction {
    pub fn fetch_failed(ticket: RequestTicket, error: &FetchError) -> Self {
        BrowseAction::FetchFailed {
            ticket,
            message: error.to_string(),
        }
    }
}

/// What the grid should render for a state.
#[derive(Debug, PartialEq)]
pub enum ListingDisplay<'a> {
    Loading { placeholders: usize },
    Failed(&'a str),
    /// Fetch succeeded but nothing matches the current filters.
    Empty,
    Results(Vec<&'a Property>),
}

pub fn reduce(state: BrowseState, action: BrowseAction) -> BrowseState {
    let BrowseState {
        mut filters,
        properties,
        status,
        pending,
    } = state;

    match action {
        BrowseAction::FetchStarted(ticket) => BrowseState {
            filters,
            properties,
            status: LoadStatus::Loading,
            pending: Some(ticket),
        },
        BrowseAction::FetchSucceeded { ticket, properties: fetched } if pending == Some(ticket) => {
            BrowseState {
                filters,
                properties: fetched,
                status: LoadStatus::Loaded,
                pending: None,
            }
        }
        BrowseAction::FetchFailed { ticket, message } if pending == Some(ticket) => BrowseState {
            filters,
            properties: Vec::new(),
            status: LoadStatus::Failed(message),
            pending: None,
        },
        // Responses for superseded tickets leave the state untouched.
        BrowseAction::FetchSucceeded { .. } | BrowseAction::FetchFailed { .. } => BrowseState {
            filters,
            properties,
            status,
            pending,
        },
        filter_action => {
            apply_filter(&mut filters, filter_action);
            BrowseState {
                filters,
                properties,
                status,
                pending,
            }
        }
    }
}

fn apply_filter(filters: &mut FilterCriteria, action: BrowseAction) {
    match action {
        BrowseAction::SetType(property_type) => filters.property_type = property_type,
        BrowseAction::SetPriceRange { min, max } => {
            if let Some((min, max)) = ordered_range(min, max) {
                filters.price_min = min;
                filters.price_max = max;
            }
        }
        BrowseAction::SetSizeRange { min, max } => {
            if let Some((min, max)) = ordered_range(min, max) {
                filters.size_min = min;
                filters.size_max = max;
            }
        }
        BrowseAction::ToggleBedroom(bucket) => {
            filters.bedrooms = toggle(&filters.bedrooms, bucket, BedroomBucket::All);
        }
        BrowseAction::ToggleNeighborhood(choice) => {
            filters.neighborhoods =
                toggle(&filters.neighborhoods, choice, NeighborhoodChoice::All);
        }
        BrowseAction::ResetFilters => *filters = FilterCriteria::default(),
        BrowseAction::FetchStarted(_)
        | BrowseAction::FetchSucceeded { .. }
        | BrowseAction::FetchFailed { .. } => {}
    }
}

// Slider handles may cross; NaN input is ignored.
fn ordered_range(min: f64, max: f64) -> Option<(f64, f64)> {
    if min.is_nan() || max.is_nan() {
        return None;
    }
    Some(if min > max { (max, min) } else { (min, max) })
}

impl BrowseState {
    pub fn display(&self) -> ListingDisplay<'_> {
        match &self.status {
            LoadStatus::Idle | LoadStatus::Loading => ListingDisplay::Loading {
                placeholders: LOADING_PLACEHOLDERS,
            },
            LoadStatus::Failed(message) => ListingDisplay::Failed(message),
            LoadStatus::Loaded => {
                let visible: Vec<&Property> = self
                    .properties
                    .iter()
                    .filter(|property| matches(property, &self.filters))
                    .collect();
                if visible.is_empty() {
                    ListingDisplay::Empty
                } else {
                    ListingDisplay::Results(visible)
                }
            }
        }
    }

    /// `(shown, total)` for the "Showing X of Y" caption.
    pub fn counts(&self) -> (usize, usize) {
        let shown = self
            .properties
            .iter()
            .filter(|property| matches(property, &self.filters))
            .count();
        (shown, self.properties.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listings::client::LatestRequest;
    use crate::listings::domain::MarketingType;
    use crate::listings::test_support::property;

    fn loaded(properties: Vec<Property>) -> BrowseState {
        let guard = LatestRequest::new();
        let ticket = guard.begin();
        let state = reduce(BrowseState::default(), BrowseAction::FetchStarted(ticket));
        reduce(
            state,
            BrowseAction::FetchSucceeded { ticket, properties },
        )
    }

    #[test]
    fn fresh_state_shows_placeholders() {
        let state = BrowseState::default();
        assert_eq!(
            state.display(),
            ListingDisplay::Loading {
                placeholders: LOADING_PLACEHOLDERS
            }
        );
    }

    #[test]
    fn stale_response_is_ignored() {
        let guard = LatestRequest::new();
        let first = guard.begin();
        let second = guard.begin();

        let state = reduce(BrowseState::default(), BrowseAction::FetchStarted(first));
        let state = reduce(state, BrowseAction::FetchStarted(second));
        let state = reduce(
            state,
            BrowseAction::FetchSucceeded {
                ticket: second,
                properties: vec![property(2)],
            },
        );
        let state = reduce(
            state,
            BrowseAction::FetchSucceeded {
                ticket: first,
                properties: vec![property(1)],
            },
        );

        assert_eq!(state.status, LoadStatus::Loaded);
        assert_eq!(state.properties.len(), 1);
        assert_eq!(state.properties[0].id, 2);
    }

    #[test]
    fn failure_is_distinct_from_no_matches() {
        let guard = LatestRequest::new();
        let ticket = guard.begin();
        let error = FetchError::Status {
            status: 503,
            body: "maintenance".to_string(),
        };
        let state = reduce(BrowseState::default(), BrowseAction::FetchStarted(ticket));
        let failed = reduce(state, BrowseAction::fetch_failed(ticket, &error));

        match failed.display() {
            ListingDisplay::Failed(message) => assert!(message.contains("503")),
            other => panic!("expected failure, got {other:?}"),
        }

        let empty = reduce(
            loaded(vec![property(1)]),
            BrowseAction::SetType(TypeFilter::Rent),
        );
        assert_eq!(empty.display(), ListingDisplay::Empty);
    }

    #[test]
    fn filters_apply_to_loaded_listings() {
        let rental = Property {
            marketing_type: MarketingType::Rent,
            price: 1_400.0,
            ..property(2)
        };
        let state = loaded(vec![property(1), rental]);
        let state = reduce(state, BrowseAction::SetType(TypeFilter::Rent));

        match state.display() {
            ListingDisplay::Results(visible) => {
                assert_eq!(visible.len(), 1);
                assert_eq!(visible[0].id, 2);
            }
            other => panic!("expected results, got {other:?}"),
        }
        assert_eq!(state.counts(), (1, 2));
    }

    #[test]
    fn crossed_ranges_are_reordered() {
        let state = reduce(
            BrowseState::default(),
            BrowseAction::SetPriceRange {
                min: 500_000.0,
                max: 100_000.0,
            },
        );
        assert_eq!(state.filters.price_min, 100_000.0);
        assert_eq!(state.filters.price_max, 500_000.0);

        let state = reduce(
            state,
            BrowseAction::SetSizeRange {
                min: f64::NAN,
                max: 50.0,
            },
        );
        assert_eq!(state.filters.size_max, 200.0);
    }

    #[test]
    fn toggles_and_reset_restore_defaults() {
        let state = reduce(
            BrowseState::default(),
            BrowseAction::ToggleBedroom(BedroomBucket::Exactly(2)),
        );
        assert_eq!(state.filters.bedrooms, vec![BedroomBucket::Exactly(2)]);

        let state = reduce(
            state,
            BrowseAction::ToggleNeighborhood(NeighborhoodChoice::named("Mitte")),
        );
        let state = reduce(
            state,
            BrowseAction::ToggleNeighborhood(NeighborhoodChoice::named("Mitte")),
        );
        assert_eq!(state.filters.neighborhoods, vec![NeighborhoodChoice::All]);

        let state = reduce(state, BrowseAction::ResetFilters);
        assert_eq!(state.filters, FilterCriteria::default());
    }
}
