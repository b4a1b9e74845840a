use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Mutex;

use super::domain::{AddressParts, Descriptions, MarketingType, Property, PropertyDetails, RentTerms};
use super::gateway::{ListingsGateway, UpstreamQuery};
use super::upstream::{UpstreamPage, UpstreamStatuses};
use super::ListingsError;

pub(crate) fn property(id: i64) -> Property {
    Property {
        id,
        title: format!("Listing {id}"),
        location: "Kastanienallee 12 10435 Berlin".to_string(),
        neighborhood: "Prenzlauer Berg".to_string(),
        image: String::new(),
        images: Vec::new(),
        price: 250_000.0,
        currency: "EUR".to_string(),
        beds: 2,
        baths: 1,
        sqm: 70.0,
        marketing_type: MarketingType::Buy,
        is_new: false,
        coordinates: None,
        address: AddressParts::default(),
        rent: RentTerms::default(),
        details: PropertyDetails::default(),
        descriptions: Descriptions::default(),
        archived: false,
        created_at: None,
        updated_at: None,
    }
}

#[derive(Default)]
pub(crate) struct FakeGateway {
    records: Vec<Value>,
    failure: Option<(u16, String)>,
    queries: Mutex<Vec<UpstreamQuery>>,
    status_calls: Mutex<usize>,
    lookups: Mutex<Vec<String>>,
    taxonomy: Option<Value>,
}

impl FakeGateway {
    pub(crate) fn with_records(records: Vec<Value>) -> Self {
        Self {
            records,
            ..Self::default()
        }
    }

    pub(crate) fn with_taxonomy(taxonomy: Value) -> Self {
        Self {
            taxonomy: Some(taxonomy),
            ..Self::default()
        }
    }

    pub(crate) fn failing(status: u16, body: &str) -> Self {
        Self {
            failure: Some((status, body.to_string())),
            ..Self::default()
        }
    }

    pub(crate) fn queries(&self) -> Vec<UpstreamQuery> {
        self.queries.lock().expect("query log").clone()
    }

    pub(crate) fn status_calls(&self) -> usize {
        *self.status_calls.lock().expect("status log")
    }

    pub(crate) fn lookups(&self) -> Vec<String> {
        self.lookups.lock().expect("lookup log").clone()
    }

    fn fail(&self) -> Result<(), ListingsError> {
        match &self.failure {
            Some((status, body)) => Err(ListingsError::Upstream {
                status: *status,
                body: body.clone(),
            }),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ListingsGateway for FakeGateway {
    async fn properties(&self, query: &UpstreamQuery) -> Result<UpstreamPage, ListingsError> {
        self.queries.lock().expect("query log").push(query.clone());
        self.fail()?;
        Ok(UpstreamPage {
            total: self.records.len() as u64,
            data: self.records.clone(),
        })
    }

    async fn property(&self, id: &str, _locale: &str) -> Result<Value, ListingsError> {
        self.lookups.lock().expect("lookup log").push(id.to_string());
        self.fail()?;
        self.records
            .iter()
            .find(|record| match record.get("id") {
                Some(Value::Number(number)) => number.to_string() == id,
                Some(Value::String(text)) => text == id,
                _ => false,
            })
            .cloned()
            .ok_or_else(|| ListingsError::NotFound(id.to_string()))
    }

    async fn statuses(&self) -> Result<UpstreamStatuses, ListingsError> {
        *self.status_calls.lock().expect("status log") += 1;
        self.fail()?;
        let taxonomy = self.taxonomy.clone().unwrap_or_else(|| {
            json!({
                "data": [
                    { "id": 8809, "name": "Akquise", "position": 0 },
                    { "id": 8811, "name": "In Vermarktung", "position": 2 },
                    { "id": 8813, "name": "Verkauft", "position": 4 },
                ]
            })
        });
        serde_json::from_value(taxonomy).map_err(|err| ListingsError::Decode(err.to_string()))
    }
}
