use crate::{Client, Iter, Result};
use serde::{Deserialize, Serialize};

/// An airline, as owner or carrier of a flight.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Airline {
    pub id: String,
    pub name: String,
    pub iata_code: Option<String>,
    pub logo_symbol_url: Option<String>,
    pub logo_lockup_url: Option<String>,
}

impl Client {
    /// Lists every airline Duffel knows about.
    pub async fn list_airlines(&self) -> Iter<Airline> {
        self.request::<(), Airline>()
            .get("/air/airlines")
            .all()
            .await
    }

    /// Gets one airline by id.
    pub async fn get_airline(&self, id: &str) -> Result<Airline> {
        self.request::<(), Airline>()
            .get(format!("/air/airlines/{}", id))
            .one()
            .await
    }
}
