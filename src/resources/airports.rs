use crate::metadata::{ParamEncoder, QueryParams};
use crate::{Client, Iter, Result};
use serde::{Deserialize, Serialize};

/// An airport.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Airport {
    pub id: String,
    pub name: String,
    pub iata_code: String,
    pub icao_code: Option<String>,
    pub iata_country_code: String,
    pub city_name: Option<String>,
    pub city: Option<City>,
    pub latitude: f64,
    pub longitude: f64,
    /// IANA time zone name, e.g. `Europe/London`.
    pub time_zone: String,
}

/// A metropolitan area served by one or more airports.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct City {
    pub id: String,
    pub name: String,
    pub iata_code: String,
    pub iata_country_code: Option<String>,
}

/// Filters for [`Client::list_airports`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListAirportsParams {
    /// ISO 3166-1 alpha-2 country code.
    pub iata_country_code: Option<String>,
}

impl ParamEncoder for ListAirportsParams {
    fn encode(&self, params: &mut QueryParams) -> Result<()> {
        if let Some(code) = self.iata_country_code.as_deref().filter(|c| !c.is_empty()) {
            params.set("iata_country_code", code);
        }
        Ok(())
    }
}

impl Client {
    /// Lists airports, optionally restricted to one country.
    pub async fn list_airports(&self, params: Option<ListAirportsParams>) -> Iter<Airport> {
        self.request::<(), Airport>()
            .get("/air/airports")
            .params(params)
            .all()
            .await
    }

    /// Gets one airport by id.
    pub async fn get_airport(&self, id: &str) -> Result<Airport> {
        self.request::<(), Airport>()
            .get(format!("/air/airports/{}", id))
            .one()
            .await
    }
}
