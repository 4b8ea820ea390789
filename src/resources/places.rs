use super::airports::{Airport, City};
use crate::{Client, Result};
use serde::{Deserialize, Serialize};

/// An airport or a city, as returned by place suggestions and used as the origin or
/// destination of slices and segments.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Place {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: PlaceType,
    pub name: String,
    pub iata_code: String,
    pub icao_code: Option<String>,
    pub iata_city_code: Option<String>,
    pub iata_country_code: Option<String>,
    pub city_name: Option<String>,
    pub country_name: Option<String>,
    pub time_zone: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub city: Option<City>,
    /// Airports of a city. Empty for airports.
    pub airports: Vec<Airport>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaceType {
    #[default]
    Airport,
    City,
    #[serde(other)]
    Other,
}

impl Client {
    /// Suggests airports and cities matching a free-text query.
    ///
    /// ```no_run
    /// # async fn example(client: duffel::Client) -> Result<(), duffel::Error> {
    /// for place in client.place_suggestions("heathrow").await? {
    ///     println!("{} ({})", place.name, place.iata_code);
    /// }
    /// # Ok(())
    /// # }
    /// ```
    pub async fn place_suggestions(&self, query: &str) -> Result<Vec<Place>> {
        self.request::<(), Place>()
            .get("/places/suggestions")
            .param("query", query)
            .slice()
            .await
    }
}
