//! Pagination example: walk every airport of a country.
//!
//! This example shows how to:
//! - Pass filters to a list endpoint
//! - Drive the iterator with `advance` / `current`
//! - Check the terminal error once the loop ends
//! - Consume a list as a `futures::Stream`
//!
//! Run with: `DUFFEL_TOKEN=duffel_test_... cargo run --example list_airports -- GB`

use duffel::{Client, Error, ListAirportsParams};
use futures::StreamExt;

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter("duffel=info,list_airports=info")
        .init();

    let country = std::env::args().nth(1).unwrap_or_else(|| "GB".to_string());
    let client = Client::from_env()?;

    let mut airports = client
        .list_airports(Some(ListAirportsParams {
            iata_country_code: Some(country.clone()),
        }))
        .await;

    let mut count = 0;
    while airports.advance().await {
        if let Some(airport) = airports.current() {
            count += 1;
            println!("{:>4} {} ({})", airport.iata_code, airport.name, airport.time_zone);
        }
    }

    // Iteration never fails loudly; the error, if any, is here.
    if let Some(err) = airports.err() {
        eprintln!("Stopped after {} airports: {}", count, err);
        return Ok(());
    }
    println!("{} airports in {}", count, country);

    println!();
    println!("=== Aircraft as a stream ===");
    let mut stream = Box::pin(client.list_aircraft().await.into_stream());
    while let Some(item) = stream.next().await {
        match item {
            Ok(aircraft) => println!("{} {}", aircraft.iata_code, aircraft.name),
            Err(e) => eprintln!("Stream ended with error: {}", e),
        }
    }

    Ok(())
}
