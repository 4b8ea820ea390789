//! Basic example: fetch single resources and a place search.
//!
//! This example shows how to:
//! - Create a client from the `DUFFEL_TOKEN` environment variable
//! - Fetch a single resource by id
//! - Read the request id and the quota the server reported
//!
//! Run with: `DUFFEL_TOKEN=duffel_test_... cargo run --example basic_call`

use duffel::{Client, Error};

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter("duffel=debug,basic_call=info")
        .init();

    let client = Client::from_env()?;

    println!("=== Single resource ===");
    let airline = client.get_airline("arl_00001876aqC8c5umZmrRds").await?;
    println!("Airline: {} ({:?})", airline.name, airline.iata_code);
    println!("Request id: {:?}", client.last_request_id());
    println!();

    println!("=== Place suggestions ===");
    for place in client.place_suggestions("london").await? {
        println!("{:?} {} {}", place.kind, place.iata_code, place.name);
    }
    println!();

    if let Some(rate_limit) = client.rate_limit() {
        println!(
            "Quota: {}/{} left, window {:?}",
            rate_limit.remaining, rate_limit.limit, rate_limit.period
        );
    }

    Ok(())
}
