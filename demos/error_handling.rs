//! Error handling example: inspect what went wrong and what to do about it.
//!
//! This example shows how to:
//! - Match on the error variants
//! - Read the request id to quote to Duffel support
//! - Test for specific API error codes and types
//! - Tell local validation failures apart from server errors
//!
//! Run with: `DUFFEL_TOKEN=duffel_test_... cargo run --example error_handling`

use duffel::{Client, Error, ErrorCode, ErrorType};

fn report(label: &str, err: &Error) {
    println!("--- {} ---", label);
    match err {
        Error::Api(api) => {
            println!("API error, HTTP {}", api.status);
            for detail in &api.errors {
                println!("  {} / {}: {}", detail.kind, detail.code, detail.message);
            }
            println!("  Request id: {}", api.request_id());
            println!("  Safe to retry: {}", api.retryable);
        }
        Error::RateLimitExceeded { period, limit } => {
            println!("Rate limited: {} requests per {:?}", limit, period);
        }
        Error::Validation(msg) => {
            println!("Rejected locally, nothing was sent: {}", msg);
        }
        Error::DeserializationFailed {
            raw_response,
            serde_error,
            status,
        } => {
            println!("Unexpected body (status {}): {}", status, serde_error);
            println!("  Raw response: {}", raw_response);
        }
        Error::Timeout | Error::Cancelled => println!("Gave up waiting: {}", err),
        other => println!("Other error: {}", other),
    }
    println!();
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter("duffel=warn,error_handling=info")
        .init();

    let client = Client::from_env()?;

    // An unknown id: 404 with a structured envelope.
    if let Err(e) = client.get_airport("arp_does_not_exist").await {
        if e.is_code(&ErrorCode::NotFound) {
            println!("No such airport");
        }
        report("Unknown airport", &e);
    }

    // A malformed offer id never reaches the network.
    if let Err(e) = client.get_offer("orq_0000AEdGRhtp5AUUdJqMxo", None).await {
        report("Wrong id prefix", &e);
    }

    // Order errors from the airline deserve special care.
    if let Err(e) = client.get_order("ord_00009hthhsUZ8W4LxQgkjo").await {
        if e.is_type(&ErrorType::AirlineError) && !e.is_retryable() {
            println!("Airline error: contact support before booking again");
        }
        report("Order lookup", &e);
    }

    Ok(())
}
