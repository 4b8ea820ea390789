//! Retry example: configure backoff around transient failures.
//!
//! This example shows how to:
//! - Retry anything the API marks as retryable
//! - Combine predicates, including closures
//! - Use a constant wait instead of exponential backoff
//! - Bound calls with a deadline and a cancellation token
//!
//! Run with: `DUFFEL_TOKEN=duffel_test_... cargo run --example retry_strategies`

use duffel::retry::{
    constant_backoff, AndPredicate, RetryOnConnectionError, RetryOnRateLimit, RetryOnRetryable,
    RetryOnTimeout,
};
use duffel::{Aircraft, Client, Error, RetryPolicy};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter("duffel=info,retry_strategies=info")
        .init();

    let token = std::env::var("DUFFEL_TOKEN").unwrap_or_default();

    println!("=== Exponential backoff on retryable errors ===");
    let client = Client::builder()
        .api_token(&token)
        .retry_policy(
            RetryPolicy::new(3, Duration::from_millis(200), Duration::from_secs(5))
                .condition(RetryOnRetryable)
                .condition(RetryOnTimeout)
                .condition(RetryOnConnectionError),
        )
        .build()?;

    match client.list_airlines().await.collect().await {
        Ok(airlines) => println!("Fetched {} airlines", airlines.len()),
        Err(e) => println!("Failed after retries: {}", e),
    }
    println!();

    println!("=== Constant wait, only while quota resets ===");
    let client = Client::builder()
        .api_token(&token)
        .retry_policy(
            RetryPolicy::new(5, Duration::from_secs(1), Duration::from_secs(1))
                .wait_fn(constant_backoff)
                .condition(AndPredicate::new(vec![
                    Box::new(RetryOnRateLimit),
                    Box::new(|_: &Error, attempt: usize| attempt <= 3),
                ])),
        )
        .build()?;

    match client.get_aircraft("arc_00009UhD4ongolulWd91Ky").await {
        Ok(aircraft) => println!("{} {}", aircraft.iata_code, aircraft.name),
        Err(e) => println!("Failed: {}", e),
    }
    println!();

    println!("=== Deadline and cancellation ===");
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(2)).await;
        trigger.cancel();
    });

    let result = client
        .request::<(), Aircraft>()
        .get("/air/aircraft")
        .deadline(Duration::from_secs(10))
        .cancel_on(cancel)
        .all()
        .await
        .collect()
        .await;

    match result {
        Ok(aircraft) => println!("Fetched {} aircraft", aircraft.len()),
        Err(Error::Cancelled) => println!("Cancelled before the listing finished"),
        Err(e) => println!("Failed: {}", e),
    }

    Ok(())
}
