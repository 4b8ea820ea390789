//! Integration tests using wiremock to simulate the Duffel API.

use duffel::retry::RetryOnRetryable;
use duffel::{
    Airline, Airport, Client, Error, ErrorCode, ErrorType, ListAirportsParams, RateLimitConfig,
    RetryPolicy,
};
use flate2::write::GzEncoder;
use flate2::Compression;
use serde_json::json;
use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{body_json, header, method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

const REQUEST_ID: &str = "FZW0H3HdJwKk5HMAAKxB";

/// Adds the quota headers every successful Duffel response carries.
fn quota(template: ResponseTemplate, remaining: u32) -> ResponseTemplate {
    let now = SystemTime::now();
    template
        .insert_header("Ratelimit-Limit", "300")
        .insert_header("Ratelimit-Remaining", remaining.to_string().as_str())
        .insert_header(
            "Ratelimit-Reset",
            httpdate::fmt_http_date(now + Duration::from_secs(1)).as_str(),
        )
        .insert_header("Date", httpdate::fmt_http_date(now).as_str())
        .insert_header("x-request-id", REQUEST_ID)
}

fn ok(body: serde_json::Value) -> ResponseTemplate {
    quota(ResponseTemplate::new(200).set_body_json(body), 299)
}

fn error_envelope(status: u16, kind: &str, code: &str, message: &str) -> ResponseTemplate {
    ResponseTemplate::new(status).set_body_json(json!({
        "meta": {"status": status, "request_id": REQUEST_ID},
        "errors": [{
            "type": kind,
            "title": "Error",
            "message": message,
            "documentation_url": "https://duffel.com/docs/api/overview/errors",
            "code": code
        }]
    }))
}

fn client(server: &MockServer) -> Client {
    Client::builder()
        .api_token("duffel_test_123")
        .base_url(server.uri())
        .unwrap()
        .build()
        .unwrap()
}

fn airline(id: &str, name: &str) -> serde_json::Value {
    json!({"id": id, "name": name, "iata_code": "BA"})
}

#[tokio::test]
async fn test_single_result_round_trip() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/air/airlines/arl_00001876aqC8c5umZmrRds"))
        .and(header("Authorization", "Bearer duffel_test_123"))
        .and(header("Duffel-Version", "beta"))
        .and(header("Accept", "application/json"))
        .and(header("Content-Type", "application/json"))
        .and(header("Accept-Encoding", "gzip"))
        .respond_with(ok(json!({
            "data": airline("arl_00001876aqC8c5umZmrRds", "British Airways")
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client(&mock_server);
    let found = client
        .get_airline("arl_00001876aqC8c5umZmrRds")
        .await
        .unwrap();

    assert_eq!(
        found,
        Airline {
            id: "arl_00001876aqC8c5umZmrRds".to_string(),
            name: "British Airways".to_string(),
            iata_code: Some("BA".to_string()),
            logo_symbol_url: None,
            logo_lockup_url: None,
        }
    );
    assert_eq!(client.last_request_id().as_deref(), Some(REQUEST_ID));

    let rate_limit = client.rate_limit().unwrap();
    assert_eq!(rate_limit.limit, 300);
    assert_eq!(rate_limit.remaining, 299);
    assert_eq!(rate_limit.period, Duration::from_secs(1));
}

#[tokio::test]
async fn test_pagination_follows_cursor() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/air/airports"))
        .and(query_param("iata_country_code", "GB"))
        .and(query_param_is_missing("after"))
        .respond_with(ok(json!({
            "data": [
                {"id": "arp_lhr_gb", "name": "Heathrow", "iata_code": "LHR"},
                {"id": "arp_lgw_gb", "name": "Gatwick", "iata_code": "LGW"}
            ],
            "meta": {"after": "CURSOR1", "before": null, "limit": 2}
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/air/airports"))
        .and(query_param("iata_country_code", "GB"))
        .and(query_param("after", "CURSOR1"))
        .and(query_param("limit", "2"))
        .respond_with(ok(json!({
            "data": [{"id": "arp_stn_gb", "name": "Stansted", "iata_code": "STN"}],
            "meta": {"after": null, "before": "CURSOR0", "limit": 2}
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client(&mock_server);
    let mut airports = client
        .list_airports(Some(ListAirportsParams {
            iata_country_code: Some("GB".to_string()),
        }))
        .await;

    let mut codes = Vec::new();
    while airports.advance().await {
        codes.push(airports.current().unwrap().iata_code.clone());
    }

    assert!(airports.err().is_none());
    assert_eq!(codes, vec!["LHR", "LGW", "STN"]);
    assert!(!airports.advance().await);
}

#[tokio::test]
async fn test_iterator_stops_at_failed_page() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/air/airlines"))
        .and(query_param_is_missing("after"))
        .respond_with(ok(json!({
            "data": [airline("arl_1", "One")],
            "meta": {"after": "CURSOR1"}
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/air/airlines"))
        .and(query_param("after", "CURSOR1"))
        .respond_with(error_envelope(
            500,
            "api_error",
            "internal_server_error",
            "Something went wrong",
        ))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client(&mock_server);
    let mut airlines = client.list_airlines().await;

    assert!(airlines.advance().await);
    assert_eq!(airlines.current().unwrap().name, "One");
    assert!(!airlines.advance().await);
    assert!(!airlines.advance().await);

    let err = airlines.err().unwrap();
    assert_eq!(err.status().map(|s| s.as_u16()), Some(500));
    assert_eq!(err.request_id(), Some(REQUEST_ID));
}

#[tokio::test]
async fn test_remaining_zero_fails_even_on_success() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/air/aircraft/arc_00009UhD4ongolulWd91Ky"))
        .respond_with(quota(
            ResponseTemplate::new(200).set_body_json(json!({
                "data": {"id": "arc_00009UhD4ongolulWd91Ky", "name": "Airbus A380", "iata_code": "380"}
            })),
            0,
        ))
        .mount(&mock_server)
        .await;

    let result = client(&mock_server)
        .get_aircraft("arc_00009UhD4ongolulWd91Ky")
        .await;

    match result {
        Err(Error::RateLimitExceeded { period, limit }) => {
            assert_eq!(limit, 300);
            assert_eq!(period, Duration::from_secs(1));
        }
        other => panic!("Expected RateLimitExceeded, got {:?}", other),
    }
}

#[tokio::test]
async fn test_too_many_requests() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/air/aircraft"))
        .respond_with(quota(
            error_envelope(429, "rate_limit_error", "rate_limit_exceeded", "Slow down"),
            0,
        ))
        .mount(&mock_server)
        .await;

    let mut aircraft = client(&mock_server).list_aircraft().await;
    assert!(!aircraft.advance().await);
    assert!(matches!(
        aircraft.err(),
        Some(Error::RateLimitExceeded { limit: 300, .. })
    ));
}

#[tokio::test]
async fn test_error_envelopes_are_preserved() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/air/airports/arp_bad"))
        .respond_with(error_envelope(
            400,
            "validation_error",
            "invalid_data_param",
            "The airport id is invalid",
        ))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/air/airports/arp_xxx_gb"))
        .respond_with(error_envelope(
            404,
            "invalid_request_error",
            "not_found",
            "The resource you are trying to access does not exist",
        ))
        .mount(&mock_server)
        .await;

    let client = client(&mock_server);

    let err = client.get_airport("arp_bad").await.unwrap_err();
    let api = err.api_error().unwrap();
    assert_eq!(api.status.as_u16(), 400);
    assert_eq!(api.request_id(), REQUEST_ID);
    assert_eq!(api.errors[0].kind, ErrorType::ValidationError);
    assert_eq!(api.errors[0].code, ErrorCode::InvalidDataParam);
    assert_eq!(
        api.errors[0].documentation_url,
        "https://duffel.com/docs/api/overview/errors"
    );
    assert!(!err.is_retryable());
    assert_eq!(err.to_string(), "duffel: The airport id is invalid");

    let err = client.get_airport("arp_xxx_gb").await.unwrap_err();
    assert!(err.is_code(&ErrorCode::NotFound));
    assert!(err.is_type(&ErrorType::InvalidRequestError));
    assert_eq!(err.request_id(), Some(REQUEST_ID));
}

#[tokio::test]
async fn test_server_errors_retryable_except_on_orders() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/air/orders/ord_00009hthhsUZ8W4LxQgkjo"))
        .respond_with(error_envelope(
            500,
            "airline_error",
            "airline_internal",
            "The airline responded with an internal error",
        ))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/air/airports/arp_lhr_gb"))
        .respond_with(error_envelope(
            500,
            "api_error",
            "internal_server_error",
            "Something went wrong",
        ))
        .mount(&mock_server)
        .await;

    let client = client(&mock_server);

    let err = client
        .get_order("ord_00009hthhsUZ8W4LxQgkjo")
        .await
        .unwrap_err();
    assert!(!err.api_error().unwrap().retryable);

    let err = client.get_airport("arp_lhr_gb").await.unwrap_err();
    assert!(err.api_error().unwrap().retryable);
}

#[tokio::test]
async fn test_html_error_page() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/air/airlines/arl_1"))
        .respond_with(
            ResponseTemplate::new(502)
                .set_body_raw("<html><body>502 Bad Gateway</body></html>", "text/html")
                .insert_header("x-request-id", REQUEST_ID),
        )
        .mount(&mock_server)
        .await;

    let err = client(&mock_server).get_airline("arl_1").await.unwrap_err();

    let api = err.api_error().unwrap();
    assert!(api.retryable);
    assert_eq!(api.status.as_u16(), 502);
    assert!(api.is_code(&ErrorCode::InternalServerError));
    assert_eq!(api.request_id(), REQUEST_ID);
}

#[tokio::test]
async fn test_gzip_body_is_inflated() {
    let mock_server = MockServer::start().await;

    let body = json!({"data": [airline("arl_1", "One"), airline("arl_2", "Two")], "meta": {}});
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(body.to_string().as_bytes()).unwrap();
    let compressed = encoder.finish().unwrap();

    Mock::given(method("GET"))
        .and(path("/air/airlines"))
        .respond_with(quota(
            ResponseTemplate::new(200)
                .set_body_raw(compressed, "application/json")
                .insert_header("Content-Encoding", "gzip"),
            299,
        ))
        .mount(&mock_server)
        .await;

    let names: Vec<String> = client(&mock_server)
        .list_airlines()
        .await
        .collect()
        .await
        .unwrap()
        .into_iter()
        .map(|a| a.name)
        .collect();

    assert_eq!(names, vec!["One", "Two"]);
}

#[tokio::test]
async fn test_malformed_json_is_a_decode_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/air/airlines/arl_1"))
        .respond_with(quota(
            ResponseTemplate::new(200).set_body_string("this is not json"),
            299,
        ))
        .mount(&mock_server)
        .await;

    let err = client(&mock_server).get_airline("arl_1").await.unwrap_err();

    match err {
        Error::DeserializationFailed {
            raw_response,
            status,
            ..
        } => {
            assert_eq!(raw_response, "this is not json");
            assert_eq!(status.as_u16(), 200);
        }
        other => panic!("Expected DeserializationFailed, got {:?}", other),
    }
}

#[tokio::test]
async fn test_missing_token_sends_nothing() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ok(json!({"data": []})))
        .expect(0)
        .mount(&mock_server)
        .await;

    let client = Client::builder()
        .base_url(mock_server.uri())
        .unwrap()
        .build()
        .unwrap();

    assert!(matches!(
        client.get_airline("arl_1").await,
        Err(Error::MissingCredential)
    ));
}

#[tokio::test]
async fn test_missing_quota_headers_fail_the_call() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/air/airlines/arl_1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": airline("arl_1", "One")
        })))
        .mount(&mock_server)
        .await;

    assert!(matches!(
        client(&mock_server).get_airline("arl_1").await,
        Err(Error::InvalidRateLimit(_))
    ));
}

#[tokio::test]
async fn test_retry_recovers_after_server_errors() {
    let mock_server = MockServer::start().await;
    let attempts = Arc::new(AtomicUsize::new(0));
    let counter = attempts.clone();

    Mock::given(method("GET"))
        .and(path("/air/airlines/arl_1"))
        .respond_with(move |_req: &Request| {
            if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                error_envelope(503, "api_error", "internal_server_error", "Unavailable")
            } else {
                ok(json!({"data": airline("arl_1", "One")}))
            }
        })
        .mount(&mock_server)
        .await;

    let client = Client::builder()
        .api_token("duffel_test_123")
        .base_url(mock_server.uri())
        .unwrap()
        .retry_policy(
            RetryPolicy::new(3, Duration::from_millis(1), Duration::from_millis(10))
                .condition(RetryOnRetryable),
        )
        .build()
        .unwrap();

    let found = client.get_airline("arl_1").await.unwrap();
    assert_eq!(found.name, "One");
    assert_eq!(attempts.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_exhausted_retries_return_last_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/air/airlines/arl_1"))
        .respond_with(error_envelope(
            503,
            "api_error",
            "internal_server_error",
            "Unavailable",
        ))
        .expect(3)
        .mount(&mock_server)
        .await;

    let client = Client::builder()
        .api_token("duffel_test_123")
        .base_url(mock_server.uri())
        .unwrap()
        .retry_policy(
            RetryPolicy::new(2, Duration::from_millis(1), Duration::from_millis(10))
                .condition(RetryOnRetryable),
        )
        .build()
        .unwrap();

    let err = client.get_airline("arl_1").await.unwrap_err();
    assert_eq!(err.status().map(|s| s.as_u16()), Some(503));
    assert_eq!(err.to_string(), "duffel: Unavailable");
}

#[tokio::test]
async fn test_order_creation_500_is_not_retried() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/air/orders"))
        .respond_with(error_envelope(
            500,
            "airline_error",
            "airline_unknown",
            "The airline responded with an unexpected error",
        ))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = Client::builder()
        .api_token("duffel_test_123")
        .base_url(mock_server.uri())
        .unwrap()
        .retry_policy(
            RetryPolicy::new(3, Duration::from_millis(1), Duration::from_millis(10))
                .condition(RetryOnRetryable),
        )
        .build()
        .unwrap();

    let err = client
        .create_order(duffel::CreateOrderInput {
            selected_offers: vec!["off_00009htYpSCXrwaB9DnUm0".to_string()],
            ..Default::default()
        })
        .await
        .unwrap_err();

    assert!(err.is_code(&ErrorCode::AirlineUnknown));
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn test_request_body_is_wrapped_in_data() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/air/payments"))
        .and(body_json(json!({
            "data": {
                "order_id": "ord_00009hthhsUZ8W4LxQgkjo",
                "payment": {"type": "balance", "amount": "30.20", "currency": "GBP"}
            }
        })))
        .respond_with(ok(json!({
            "data": {
                "id": "pay_00009hthhsUZ8W4LxQgkjo",
                "amount": "30.20",
                "currency": "GBP",
                "type": "balance",
                "created_at": "2020-04-11T15:48:11.642Z",
                "live_mode": false
            }
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let payment = client(&mock_server)
        .create_payment(duffel::CreatePaymentRequest {
            order_id: "ord_00009hthhsUZ8W4LxQgkjo".to_string(),
            payment: duffel::PaymentInput {
                kind: duffel::PaymentType::Balance,
                amount: "30.20".to_string(),
                currency: "GBP".to_string(),
            },
        })
        .await
        .unwrap();

    assert_eq!(payment.id, "pay_00009hthhsUZ8W4LxQgkjo");
    assert_eq!(payment.amount, "30.20");
}

#[tokio::test]
async fn test_cancellation_abandons_the_call() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/air/airlines/arl_1"))
        .respond_with(
            ok(json!({"data": airline("arl_1", "One")})).set_delay(Duration::from_secs(5)),
        )
        .mount(&mock_server)
        .await;

    let token = CancellationToken::new();
    let trigger = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.cancel();
    });

    let started = std::time::Instant::now();
    let result = client(&mock_server)
        .request::<(), Airline>()
        .get("/air/airlines/arl_1")
        .cancel_on(token)
        .one()
        .await;

    assert!(matches!(result, Err(Error::Cancelled)));
    assert!(started.elapsed() < Duration::from_secs(5));
}

/// Cancels `token` shortly after the call starts.
fn cancel_soon(token: &CancellationToken) {
    let trigger = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        trigger.cancel();
    });
}

#[tokio::test]
async fn test_cancellation_while_waiting_for_a_token() {
    let mock_server = MockServer::start().await;

    // Error responses carry no quota, so the initial bucket stays in force.
    Mock::given(method("GET"))
        .and(path("/air/airlines/arl_missing"))
        .respond_with(error_envelope(404, "invalid_request_error", "not_found", "Not found"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = Client::builder()
        .api_token("duffel_test_123")
        .base_url(mock_server.uri())
        .unwrap()
        .rate_limit_config(
            RateLimitConfig::builder()
                .burst(1)
                .interval(Duration::from_secs(60))
                .build(),
        )
        .build()
        .unwrap();

    assert!(client.get_airline("arl_missing").await.is_err());

    let token = CancellationToken::new();
    cancel_soon(&token);

    let started = std::time::Instant::now();
    let result = client
        .request::<(), Airline>()
        .get("/air/airlines/arl_missing")
        .cancel_on(token)
        .one()
        .await;

    assert!(matches!(result, Err(Error::Cancelled)));
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[tokio::test]
async fn test_cancellation_during_backoff() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/air/airlines/arl_1"))
        .respond_with(quota(
            error_envelope(503, "api_error", "internal_server_error", "Unavailable"),
            299,
        ))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = Client::builder()
        .api_token("duffel_test_123")
        .base_url(mock_server.uri())
        .unwrap()
        .retry_policy(
            RetryPolicy::new(3, Duration::from_secs(30), Duration::from_secs(60))
                .condition(RetryOnRetryable),
        )
        .build()
        .unwrap();

    let token = CancellationToken::new();
    cancel_soon(&token);

    let started = std::time::Instant::now();
    let result = client
        .request::<(), Airline>()
        .get("/air/airlines/arl_1")
        .cancel_on(token)
        .one()
        .await;

    assert!(matches!(result, Err(Error::Cancelled)));
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[tokio::test]
async fn test_deadline_bounds_the_call() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/air/airlines/arl_1"))
        .respond_with(
            ok(json!({"data": airline("arl_1", "One")})).set_delay(Duration::from_secs(5)),
        )
        .mount(&mock_server)
        .await;

    let result = client(&mock_server)
        .request::<(), Airline>()
        .get("/air/airlines/arl_1")
        .deadline(Duration::from_millis(100))
        .one()
        .await;

    assert!(matches!(result, Err(Error::Timeout)));
}

#[tokio::test]
async fn test_debug_mode_disables_compression() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/air/airlines/arl_1"))
        .and(|req: &Request| !req.headers.contains_key("accept-encoding"))
        .respond_with(ok(json!({"data": airline("arl_1", "One")})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = Client::builder()
        .api_token("duffel_test_123")
        .base_url(mock_server.uri())
        .unwrap()
        .debug(true)
        .build()
        .unwrap();

    assert_eq!(client.get_airline("arl_1").await.unwrap().name, "One");
}

#[tokio::test]
async fn test_hooks_and_params_reach_the_wire() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/air/airports"))
        .and(query_param("iata_country_code", "US"))
        .and(header("x-trace", "abc"))
        .respond_with(ok(json!({
            "data": [{"id": "arp_jfk_us", "name": "John F. Kennedy", "iata_code": "JFK"}]
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let airports: Vec<Airport> = client(&mock_server)
        .request::<(), Airport>()
        .get("/air/airports")
        .param("iata_country_code", "US")
        .hook(|req: &mut reqwest::Request| {
            req.headers_mut()
                .insert("x-trace", http::HeaderValue::from_static("abc"));
            Ok(())
        })
        .all()
        .await
        .collect()
        .await
        .unwrap();

    assert_eq!(airports.len(), 1);
    assert_eq!(airports[0].iata_code, "JFK");
}
