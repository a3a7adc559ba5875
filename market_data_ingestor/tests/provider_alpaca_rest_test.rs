use chrono::{NaiveDate, TimeZone, Utc};
use market_data_ingestor::{
    models::{request_params::BarsRequestParams, timeframe::TimeFrame},
    providers::{
        DataProvider, ProviderError, TradingCalendar,
        alpaca_rest::{AlpacaConfig, AlpacaProvider},
    },
};
use serial_test::serial;
use serde_json::json;
use shared_utils::config::Credentials;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{header, method, path, query_param, query_param_is_missing},
};

fn provider(server: &MockServer) -> AlpacaProvider {
    let credentials = Credentials::new("test-key", "test-secret");
    let config = AlpacaConfig {
        data_base_url: server.uri(),
        trading_base_url: server.uri(),
        max_retries: 2,
        base_delay_ms: 1,
        ..AlpacaConfig::default()
    };
    AlpacaProvider::with_config(&credentials, config).unwrap()
}

fn request() -> BarsRequestParams {
    BarsRequestParams::single(
        "SPY",
        TimeFrame::minutes(30),
        Utc.with_ymd_and_hms(2024, 1, 2, 14, 30, 0).unwrap(),
        Utc.with_ymd_and_hms(2024, 1, 3, 21, 0, 0).unwrap(),
    )
}

fn bar(t: &str, o: f64, c: f64) -> serde_json::Value {
    json!({"t": t, "o": o, "h": o.max(c) + 0.1, "l": o.min(c) - 0.1, "c": c, "v": 1000, "n": 10, "vw": (o + c) / 2.0})
}

#[tokio::test]
async fn follows_page_tokens_and_merges_pages() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v2/stocks/bars"))
        .and(header("APCA-API-KEY-ID", "test-key"))
        .and(header("APCA-API-SECRET-KEY", "test-secret"))
        .and(query_param("symbols", "SPY"))
        .and(query_param("timeframe", "30Min"))
        .and(query_param("feed", "sip"))
        .and(query_param_is_missing("page_token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "bars": {"SPY": [bar("2024-01-02T14:30:00Z", 472.0, 472.5)]},
            "next_page_token": "page-2"
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v2/stocks/bars"))
        .and(query_param("page_token", "page-2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "bars": {"SPY": [
                bar("2024-01-02T15:00:00Z", 472.5, 473.0),
                bar("2024-01-02T15:30:00Z", 473.0, 472.8)
            ]},
            "next_page_token": null
        })))
        .expect(1)
        .mount(&server)
        .await;

    let series = provider(&server).fetch_bars(request()).await.unwrap();

    assert_eq!(series.len(), 1);
    assert_eq!(series[0].symbol, "SPY");
    assert_eq!(series[0].timeframe, TimeFrame::minutes(30));
    let closes: Vec<f64> = series[0].bars.iter().map(|b| b.close).collect();
    assert_eq!(closes, vec![472.5, 473.0, 472.8]);
}

#[tokio::test]
async fn later_page_without_bars_ends_pagination() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v2/stocks/bars"))
        .and(query_param_is_missing("page_token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "bars": {"SPY": [
                bar("2024-01-02T14:30:00Z", 472.0, 472.5),
                bar("2024-01-02T15:00:00Z", 472.5, 473.0)
            ]},
            "next_page_token": "page-2"
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v2/stocks/bars"))
        .and(query_param("page_token", "page-2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "bars": {},
            "next_page_token": "page-3"
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v2/stocks/bars"))
        .and(query_param("page_token", "page-3"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let series = provider(&server).fetch_bars(request()).await.unwrap();

    assert_eq!(series.len(), 1);
    let closes: Vec<f64> = series[0].bars.iter().map(|b| b.close).collect();
    assert_eq!(closes, vec![472.5, 473.0]);
}

#[tokio::test]
async fn non_success_status_carries_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2/stocks/bars"))
        .respond_with(ResponseTemplate::new(403).set_body_string("forbidden"))
        .mount(&server)
        .await;

    let err = provider(&server).fetch_bars(request()).await.unwrap_err();
    assert!(matches!(err, ProviderError::Api { status: 403, .. }));
    assert_eq!(err.to_string(), "API request failed with status 403: forbidden");
}

#[tokio::test]
async fn empty_first_page_is_no_data() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2/stocks/bars"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"bars": {}, "next_page_token": null})),
        )
        .mount(&server)
        .await;

    let err = provider(&server).fetch_bars(request()).await.unwrap_err();
    assert_eq!(err.to_string(), "No bar data available for SPY");
}

#[tokio::test]
async fn retries_after_rate_limit() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2/stocks/bars"))
        .respond_with(ResponseTemplate::new(429).set_body_string("slow down"))
        .up_to_n_times(1)
        .with_priority(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v2/stocks/bars"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "bars": {"SPY": [bar("2024-01-02T14:30:00Z", 472.0, 472.5)]}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let series = provider(&server).fetch_bars(request()).await.unwrap();
    assert_eq!(series[0].bars.len(), 1);
}

#[tokio::test]
async fn gives_up_after_max_retries() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2/stocks/bars"))
        .respond_with(ResponseTemplate::new(503).set_body_string("unavailable"))
        // first attempt plus two retries
        .expect(3)
        .mount(&server)
        .await;

    let err = provider(&server).fetch_bars(request()).await.unwrap_err();
    assert!(matches!(err, ProviderError::Api { status: 503, .. }));
}

#[tokio::test]
async fn reads_trading_calendar() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2/calendar"))
        .and(query_param("start", "2024-11-27"))
        .and(query_param("end", "2024-11-29"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"date": "2024-11-27", "open": "09:30", "close": "16:00", "session_open": "0400", "session_close": "2000"},
            {"date": "2024-11-29", "open": "09:30", "close": "13:00", "session_open": "0400", "session_close": "1700"}
        ])))
        .mount(&server)
        .await;

    let days = provider(&server)
        .trading_days(
            NaiveDate::from_ymd_opt(2024, 11, 27).unwrap(),
            NaiveDate::from_ymd_opt(2024, 11, 29).unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(days.len(), 2);
    assert_eq!(days[1].date, NaiveDate::from_ymd_opt(2024, 11, 29).unwrap());
    assert!(days[1].is_early_close());
}

#[tokio::test]
async fn empty_calendar_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2/calendar"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let start = NaiveDate::from_ymd_opt(2024, 12, 25).unwrap();
    let err = provider(&server)
        .trading_days(start, start)
        .await
        .unwrap_err();
    assert!(matches!(err, ProviderError::EmptyCalendar { .. }));
}

#[test]
#[serial]
fn from_env_requires_both_keys() {
    unsafe {
        std::env::set_var("APCA_API_KEY_ID", "env-key");
        std::env::remove_var("APCA_API_SECRET_KEY");
    }
    assert!(AlpacaProvider::from_env().is_err());

    unsafe {
        std::env::set_var("APCA_API_SECRET_KEY", "env-secret");
    }
    let provider = AlpacaProvider::from_env().unwrap();
    assert_eq!(provider.config().data_base_url, "https://data.alpaca.markets");

    unsafe {
        std::env::remove_var("APCA_API_KEY_ID");
        std::env::remove_var("APCA_API_SECRET_KEY");
    }
}
