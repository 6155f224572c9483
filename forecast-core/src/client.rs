use std::{fmt, sync::Arc};

use reqwest::Url;
use tracing::{debug, warn};

use crate::{
    error::ForecastError,
    model::ForecastResult,
    transport::HttpTransport,
};

/// Number of 3-hour timestamps requested from upstream.
pub const FORECAST_TIMESTAMPS: u32 = 24;

pub const FORECAST_PATH: &str = "data/2.5/forecast";

/// Client for the OpenWeatherMap 5-day / 3-hour forecast endpoint.
///
/// Holds no mutable state: clones share the transport and can be used from
/// any number of tasks concurrently.
#[derive(Clone)]
pub struct ForecastClient {
    transport: Arc<dyn HttpTransport>,
    endpoint: Url,
    api_key: String,
}

impl ForecastClient {
    pub fn new(transport: Arc<dyn HttpTransport>, base_url: &Url, api_key: String) -> Self {
        Self {
            transport,
            endpoint: forecast_endpoint(base_url),
            api_key,
        }
    }

    /// Full request URL for `city`, query included.
    pub fn request_url(&self, city: &str) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("cnt", &FORECAST_TIMESTAMPS.to_string())
            .append_pair("q", city)
            .append_pair("appid", &self.api_key)
            .append_pair("units", "metric");
        url
    }

    /// Fetch the forecast for `city`.
    ///
    /// The city is passed through untouched; upstream decides whether it exists.
    pub async fn fetch_forecast(&self, city: &str) -> Result<ForecastResult, ForecastError> {
        debug!(city, path = self.endpoint.path(), "requesting forecast");

        let res = self.transport.get(self.request_url(city)).await.inspect_err(|err| {
            warn!(city, error = %err, "forecast request failed");
        })?;

        if !res.is_success() {
            warn!(city, status = res.status, "upstream rejected forecast request");
            let body = Some(res.body).filter(|b| !b.trim().is_empty());
            return Err(ForecastError::Upstream { status: res.status, body });
        }

        let parsed: ForecastResult = serde_json::from_str(&res.body).inspect_err(|err| {
            warn!(city, error = %err, "forecast response did not match schema");
        })?;

        debug!(city, entries = parsed.len(), "forecast received");
        Ok(parsed)
    }
}

impl fmt::Debug for ForecastClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ForecastClient")
            .field("transport", &self.transport)
            .field("endpoint", &self.endpoint.as_str())
            .field("api_key", &"<redacted>")
            .finish()
    }
}

fn forecast_endpoint(base_url: &Url) -> Url {
    let mut endpoint = base_url.clone();
    endpoint.set_query(None);
    endpoint.set_fragment(None);

    let prefix = endpoint.path().trim_end_matches('/').to_string();
    endpoint.set_path(&format!("{prefix}/{FORECAST_PATH}"));
    endpoint
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{TransportError, TransportResponse};
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Replays one canned outcome and records every requested URL.
    #[derive(Debug)]
    struct StubTransport {
        outcome: Result<TransportResponse, String>,
        seen: Mutex<Vec<Url>>,
    }

    impl StubTransport {
        fn respond(status: u16, body: &str) -> Arc<Self> {
            Arc::new(Self {
                outcome: Ok(TransportResponse::new(status, body)),
                seen: Mutex::new(Vec::new()),
            })
        }

        fn fail(message: &str) -> Arc<Self> {
            Arc::new(Self { outcome: Err(message.to_string()), seen: Mutex::new(Vec::new()) })
        }

        fn requests(&self) -> Vec<Url> {
            self.seen.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl HttpTransport for StubTransport {
        async fn get(&self, url: Url) -> Result<TransportResponse, TransportError> {
            self.seen.lock().unwrap().push(url);
            match &self.outcome {
                Ok(res) => Ok(res.clone()),
                Err(msg) => Err(TransportError::timeout(msg.clone())),
            }
        }
    }

    fn client(transport: Arc<StubTransport>) -> ForecastClient {
        let base = Url::parse("https://api.openweathermap.org").unwrap();
        ForecastClient::new(transport, &base, "TEST_KEY".to_string())
    }

    fn forecast_body(timestamps: &[&str]) -> String {
        let entries: Vec<_> = timestamps
            .iter()
            .enumerate()
            .map(|(i, ts)| {
                serde_json::json!({
                    "main": { "temp": 10.0 + i as f64, "humidity": 70 },
                    "weather": [{ "main": "Clouds", "description": "few clouds" }],
                    "dt_txt": ts,
                })
            })
            .collect();
        serde_json::json!({ "cod": "200", "list": entries }).to_string()
    }

    fn query_of(url: &Url) -> Vec<(String, String)> {
        url.query_pairs().map(|(k, v)| (k.into_owned(), v.into_owned())).collect()
    }

    #[tokio::test]
    async fn builds_query_for_city() {
        let transport = StubTransport::respond(200, &forecast_body(&[]));
        client(transport.clone()).fetch_forecast("London").await.unwrap();

        let requests = transport.requests();
        assert_eq!(requests.len(), 1);

        let url = &requests[0];
        assert_eq!(url.path(), "/data/2.5/forecast");
        assert_eq!(
            query_of(url),
            vec![
                ("cnt".to_string(), "24".to_string()),
                ("q".to_string(), "London".to_string()),
                ("appid".to_string(), "TEST_KEY".to_string()),
                ("units".to_string(), "metric".to_string()),
            ]
        );
    }

    #[test]
    fn city_is_percent_encoded() {
        let url = client(StubTransport::respond(200, "")).request_url("São Paulo,BR");
        let q = query_of(&url).into_iter().find(|(k, _)| k == "q").unwrap();

        assert_eq!(q.1, "São Paulo,BR");
        assert!(!url.as_str().contains(' '));
    }

    #[test]
    fn base_url_path_prefix_is_kept() {
        let base = Url::parse("http://localhost:8089/mock/owm/?ignored=1").unwrap();
        let client = ForecastClient::new(StubTransport::respond(200, ""), &base, "K".into());
        let url = client.request_url("Oslo");

        assert_eq!(url.path(), "/mock/owm/data/2.5/forecast");
        assert!(!url.as_str().contains("ignored"));
    }

    #[test]
    fn debug_output_hides_api_key() {
        let client = client(StubTransport::respond(200, ""));
        let rendered = format!("{client:?}");

        assert!(!rendered.contains("TEST_KEY"));
        assert!(rendered.contains("/data/2.5/forecast"));
    }

    #[tokio::test]
    async fn preserves_entry_count_and_order() {
        let stamps = ["2025-10-31 18:00:00", "2025-10-31 21:00:00", "2025-11-01 00:00:00"];
        let transport = StubTransport::respond(200, &forecast_body(&stamps));

        let result = client(transport).fetch_forecast("London").await.unwrap();

        let got: Vec<_> = result.entries.iter().map(|e| e.timestamp.as_str()).collect();
        assert_eq!(got, stamps);
        assert_eq!(result.entries[2].measurements.temperature, Some(12.0));
    }

    #[tokio::test]
    async fn not_found_is_an_upstream_error() {
        let transport =
            StubTransport::respond(404, r#"{"cod":"404","message":"city not found"}"#);

        let err = client(transport).fetch_forecast("Atlantis").await.unwrap_err();

        match err {
            ForecastError::Upstream { status, body } => {
                assert_eq!(status, 404);
                assert!(body.unwrap().contains("city not found"));
            }
            other => panic!("expected upstream error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn error_status_with_valid_forecast_body_is_still_an_error() {
        let transport = StubTransport::respond(401, &forecast_body(&["2025-10-31 18:00:00"]));

        let err = client(transport).fetch_forecast("London").await.unwrap_err();
        assert_eq!(err.status(), Some(401));
    }

    #[tokio::test]
    async fn empty_error_body_is_reported_as_absent() {
        let transport = StubTransport::respond(503, "  ");

        let err = client(transport).fetch_forecast("London").await.unwrap_err();
        assert!(matches!(err, ForecastError::Upstream { status: 503, body: None }));
    }

    #[tokio::test]
    async fn malformed_json_is_a_deserialization_error() {
        let transport = StubTransport::respond(200, "<html>maintenance</html>");

        let err = client(transport).fetch_forecast("London").await.unwrap_err();
        assert!(matches!(err, ForecastError::Deserialization(_)));
    }

    #[tokio::test]
    async fn null_main_and_weather_do_not_fail_the_forecast() {
        let body = r#"{"list":[
            {"main":null,"weather":[],"dt_txt":"2025-10-31 18:00:00"},
            {"main":{"temp":7.0},"weather":null,"dt_txt":"2025-10-31 21:00:00"}
        ]}"#;
        let transport = StubTransport::respond(200, body);

        let result = client(transport).fetch_forecast("London").await.unwrap();

        assert_eq!(result.len(), 2);
        assert_eq!(result.entries[0].measurements.temperature, None);
        assert!(result.entries[1].conditions.is_empty());
    }

    #[tokio::test]
    async fn missing_list_is_a_deserialization_error() {
        let transport = StubTransport::respond(200, r#"{"cod":"200","cnt":0}"#);

        let err = client(transport).fetch_forecast("London").await.unwrap_err();
        assert!(matches!(err, ForecastError::Deserialization(_)));
    }

    #[tokio::test]
    async fn transport_failure_is_propagated_without_retry() {
        let transport = StubTransport::fail("deadline elapsed");

        let err = client(transport.clone()).fetch_forecast("London").await.unwrap_err();

        match err {
            ForecastError::Transport(inner) => assert!(inner.is_timeout()),
            other => panic!("expected transport error, got {other:?}"),
        }
        assert_eq!(transport.requests().len(), 1);
    }

    #[tokio::test]
    async fn concurrent_fetches_are_independent() {
        let transport = StubTransport::respond(200, &forecast_body(&["2025-10-31 18:00:00"]));
        let client = client(transport.clone());

        let (a, b, c) = tokio::join!(
            client.fetch_forecast("London"),
            client.fetch_forecast("London"),
            client.fetch_forecast("Paris"),
        );

        assert_eq!(a.unwrap(), b.unwrap());
        assert_eq!(c.unwrap().len(), 1);
        assert_eq!(transport.requests().len(), 3);
    }
}
