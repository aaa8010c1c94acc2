use airquality_core::{
    AirQualityReading, Config, Coordinate, InvalidCoordinate, Providers, aggregate,
};
use anyhow::Context;
use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::info;

#[derive(Debug)]
pub struct AppState {
    default_coordinate: Coordinate,
    providers: Providers,
}

impl AppState {
    pub fn new(default_coordinate: Coordinate, providers: Providers) -> Self {
        Self {
            default_coordinate,
            providers,
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/api/health", get(health))
        .route("/api/data", post(echo))
        .route("/api/air", get(air))
        .with_state(Arc::new(state))
}

pub async fn serve(config: Config, bind: &str) -> anyhow::Result<()> {
    let providers = Providers::from_config(&config)?;
    let app = create_router(AppState::new(config.default_coordinate(), providers));

    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .with_context(|| format!("Failed to bind to {bind}"))?;

    info!("HTTP server listening on {bind}");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            info!("Received shutdown signal");
        })
        .await
        .context("HTTP server error")
}

async fn home() -> Html<&'static str> {
    Html(include_str!("../static/index.html"))
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok", "message": "backend alive" }))
}

async fn echo(Json(body): Json<Value>) -> Json<Value> {
    Json(json!({ "message": format!("Received {body}") }))
}

async fn air(
    State(state): State<Arc<AppState>>,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<(StatusCode, Json<AirQualityReading>), ApiError> {
    let coord = Coordinate::parse(
        first_value(&params, "lat"),
        first_value(&params, "lon"),
        state.default_coordinate,
    )?;

    let providers = &state.providers;
    let reading = aggregate(providers.primary.as_ref(), providers.fallback.as_ref(), coord).await;

    let status = if reading.is_ok() {
        StatusCode::OK
    } else {
        StatusCode::BAD_GATEWAY
    };

    Ok((status, Json(reading)))
}

/// Repeated keys resolve to their first occurrence.
fn first_value<'a>(params: &'a [(String, String)], key: &str) -> Option<&'a str> {
    params
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}

struct ApiError(InvalidCoordinate);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            StatusCode::BAD_REQUEST,
            Json(AirQualityReading::failed(self.0.to_string())),
        )
            .into_response()
    }
}

impl From<InvalidCoordinate> for ApiError {
    fn from(err: InvalidCoordinate) -> Self {
        Self(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use airquality_core::{
        AirQualityProvider, AqiLabel, ProviderError, Reading, Source,
        model::{Components, Location, Sidebar, SourceDetail, WeatherSnapshot},
        provider::openweather::OpenWeatherProvider,
    };
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug)]
    struct Fake {
        source: Source,
        succeed: bool,
        calls: AtomicUsize,
    }

    impl Fake {
        fn new(source: Source, succeed: bool) -> Arc<Self> {
            Arc::new(Self {
                source,
                succeed,
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl AirQualityProvider for Fake {
        fn source(&self) -> Source {
            self.source
        }

        async fn fetch(&self, coord: Coordinate) -> Result<Reading, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.succeed {
                return Err(match self.source {
                    Source::OpenWeather => ProviderError::EmptyAirList,
                    Source::OpenMeteo => ProviderError::NoHourlyData,
                });
            }

            let detail = match self.source {
                Source::OpenWeather => SourceDetail::OpenWeather {
                    weather: Box::new(WeatherSnapshot {
                        location: Location {
                            id: None,
                            name: Some("Windsor".into()),
                            lat: Some(coord.lat),
                            lon: Some(coord.lon),
                            country: None,
                        },
                        sunrise: None,
                        sunset: None,
                        observed_at: None,
                        timezone_offset: None,
                        temp_c: Some(12.0),
                        feels_like_c: None,
                        temp_min_c: None,
                        temp_max_c: None,
                        humidity: None,
                        pressure: None,
                        visibility: None,
                        wind_kmh: Some(36.0),
                        wind_deg: None,
                        clouds: None,
                        conditions: Vec::new(),
                    }),
                    sidebar: Sidebar {
                        temp_c: Some(12.0),
                        wind_kmh: Some(36.0),
                        city: Some("Windsor".into()),
                    },
                },
                Source::OpenMeteo => SourceDetail::OpenMeteo,
            };

            Ok(Reading {
                detail,
                aqi: Some(2),
                aqi_label: AqiLabel::Fair,
                components: Components::default(),
                timestamp: None,
            })
        }
    }

    async fn spawn(
        primary: Arc<dyn AirQualityProvider>,
        fallback: Arc<dyn AirQualityProvider>,
    ) -> String {
        let state = AppState::new(
            Coordinate::new(42.3149, -83.0364),
            Providers { primary, fallback },
        );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind test listener");
        let addr = listener.local_addr().expect("local addr");

        tokio::spawn(async move {
            axum::serve(listener, create_router(state)).await.ok();
        });

        format!("http://{addr}")
    }

    async fn get_json(url: String) -> (StatusCode, Value) {
        let res = reqwest::get(url).await.expect("request");
        let status = StatusCode::from_u16(res.status().as_u16()).expect("status");
        let body = res.json::<Value>().await.expect("json body");
        (status, body)
    }

    #[tokio::test]
    async fn health_is_always_ok() {
        let primary = Fake::new(Source::OpenWeather, false);
        let fallback = Fake::new(Source::OpenMeteo, false);
        let base = spawn(primary.clone(), fallback.clone()).await;

        let (status, body) = get_json(format!("{base}/api/health")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "status": "ok", "message": "backend alive" }));
        assert_eq!(primary.calls() + fallback.calls(), 0);
    }

    #[tokio::test]
    async fn invalid_coordinates_are_rejected_without_provider_calls() {
        let primary = Fake::new(Source::OpenWeather, true);
        let fallback = Fake::new(Source::OpenMeteo, true);
        let base = spawn(primary.clone(), fallback.clone()).await;

        for query in ["lat=abc", "lon=north", "lat=1.0&lon=", "lat=12,5&lon=3"] {
            let (status, body) = get_json(format!("{base}/api/air?{query}")).await;

            assert_eq!(status, StatusCode::BAD_REQUEST, "query {query}");
            assert_eq!(body, json!({ "ok": false, "error": "Invalid lat/lon" }));
        }

        assert_eq!(primary.calls(), 0);
        assert_eq!(fallback.calls(), 0);
    }

    #[tokio::test]
    async fn repeated_query_keys_use_the_first_value() {
        let primary = Fake::new(Source::OpenWeather, true);
        let fallback = Fake::new(Source::OpenMeteo, true);
        let base = spawn(primary.clone(), fallback.clone()).await;

        let (status, body) = get_json(format!("{base}/api/air?lat=1&lat=2&lon=3")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["weather"]["location"]["lat"], json!(1.0));
        assert_eq!(body["weather"]["location"]["lon"], json!(3.0));

        let (status, body) = get_json(format!("{base}/api/air?lat=abc&lat=abc")).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "ok": false, "error": "Invalid lat/lon" }));
        assert_eq!(primary.calls(), 1);
        assert_eq!(fallback.calls(), 0);
    }

    #[tokio::test]
    async fn primary_success_is_returned_without_fallback() {
        let primary = Fake::new(Source::OpenWeather, true);
        let fallback = Fake::new(Source::OpenMeteo, true);
        let base = spawn(primary.clone(), fallback.clone()).await;

        let (status, body) = get_json(format!("{base}/api/air?lat=43.65&lon=-79.38")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ok"], json!(true));
        assert_eq!(body["source"], json!("openweather"));
        assert_eq!(body["sidebar"]["wind_kmh"], json!(36.0));
        assert_eq!(body["weather"]["location"]["lat"], json!(43.65));
        assert_eq!(primary.calls(), 1);
        assert_eq!(fallback.calls(), 0);
    }

    #[tokio::test]
    async fn primary_failure_falls_back() {
        let primary = Fake::new(Source::OpenWeather, false);
        let fallback = Fake::new(Source::OpenMeteo, true);
        let base = spawn(primary.clone(), fallback.clone()).await;

        let (status, body) = get_json(format!("{base}/api/air")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["source"], json!("open-meteo"));
        assert!(body.get("weather").is_none());
        assert!(body.get("sidebar").is_none());
        assert_eq!(primary.calls(), 1);
        assert_eq!(fallback.calls(), 1);
    }

    #[tokio::test]
    async fn both_failing_is_bad_gateway_with_fallback_error() {
        let primary = Fake::new(Source::OpenWeather, false);
        let fallback = Fake::new(Source::OpenMeteo, false);
        let base = spawn(primary.clone(), fallback.clone()).await;

        let (status, body) = get_json(format!("{base}/api/air")).await;

        assert_eq!(status, StatusCode::BAD_GATEWAY);
        let expected =
            serde_json::to_value(fallback.reading(Coordinate::new(0.0, 0.0)).await).unwrap();
        assert_eq!(body, expected);
        assert_eq!(body, json!({ "ok": false, "error": "No hourly data" }));
    }

    #[tokio::test]
    async fn missing_api_key_goes_straight_to_fallback() {
        // The missing key must short-circuit before any request is made.
        let primary = Arc::new(OpenWeatherProvider::new(
            None,
            "http://127.0.0.1:9".to_string(),
            reqwest::Client::new(),
        ));
        let fallback = Fake::new(Source::OpenMeteo, true);
        let base = spawn(primary, fallback.clone()).await;

        let (status, body) = get_json(format!("{base}/api/air")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["source"], json!("open-meteo"));
        assert_eq!(fallback.calls(), 1);
    }

    #[tokio::test]
    async fn echo_embeds_the_body() {
        let primary = Fake::new(Source::OpenWeather, true);
        let fallback = Fake::new(Source::OpenMeteo, true);
        let base = spawn(primary, fallback).await;

        let res = reqwest::Client::new()
            .post(format!("{base}/api/data"))
            .json(&json!({ "city": "Windsor" }))
            .send()
            .await
            .expect("request");

        assert_eq!(res.status().as_u16(), 200);
        let body: Value = res.json().await.expect("json body");
        assert_eq!(body, json!({ "message": "Received {\"city\":\"Windsor\"}" }));
    }

    #[tokio::test]
    async fn home_serves_the_frontend_page() {
        let primary = Fake::new(Source::OpenWeather, true);
        let fallback = Fake::new(Source::OpenMeteo, true);
        let base = spawn(primary, fallback).await;

        let res = reqwest::get(format!("{base}/")).await.expect("request");

        assert_eq!(res.status().as_u16(), 200);
        let text = res.text().await.expect("body");
        assert!(text.contains("/api/air"));
    }
}
