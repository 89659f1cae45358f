use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, de::DeserializeOwned};
use std::time::Duration;
use tracing::debug;

use crate::{
    config::DEFAULT_API_BASE_URL,
    error::{WidgetError, WidgetResult},
    model::{Coordinates, ForecastDay, Query, Units, WeatherSnapshot},
};

use super::{FORECAST_DAYS, WeatherProvider, noon_entries};

const REQUEST_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    api_key: String,
    base_url: String,
    http: Client,
}

impl OpenWeatherProvider {
    pub fn new(api_key: String) -> WidgetResult<Self> {
        Self::with_base_url(api_key, DEFAULT_API_BASE_URL)
    }

    pub fn with_base_url(api_key: String, base_url: &str) -> WidgetResult<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    /// GET `{base}/{endpoint}`; `None` means a non-success status.
    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        mut params: Vec<(&'static str, String)>,
        units: Units,
    ) -> WidgetResult<Option<T>> {
        let url = format!("{}/{endpoint}", self.base_url);
        params.push(("units", units.as_str().to_string()));
        params.push(("appid", self.api_key.clone()));

        debug!(%url, units = units.as_str(), "requesting OpenWeather");

        let res = self.http.get(&url).query(&params).send().await?;

        let status = res.status();
        let body = res.text().await?;

        if !status.is_success() {
            debug!(%url, %status, body = %truncate_body(&body), "OpenWeather request failed");
            return Ok(None);
        }

        serde_json::from_str(&body)
            .map(Some)
            .map_err(|e| WidgetError::Malformed(e.to_string()))
    }
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
    #[serde(default)]
    humidity: u8,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    description: String,
    icon: String,
}

#[derive(Debug, Deserialize)]
struct OwWind {
    speed: f64,
}

#[derive(Debug, Deserialize)]
struct OwCoord {
    lat: f64,
    lon: f64,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    name: String,
    main: OwMain,
    weather: Vec<OwWeather>,
    wind: OwWind,
    coord: OwCoord,
}

#[derive(Debug, Deserialize)]
struct OwForecastEntry {
    dt: i64,
    dt_txt: String,
    main: OwMain,
    weather: Vec<OwWeather>,
}

#[derive(Debug, Deserialize)]
struct OwForecastResponse {
    list: Vec<OwForecastEntry>,
}

/// Description and icon of the first condition, or placeholders when the list is empty.
fn first_condition(weather: Vec<OwWeather>) -> (String, String) {
    weather
        .into_iter()
        .next()
        .map(|w| (w.description, w.icon))
        .unwrap_or_else(|| ("Unknown".to_string(), String::new()))
}

impl From<OwCurrentResponse> for WeatherSnapshot {
    fn from(parsed: OwCurrentResponse) -> Self {
        let (description, icon) = first_condition(parsed.weather);

        WeatherSnapshot {
            city: parsed.name,
            temperature: parsed.main.temp,
            description,
            humidity: parsed.main.humidity,
            wind_speed: parsed.wind.speed,
            icon,
            coord: Coordinates::new(parsed.coord.lat, parsed.coord.lon),
        }
    }
}

impl From<OwForecastEntry> for ForecastDay {
    fn from(entry: OwForecastEntry) -> Self {
        let (description, icon) = first_condition(entry.weather);

        ForecastDay {
            dt: entry.dt,
            dt_txt: entry.dt_txt,
            temperature: entry.main.temp,
            icon,
            description,
        }
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    async fn fetch_current(&self, query: &Query, units: Units) -> WidgetResult<WeatherSnapshot> {
        let params = match query {
            Query::City(city) => vec![("q", city.clone())],
            Query::Coords(c) => vec![("lat", c.lat.to_string()), ("lon", c.lon.to_string())],
        };

        let parsed: OwCurrentResponse = self
            .get_json("weather", params, units)
            .await?
            .ok_or(if query.is_coords() {
                WidgetError::LocationWeatherFailed
            } else {
                WidgetError::CityNotFound
            })?;

        Ok(parsed.into())
    }

    async fn fetch_forecast(
        &self,
        coord: Coordinates,
        units: Units,
    ) -> WidgetResult<Vec<ForecastDay>> {
        let params = vec![("lat", coord.lat.to_string()), ("lon", coord.lon.to_string())];

        let parsed: OwForecastResponse = self
            .get_json("forecast", params, units)
            .await?
            .ok_or(WidgetError::ForecastFailed)?;

        let mut days = noon_entries(parsed.list.into_iter().map(ForecastDay::from).collect());
        days.truncate(FORECAST_DAYS);

        Ok(days)
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
