use crate::{
    error::WidgetResult,
    model::{Coordinates, ForecastDay, Query, Units, WeatherSnapshot},
};
use async_trait::async_trait;
use std::fmt::Debug;

pub mod openweather;

pub use openweather::OpenWeatherProvider;

/// Upper bound on forecast days handed to the renderer.
pub const FORECAST_DAYS: usize = 5;

/// Marker the provider puts in `dt_txt` for the midday sample.
const NOON_MARKER: &str = "12:00:00";

/// The two lookups a search is made of.
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    async fn fetch_current(&self, query: &Query, units: Units) -> WidgetResult<WeatherSnapshot>;

    /// Noon samples, one per day, oldest first, at most [`FORECAST_DAYS`].
    async fn fetch_forecast(
        &self,
        coord: Coordinates,
        units: Units,
    ) -> WidgetResult<Vec<ForecastDay>>;
}

/// Keep the entries sampled at noon, in their original order.
pub fn noon_entries(list: Vec<ForecastDay>) -> Vec<ForecastDay> {
    list.into_iter().filter(|day| day.dt_txt.contains(NOON_MARKER)).collect()
}
