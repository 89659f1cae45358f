//! Core library for the `weather` lookup tool.
//!
//! This crate defines:
//! - Configuration and the persisted unit preference
//! - The OpenWeather client behind the [`WeatherProvider`] trait
//! - Rendering into display slots and the loading/display/error panels
//! - Position sources and the [`Widget`] coordinator tying it together
//!
//! It is used by `weather-cli`, but the coordinator only talks to traits, so
//! other front ends (or tests) can plug in their own provider and storage.

pub mod app;
pub mod config;
pub mod error;
pub mod geolocation;
pub mod model;
pub mod preferences;
pub mod provider;
pub mod render;
pub mod state;

pub use app::{Widget, validate_city};
pub use config::Config;
pub use error::{WidgetError, WidgetResult};
pub use geolocation::{FixedGeolocator, GeoFailure, Geolocator, IpGeolocator};
pub use model::{Coordinates, ForecastDay, Query, Units, WeatherSnapshot};
pub use preferences::{FilePreferences, MemoryPreferences, PreferenceStore};
pub use provider::{OpenWeatherProvider, WeatherProvider};
pub use state::{Screen, UiState};
