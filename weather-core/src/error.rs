use thiserror::Error;

/// Every failure that can end a search.
///
/// The `Display` text of each variant is exactly what the error panel shows.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WidgetError {
    #[error("Please enter a city name")]
    EmptyCity,

    #[error("Please enter a valid city name")]
    InvalidCity,

    #[error("City not found")]
    CityNotFound,

    #[error("Unable to fetch weather for your location")]
    LocationWeatherFailed,

    #[error("Unable to fetch forecast data")]
    ForecastFailed,

    #[error("Network error: {0}")]
    Network(String),

    #[error("Unexpected response from weather service: {0}")]
    Malformed(String),

    #[error("Geolocation is not supported by this system")]
    GeolocationUnsupported,

    #[error("Location access denied")]
    PermissionDenied,

    #[error("Location information is unavailable")]
    PositionUnavailable,

    #[error("Location request timed out")]
    Timeout,

    #[error("Unable to retrieve your location")]
    LocationDenied,

    #[error("{0}")]
    Config(String),
}

impl From<reqwest::Error> for WidgetError {
    fn from(err: reqwest::Error) -> Self {
        WidgetError::Network(err.to_string())
    }
}

pub type WidgetResult<T> = Result<T, WidgetError>;
