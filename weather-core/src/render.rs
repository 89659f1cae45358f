//! Writes fetched data into the display slots.
//!
//! A [`Surface`] is a plain set of named slots. The render functions only
//! overwrite slots, they never read them back.

use chrono::DateTime;
use std::fmt;

use crate::model::{ForecastDay, Units, WeatherSnapshot};

const EMPTY_SLOT: &str = "--";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Icon {
    pub src: String,
    pub alt: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForecastCard {
    pub weekday: String,
    pub icon: Option<Icon>,
    pub temperature: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Surface {
    pub city: String,
    pub temperature: String,
    pub description: String,
    pub humidity: String,
    pub wind: String,
    pub icon: Option<Icon>,
    /// Symbol shown on the unit toggle.
    pub unit_label: String,
    pub forecast: Vec<ForecastCard>,
}

impl Surface {
    pub fn new(units: Units) -> Self {
        Self {
            city: EMPTY_SLOT.to_string(),
            temperature: EMPTY_SLOT.to_string(),
            description: EMPTY_SLOT.to_string(),
            humidity: EMPTY_SLOT.to_string(),
            wind: EMPTY_SLOT.to_string(),
            icon: None,
            unit_label: units.temperature_symbol().to_string(),
            forecast: Vec::new(),
        }
    }

    /// `true` once a search has written a real city name.
    pub fn has_city(&self) -> bool {
        !self.city.is_empty() && self.city != EMPTY_SLOT
    }
}

/// JavaScript-style rounding: halves go toward positive infinity.
pub fn round_half_up(value: f64) -> i64 {
    (value + 0.5).floor() as i64
}

pub fn format_temperature(value: f64, units: Units) -> String {
    format!("{}{}", round_half_up(value), units.temperature_symbol())
}

pub fn icon_url(icon_base: &str, icon: &str) -> String {
    format!("{}/{icon}@2x.png", icon_base.trim_end_matches('/'))
}

fn icon(icon_base: &str, code: &str, alt: &str) -> Option<Icon> {
    (!code.is_empty()).then(|| Icon {
        src: icon_url(icon_base, code),
        alt: alt.to_string(),
    })
}

/// Abbreviated English weekday of a unix timestamp, in UTC.
pub fn short_weekday(dt: i64) -> String {
    DateTime::from_timestamp(dt, 0)
        .map(|d| d.format("%a").to_string())
        .unwrap_or_else(|| EMPTY_SLOT.to_string())
}

pub fn render_current(
    surface: &mut Surface,
    snapshot: &WeatherSnapshot,
    units: Units,
    icon_base: &str,
) {
    surface.city = snapshot.city.clone();
    surface.temperature = format_temperature(snapshot.temperature, units);
    surface.description = snapshot.description.clone();
    surface.humidity = format!("{}%", snapshot.humidity);
    surface.wind = format!("{} {}", round_half_up(snapshot.wind_speed), units.wind_label());
    surface.icon = icon(icon_base, &snapshot.icon, &snapshot.description);
}

pub fn render_forecast(
    surface: &mut Surface,
    days: &[ForecastDay],
    units: Units,
    icon_base: &str,
) {
    surface.forecast = days
        .iter()
        .map(|day| ForecastCard {
            weekday: short_weekday(day.dt),
            icon: icon(icon_base, &day.icon, &day.description),
            temperature: format_temperature(day.temperature, units),
        })
        .collect();
}

impl fmt::Display for Surface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}  [{}]", self.city, self.unit_label)?;
        writeln!(f, "  {}  {}", self.temperature, self.description)?;
        writeln!(f, "  Humidity: {}", self.humidity)?;
        writeln!(f, "  Wind: {}", self.wind)?;
        if let Some(icon) = &self.icon {
            writeln!(f, "  Icon: {} ({})", icon.src, icon.alt)?;
        }

        if !self.forecast.is_empty() {
            writeln!(f)?;
            for card in &self.forecast {
                let alt = card.icon.as_ref().map(|i| i.alt.as_str()).unwrap_or("");
                writeln!(f, "  {:<4} {:>6}  {}", card.weekday, card.temperature, alt)?;
            }
        }

        Ok(())
    }
}
