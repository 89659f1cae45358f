//! Coordinates input, the weather provider, the renderer and the panels.
//!
//! Every operation takes `&mut self`, so two searches can never interleave:
//! a search runs to completion before the next one starts.

use tracing::{debug, info, warn};

use crate::{
    error::{WidgetError, WidgetResult},
    geolocation::{GEOLOCATION_TIMEOUT, Geolocator, locate_within},
    model::{Query, Units},
    preferences::PreferenceStore,
    provider::WeatherProvider,
    render::{render_current, render_forecast},
    state::{Screen, UiState},
};

/// Longest accepted city name, in characters, after trimming.
pub const MAX_CITY_LEN: usize = 100;

/// Trimmed city name, or the reason it was rejected.
pub fn validate_city(text: &str) -> WidgetResult<&str> {
    let city = text.trim();
    match city.chars().count() {
        0 => Err(WidgetError::EmptyCity),
        n if n > MAX_CITY_LEN => Err(WidgetError::InvalidCity),
        _ => Ok(city),
    }
}

/// Mutable state the coordinator owns.
#[derive(Debug, Clone)]
pub struct AppState {
    pub units: Units,
    pub screen: Screen,
}

impl AppState {
    pub fn new(units: Units) -> Self {
        Self {
            units,
            screen: Screen::new(units),
        }
    }
}

pub struct Widget {
    provider: Box<dyn WeatherProvider>,
    prefs: Box<dyn PreferenceStore>,
    geolocator: Option<Box<dyn Geolocator>>,
    icon_base: String,
    state: AppState,
}

impl Widget {
    /// Build a widget, reading the stored unit preference.
    pub fn new(
        provider: Box<dyn WeatherProvider>,
        prefs: Box<dyn PreferenceStore>,
        geolocator: Option<Box<dyn Geolocator>>,
        icon_base: impl Into<String>,
    ) -> Self {
        let units = prefs.load_units().unwrap_or_else(|e| {
            warn!(error = %e, "could not read unit preference, using default");
            Units::default()
        });

        Self {
            provider,
            prefs,
            geolocator,
            icon_base: icon_base.into(),
            state: AppState::new(units),
        }
    }

    /// Use `units` for this session without persisting them.
    pub fn with_units(mut self, units: Units) -> Self {
        self.state = AppState::new(units);
        self
    }

    pub fn units(&self) -> Units {
        self.state.units
    }

    pub fn screen(&self) -> &Screen {
        &self.state.screen
    }

    pub fn ui_state(&self) -> UiState {
        self.state.screen.panels.visible()
    }

    /// Look up `city` as typed by the user.
    pub async fn search(&mut self, city: &str) -> UiState {
        match validate_city(city) {
            Ok(city) => self.orchestrate(Query::City(city.to_string())).await,
            Err(e) => self.fail(e),
        }
    }

    /// Look up the weather at the current position.
    pub async fn use_geolocation(&mut self) -> UiState {
        let Some(geolocator) = self.geolocator.as_deref() else {
            return self.fail(WidgetError::GeolocationUnsupported);
        };

        self.state.screen.panels.set_state(UiState::Loading);

        match locate_within(geolocator, GEOLOCATION_TIMEOUT).await {
            Ok(coord) => self.orchestrate(Query::Coords(coord)).await,
            Err(failure) => self.fail(failure.into()),
        }
    }

    /// Flip metric/imperial, persist it, and refresh a displayed result.
    pub async fn on_unit_toggle(&mut self) -> UiState {
        let units = self.state.units.toggled();
        self.state.units = units;

        if let Err(e) = self.prefs.save_units(units) {
            warn!(error = %e, "could not persist unit preference");
        }

        let screen = &mut self.state.screen;
        screen.surface.unit_label = units.temperature_symbol().to_string();

        if screen.panels.visible() == UiState::Display && screen.surface.has_city() {
            let city = screen.surface.city.clone();
            return self.search(&city).await;
        }

        self.ui_state()
    }

    async fn orchestrate(&mut self, query: Query) -> UiState {
        self.state.screen.panels.set_state(UiState::Loading);

        match self.run(&query).await {
            Ok(()) => {
                self.state.screen.panels.set_state(UiState::Display);
                info!(
                    city = %self.state.screen.surface.city,
                    units = %self.state.units,
                    "search complete"
                );
                UiState::Display
            }
            Err(e) => self.fail(e),
        }
    }

    async fn run(&mut self, query: &Query) -> WidgetResult<()> {
        let units = self.state.units;
        let surface = &mut self.state.screen.surface;

        let snapshot = self.provider.fetch_current(query, units).await?;
        render_current(surface, &snapshot, units, &self.icon_base);

        let days = self.provider.fetch_forecast(snapshot.coord, units).await?;
        render_forecast(surface, &days, units, &self.icon_base);

        Ok(())
    }

    fn fail(&mut self, err: WidgetError) -> UiState {
        debug!(error = ?err, "search failed");
        self.state.screen.panels.show_error(err.to_string());
        UiState::Error
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        geolocation::{FixedGeolocator, GeoFailure},
        model::{Coordinates, ForecastDay, WeatherSnapshot},
    };
    use anyhow::anyhow;
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};

    const ICONS: &str = "https://icons.test/wn";

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Current(Query, Units),
        Forecast(Coordinates, Units),
    }

    #[derive(Debug)]
    struct FakeProvider {
        current: Option<WidgetError>,
        forecast: Option<WidgetError>,
        calls: Arc<Mutex<Vec<Call>>>,
    }

    impl FakeProvider {
        fn ok() -> Self {
            Self {
                current: None,
                forecast: None,
                calls: Arc::default(),
            }
        }
    }

    fn snapshot(units: Units) -> WeatherSnapshot {
        WeatherSnapshot {
            city: "Paris".into(),
            temperature: if units == Units::Metric { 15.4 } else { 59.7 },
            description: "light rain".into(),
            humidity: 82,
            wind_speed: 4.2,
            icon: "10d".into(),
            coord: Coordinates::new(48.85, 2.35),
        }
    }

    #[async_trait]
    impl WeatherProvider for FakeProvider {
        async fn fetch_current(
            &self,
            query: &Query,
            units: Units,
        ) -> WidgetResult<WeatherSnapshot> {
            self.calls.lock().unwrap().push(Call::Current(query.clone(), units));
            match &self.current {
                Some(e) => Err(e.clone()),
                None => Ok(snapshot(units)),
            }
        }

        async fn fetch_forecast(
            &self,
            coord: Coordinates,
            units: Units,
        ) -> WidgetResult<Vec<ForecastDay>> {
            self.calls.lock().unwrap().push(Call::Forecast(coord, units));
            if let Some(e) = &self.forecast {
                return Err(e.clone());
            }
            Ok((0..5)
                .map(|i| ForecastDay {
                    dt: 1_714_564_800 + i * 86_400,
                    dt_txt: String::new(),
                    temperature: 20.0 + i as f64,
                    icon: "01d".into(),
                    description: "clear sky".into(),
                })
                .collect())
        }
    }

    #[derive(Debug, Clone, Default)]
    struct SharedPrefs(Arc<Mutex<Option<Units>>>);

    impl PreferenceStore for SharedPrefs {
        fn load_units(&self) -> anyhow::Result<Units> {
            Ok(self.0.lock().unwrap().unwrap_or_default())
        }

        fn save_units(&mut self, units: Units) -> anyhow::Result<()> {
            *self.0.lock().unwrap() = Some(units);
            Ok(())
        }
    }

    struct BrokenPrefs;

    impl PreferenceStore for BrokenPrefs {
        fn load_units(&self) -> anyhow::Result<Units> {
            Err(anyhow!("disk on fire"))
        }

        fn save_units(&mut self, _: Units) -> anyhow::Result<()> {
            Err(anyhow!("disk on fire"))
        }
    }

    #[derive(Debug)]
    struct FailingGeolocator(GeoFailure);

    #[async_trait]
    impl Geolocator for FailingGeolocator {
        async fn locate(&self) -> Result<Coordinates, GeoFailure> {
            Err(self.0)
        }
    }

    struct Harness {
        widget: Widget,
        calls: Arc<Mutex<Vec<Call>>>,
        prefs: SharedPrefs,
    }

    fn harness(
        current: Option<WidgetError>,
        forecast: Option<WidgetError>,
        geolocator: Option<Box<dyn Geolocator>>,
    ) -> Harness {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let prefs = SharedPrefs::default();
        let provider = FakeProvider {
            current,
            forecast,
            calls: calls.clone(),
        };
        let widget = Widget::new(
            Box::new(provider),
            Box::new(prefs.clone()),
            geolocator,
            ICONS,
        );

        Harness {
            widget,
            calls,
            prefs,
        }
    }

    fn ok_harness() -> Harness {
        harness(None, None, None)
    }

    impl Harness {
        fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }

        fn error_text(&self) -> &str {
            self.widget.screen().panels.error_text()
        }
    }

    #[test]
    fn validate_city_bounds() {
        assert_eq!(validate_city(""), Err(WidgetError::EmptyCity));
        assert_eq!(validate_city(" \t\n "), Err(WidgetError::EmptyCity));
        assert_eq!(validate_city(&"a".repeat(101)), Err(WidgetError::InvalidCity));
        assert_eq!(
            validate_city(&format!("  {}  ", "b".repeat(101))),
            Err(WidgetError::InvalidCity)
        );

        assert_eq!(validate_city("x"), Ok("x"));
        assert_eq!(validate_city("  New York  "), Ok("New York"));
        let longest = "a".repeat(100);
        assert_eq!(validate_city(&format!(" {longest} ")), Ok(longest.as_str()));
    }

    #[test]
    fn validate_city_counts_characters_not_bytes() {
        let accented = "é".repeat(100);
        assert_eq!(validate_city(&accented), Ok(accented.as_str()));
    }

    #[tokio::test]
    async fn whitespace_only_input_shows_error_without_fetching() {
        let mut h = ok_harness();

        assert_eq!(h.widget.search("  ").await, UiState::Error);
        assert_eq!(h.widget.ui_state(), UiState::Error);
        assert_eq!(h.error_text(), "Please enter a city name");
        assert!(h.calls().is_empty());
    }

    #[tokio::test]
    async fn overlong_input_shows_valid_city_message() {
        let mut h = ok_harness();

        h.widget.search(&"z".repeat(150)).await;
        assert_eq!(h.error_text(), "Please enter a valid city name");
        assert!(h.calls().is_empty());
    }

    #[tokio::test]
    async fn successful_search_renders_current_and_forecast() {
        let mut h = ok_harness();

        assert_eq!(h.widget.search("  Paris ").await, UiState::Display);

        let surface = &h.widget.screen().surface;
        assert_eq!(surface.city, "Paris");
        assert_eq!(surface.temperature, "15°C");
        assert_eq!(surface.wind, "4 m/s");
        assert_eq!(surface.forecast.len(), 5);
        assert_eq!(surface.forecast[0].weekday, "Wed");
        assert_eq!(surface.forecast[4].temperature, "24°C");

        assert_eq!(
            h.calls(),
            vec![
                Call::Current(Query::City("Paris".into()), Units::Metric),
                Call::Forecast(Coordinates::new(48.85, 2.35), Units::Metric),
            ]
        );
    }

    #[tokio::test]
    async fn city_not_found_shows_error() {
        let mut h = harness(Some(WidgetError::CityNotFound), None, None);

        assert_eq!(h.widget.search("Atlantis").await, UiState::Error);
        assert_eq!(h.error_text(), "City not found");
        // The forecast is never requested once the first call fails.
        assert_eq!(h.calls().len(), 1);
    }

    #[tokio::test]
    async fn forecast_failure_hides_but_keeps_current_render() {
        let mut h = harness(None, Some(WidgetError::ForecastFailed), None);

        assert_eq!(h.widget.search("Paris").await, UiState::Error);
        assert_eq!(h.error_text(), "Unable to fetch forecast data");

        let surface = &h.widget.screen().surface;
        assert_eq!(surface.city, "Paris");
        assert_eq!(surface.temperature, "15°C");
    }

    #[tokio::test]
    async fn later_success_clears_error_panel() {
        let mut h = ok_harness();

        h.widget.search("").await;
        assert_eq!(h.widget.ui_state(), UiState::Error);

        assert_eq!(h.widget.search("Paris").await, UiState::Display);
    }

    #[tokio::test]
    async fn missing_geolocation_fails_immediately() {
        let mut h = ok_harness();

        assert_eq!(h.widget.use_geolocation().await, UiState::Error);
        assert_eq!(h.error_text(), "Geolocation is not supported by this system");
        assert!(h.calls().is_empty());
    }

    #[tokio::test]
    async fn geolocation_searches_by_coordinates() {
        let here = Coordinates::new(59.91, 10.75);
        let mut h = harness(None, None, Some(Box::new(FixedGeolocator::new(here))));

        assert_eq!(h.widget.use_geolocation().await, UiState::Display);
        assert_eq!(h.calls()[0], Call::Current(Query::Coords(here), Units::Metric));
    }

    #[tokio::test]
    async fn geolocation_failures_are_reported() {
        for (failure, message) in [
            (GeoFailure::PermissionDenied, "Location access denied"),
            (GeoFailure::PositionUnavailable, "Location information is unavailable"),
            (GeoFailure::Timeout, "Location request timed out"),
            (GeoFailure::Other(9), "Unable to retrieve your location"),
        ] {
            let mut h = harness(None, None, Some(Box::new(FailingGeolocator(failure))));

            assert_eq!(h.widget.use_geolocation().await, UiState::Error);
            assert_eq!(h.error_text(), message);
            assert!(h.calls().is_empty());
        }
    }

    #[tokio::test]
    async fn coordinate_lookup_failure_uses_location_message() {
        let here = Coordinates::new(0.0, 0.0);
        let mut h = harness(
            Some(WidgetError::LocationWeatherFailed),
            None,
            Some(Box::new(FixedGeolocator::new(here))),
        );

        h.widget.use_geolocation().await;
        assert_eq!(h.error_text(), "Unable to fetch weather for your location");
    }

    #[tokio::test]
    async fn toggle_without_search_only_changes_future_units() {
        let mut h = ok_harness();

        assert_eq!(h.widget.on_unit_toggle().await, UiState::Display);
        assert_eq!(h.widget.units(), Units::Imperial);
        assert_eq!(h.widget.screen().surface.unit_label, "°F");
        assert!(h.calls().is_empty());

        h.widget.search("Paris").await;
        assert_eq!(h.calls()[0], Call::Current(Query::City("Paris".into()), Units::Imperial));
    }

    #[tokio::test]
    async fn toggle_refreshes_displayed_city() {
        let mut h = ok_harness();
        h.widget.search("Paris").await;

        assert_eq!(h.widget.on_unit_toggle().await, UiState::Display);
        assert_eq!(h.widget.screen().surface.temperature, "60°F");
        assert_eq!(
            h.calls()[2],
            Call::Current(Query::City("Paris".into()), Units::Imperial)
        );
    }

    #[tokio::test]
    async fn toggle_on_error_panel_does_not_search() {
        let mut h = ok_harness();
        h.widget.search("Paris").await;
        h.widget.search("").await;
        let before = h.calls().len();

        assert_eq!(h.widget.on_unit_toggle().await, UiState::Error);
        assert_eq!(h.calls().len(), before);
    }

    #[tokio::test]
    async fn toggling_twice_restores_symbol_and_preference() {
        let mut h = ok_harness();
        let symbol = h.widget.screen().surface.unit_label.clone();
        let stored = h.prefs.load_units().unwrap();

        h.widget.on_unit_toggle().await;
        assert_eq!(*h.prefs.0.lock().unwrap(), Some(Units::Imperial));

        h.widget.on_unit_toggle().await;
        assert_eq!(h.widget.screen().surface.unit_label, symbol);
        assert_eq!(h.prefs.load_units().unwrap(), stored);
    }

    #[tokio::test]
    async fn broken_preference_store_is_not_fatal() {
        let mut widget = Widget::new(
            Box::new(FakeProvider::ok()),
            Box::new(BrokenPrefs),
            None,
            ICONS,
        );

        assert_eq!(widget.units(), Units::Metric);
        widget.on_unit_toggle().await;
        assert_eq!(widget.units(), Units::Imperial);
    }

    #[test]
    fn stored_preference_is_used_at_startup() {
        let prefs = SharedPrefs(Arc::new(Mutex::new(Some(Units::Imperial))));
        let widget = Widget::new(
            Box::new(FakeProvider::ok()),
            Box::new(prefs),
            None,
            ICONS,
        );

        assert_eq!(widget.units(), Units::Imperial);
        assert_eq!(widget.screen().surface.unit_label, "°F");
        assert_eq!(widget.ui_state(), UiState::Display);
    }
}
