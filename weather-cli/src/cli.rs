use anyhow::Context;
use clap::{Parser, Subcommand};
use inquire::{Select, Text};
use std::path::{Path, PathBuf};
use tracing::debug;
use weather_core::{
    Config, Coordinates, FilePreferences, FixedGeolocator, Geolocator, IpGeolocator,
    MemoryPreferences, OpenWeatherProvider, PreferenceStore, UiState, Units, Widget,
};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather", version, about = "Current weather and a 5-day forecast")]
pub struct Cli {
    /// Use this config file instead of the platform default.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Units for this run only; the stored preference is left alone.
    #[arg(long, global = true, value_parser = parse_units)]
    pub units: Option<Units>,

    /// Keep unit toggles in memory instead of writing them to the config file.
    #[arg(long, global = true)]
    pub no_save: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the OpenWeather API key and preferred units.
    Configure,

    /// Show weather for a city.
    Search {
        /// City name, e.g. "Paris" or "Portland, US".
        city: String,
    },

    /// Show weather for the current position.
    Locate {
        /// Latitude; skips the IP lookup when given together with --lon.
        #[arg(long, requires = "lon", allow_hyphen_values = true)]
        lat: Option<f64>,

        #[arg(long, requires = "lat", allow_hyphen_values = true)]
        lon: Option<f64>,

        /// Behave as if no position source were available.
        #[arg(long, conflicts_with_all = ["lat", "lon"])]
        no_geo: bool,
    },

    /// Switch between metric and imperial and remember the choice.
    ///
    /// Rejects --units and --no-save, since both would leave the stored value alone.
    Units,

    /// Prompt for cities until `:q`.
    Interactive,
}

fn parse_units(s: &str) -> Result<Units, String> {
    Units::try_from(s).map_err(|e| e.to_string())
}

const INTERACTIVE_HELP: &str =
    "Type a city name, `:geo` for your location, `:units` to toggle units, `:q` to quit.";

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        let config_path = match self.config.clone() {
            Some(path) => path,
            None => Config::config_file_path()?,
        };

        match self.command {
            Command::Configure => configure(&config_path),
            Command::Search { ref city } => {
                let mut widget = self.widget(&config_path, None)?;
                let state = widget.search(city).await;
                finish(&widget, state)
            }
            Command::Locate { lat, lon, no_geo } => {
                let geolocator: Option<Box<dyn Geolocator>> = match (lat, lon) {
                    _ if no_geo => None,
                    (Some(lat), Some(lon)) => {
                        Some(Box::new(FixedGeolocator::new(Coordinates { lat, lon })))
                    }
                    _ => Some(Box::new(IpGeolocator::new())),
                };

                let mut widget = self.widget(&config_path, geolocator)?;
                let state = widget.use_geolocation().await;
                finish(&widget, state)
            }
            Command::Units => {
                if self.units.is_some() || self.no_save {
                    anyhow::bail!(
                        "`weather units` updates the stored preference; \
                         it cannot be combined with --units or --no-save"
                    );
                }

                let units = toggle_units(&config_path)?;
                println!("Units: {units} ({})", units.temperature_symbol());
                Ok(())
            }
            Command::Interactive => {
                let geolocator: Option<Box<dyn Geolocator>> =
                    Some(Box::new(IpGeolocator::new()));
                let widget = self.widget(&config_path, geolocator)?;
                interactive(widget).await
            }
        }
    }

    fn widget(
        &self,
        config_path: &Path,
        geolocator: Option<Box<dyn Geolocator>>,
    ) -> anyhow::Result<Widget> {
        let config = Config::load_from(config_path)?;
        let provider =
            OpenWeatherProvider::with_base_url(config.api_key()?, config.api_base_url())?;
        debug!(path = %config_path.display(), no_save = self.no_save, "loaded configuration");

        let prefs: Box<dyn PreferenceStore> = if self.no_save {
            Box::new(MemoryPreferences::with_units(config.units))
        } else {
            Box::new(FilePreferences::new(config_path.to_path_buf()))
        };

        let widget = Widget::new(
            Box::new(provider),
            prefs,
            geolocator,
            config.icon_base_url(),
        );

        Ok(match self.units {
            Some(units) => widget.with_units(units),
            None => widget,
        })
    }
}

/// Flip the stored unit preference and return the new value.
fn toggle_units(config_path: &Path) -> anyhow::Result<Units> {
    let mut prefs = FilePreferences::new(config_path.to_path_buf());
    let units = prefs.load_units()?.toggled();
    prefs.save_units(units)?;
    Ok(units)
}

fn configure(path: &Path) -> anyhow::Result<()> {
    let mut config = Config::load_from(path)?;

    let api_key = Text::new("OpenWeather API key:")
        .with_default(config.api_key.as_deref().unwrap_or_default())
        .prompt()
        .context("Failed to read API key")?;

    let units = Select::new("Units:", vec![Units::Metric, Units::Imperial])
        .with_starting_cursor(if config.units == Units::Imperial { 1 } else { 0 })
        .prompt()
        .context("Failed to read units")?;

    config.api_key = Some(api_key.trim().to_string()).filter(|k| !k.is_empty());
    config.units = units;
    config.save_to(path)?;

    println!("Saved configuration to {}", path.display());
    Ok(())
}

/// Print the rendered result, or turn the error panel into a failing exit.
fn finish(widget: &Widget, state: UiState) -> anyhow::Result<()> {
    if state == UiState::Error {
        anyhow::bail!("{}", widget.screen().panels.error_text());
    }

    print!("{}", widget.screen());
    Ok(())
}

async fn interactive(mut widget: Widget) -> anyhow::Result<()> {
    println!("{INTERACTIVE_HELP}");

    loop {
        let prompt = format!("City [{}]:", widget.units().temperature_symbol());
        let input = match Text::new(&prompt).prompt() {
            Ok(input) => input,
            Err(
                inquire::InquireError::OperationCanceled
                | inquire::InquireError::OperationInterrupted,
            ) => break,
            Err(e) => return Err(e).context("Failed to read input"),
        };

        match input.trim() {
            ":q" | ":quit" => break,
            ":geo" => {
                widget.use_geolocation().await;
            }
            ":units" => {
                widget.on_unit_toggle().await;
            }
            ":help" => {
                println!("{INTERACTIVE_HELP}");
                continue;
            }
            _ => {
                widget.search(&input).await;
            }
        }

        println!("{}", widget.screen());
    }

    Ok(())
}
