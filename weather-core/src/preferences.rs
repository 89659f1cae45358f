use anyhow::Result;
use std::path::PathBuf;

use crate::{config::Config, model::Units};

/// Where the single persisted preference (the unit system) lives.
pub trait PreferenceStore: Send + Sync {
    /// Stored units, or the default when nothing was saved yet.
    fn load_units(&self) -> Result<Units>;

    fn save_units(&mut self, units: Units) -> Result<()>;
}

/// Keeps `units` inside the config TOML, leaving the other fields untouched.
#[derive(Debug, Clone)]
pub struct FilePreferences {
    path: PathBuf,
}

impl FilePreferences {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl PreferenceStore for FilePreferences {
    fn load_units(&self) -> Result<Units> {
        Ok(Config::load_from(&self.path)?.units)
    }

    fn save_units(&mut self, units: Units) -> Result<()> {
        let mut cfg = Config::load_from(&self.path)?;
        cfg.units = units;
        cfg.save_to(&self.path)
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryPreferences {
    units: Option<Units>,
}

impl MemoryPreferences {
    pub fn with_units(units: Units) -> Self {
        Self { units: Some(units) }
    }
}

impl PreferenceStore for MemoryPreferences {
    fn load_units(&self) -> Result<Units> {
        Ok(self.units.unwrap_or_default())
    }

    fn save_units(&mut self, units: Units) -> Result<()> {
        self.units = Some(units);
        Ok(())
    }
}
