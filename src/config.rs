//! Startup configuration: where the data lives, which datasets to load and
//! how exports look. Loaded from JSON; every field has a default so a partial
//! file (or none at all) is valid.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::data::unit_inference::infer_unit;
use crate::error::ConfigError;

/// Largest accepted export width or per-panel height, in pixels.
pub const MAX_EXPORT_SIDE: u32 = 16_384;

/// One configured dataset: `(source, time column, value column, name, unit)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetDescriptor {
    /// Source file, relative to `data_dir` unless absolute.
    pub source: String,
    pub time_column: String,
    pub value_column: String,
    /// Display name; also the dataset's identity everywhere in the session.
    pub name: String,
    #[serde(default)]
    pub unit: Option<String>,
}

impl DatasetDescriptor {
    pub fn new(source: &str, time_column: &str, value_column: &str, name: &str, unit: &str) -> Self {
        Self {
            source: source.to_string(),
            time_column: time_column.to_string(),
            value_column: value_column.to_string(),
            name: name.to_string(),
            unit: Some(unit.to_string()),
        }
    }

    /// The configured unit, or one inferred from the value column name.
    pub fn resolved_unit(&self) -> String {
        match &self.unit {
            Some(unit) if !unit.trim().is_empty() => unit.clone(),
            _ => infer_unit(&self.value_column),
        }
    }

    pub fn source_path(&self, data_dir: &Path) -> PathBuf {
        let source = Path::new(&self.source);
        if source.is_absolute() {
            source.to_path_buf()
        } else {
            data_dir.join(source)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportSettings {
    /// Product slug used in artifact filenames.
    pub product: String,
    pub title: String,
    pub width: u32,
    pub panel_height: u32,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            product: "serprateai".to_string(),
            title: "SerpRateAI Time Series Data".to_string(),
            width: 1800,
            panel_height: 450,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExplorerConfig {
    pub title: String,
    pub data_dir: PathBuf,
    pub export_dir: PathBuf,
    /// Datasets selected at startup. `None` selects the first two loaded.
    pub default_visible: Option<Vec<String>>,
    pub datasets: Vec<DatasetDescriptor>,
    pub export: ExportSettings,
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        Self {
            title: "SerpRateAI Time Series Explorer".to_string(),
            data_dir: PathBuf::from("data"),
            export_dir: PathBuf::from("."),
            default_visible: None,
            datasets: default_datasets(),
            export: ExportSettings::default(),
        }
    }
}

impl ExplorerConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        let config: ExplorerConfig = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.export.product.trim().is_empty() {
            return Err(ConfigError::Invalid("export.product must not be empty".to_string()));
        }
        if self.export.width == 0 || self.export.panel_height == 0 {
            return Err(ConfigError::Invalid(
                "export.width and export.panel_height must be positive".to_string(),
            ));
        }
        if self.export.width > MAX_EXPORT_SIDE || self.export.panel_height > MAX_EXPORT_SIDE {
            return Err(ConfigError::Invalid(format!(
                "export.width and export.panel_height must be at most {MAX_EXPORT_SIDE}"
            )));
        }
        if let Some(d) = self.datasets.iter().find(|d| d.name.trim().is_empty()) {
            return Err(ConfigError::Invalid(format!(
                "dataset with source '{}' has an empty name",
                d.source
            )));
        }
        Ok(())
    }

    /// Names to select at startup, given the names that actually loaded.
    pub fn startup_selection(&self, loaded: &[String]) -> Vec<String> {
        match &self.default_visible {
            Some(names) => names.clone(),
            None => loaded.iter().take(2).cloned().collect(),
        }
    }
}

fn default_datasets() -> Vec<DatasetDescriptor> {
    const M3: &str = "m\u{00B3}/m\u{00B3}";
    vec![
        DatasetDescriptor::new("ba1d_pressure.csv", "datetime", "pressure_bar", "BA1D Pressure", "bar"),
        DatasetDescriptor::new("ba1d_temperature.csv", "datetime", "temperature_c", "BA1D Temperature", "\u{00B0}C"),
        DatasetDescriptor::new("bubble_count.csv", "datetime", "bubble_count", "Bubble Count", "count"),
        DatasetDescriptor::new("daily_precipitation.csv", "datetime", "total_precipitation_sum", "Daily Precipitation", "mm"),
        DatasetDescriptor::new("hourly_precipitation.csv", "datetime", "total_precip", "Hourly Precipitation", "mm"),
        DatasetDescriptor::new("hourly_surface_pressure.csv", "datetime", "surface_pressure", "Surface Pressure", "Pa"),
        DatasetDescriptor::new("hourly_temp2m.csv", "datetime", "temperature_2m", "Temperature (2m)", "K"),
        DatasetDescriptor::new("hourly_soil_temp_lvl1.csv", "datetime", "soil_temperature_level_1", "Soil Temp Level 1", "K"),
        DatasetDescriptor::new("hourly_soil_temp_lvl2.csv", "datetime", "soil_temperature_level_2", "Soil Temp Level 2", "K"),
        DatasetDescriptor::new("hourly_soil_temp_lvl3.csv", "datetime", "soil_temperature_level_3", "Soil Temp Level 3", "K"),
        DatasetDescriptor::new("hourly_soil_temp_lvl4.csv", "datetime", "soil_temperature_level_4", "Soil Temp Level 4", "K"),
        DatasetDescriptor::new("hourly_volu_soil_water_layer1.csv", "datetime", "volumetric_soil_water_layer_1", "Soil Water Layer 1", M3),
        DatasetDescriptor::new("hourly_volu_soil_water_layer2.csv", "datetime", "volumetric_soil_water_layer_2", "Soil Water Layer 2", M3),
        DatasetDescriptor::new("hourly_volu_soil_water_layer3.csv", "datetime", "volumetric_soil_water_layer_3", "Soil Water Layer 3", M3),
        DatasetDescriptor::new("hourly_volu_soil_water_layer4.csv", "datetime", "volumetric_soil_water_layer_4", "Soil Water Layer 4", M3),
        DatasetDescriptor::new("earthtide_oman_waves-all_tidalarealstrain.csv", "datetime", "tide_nstr", "Earth Tides", "nstr"),
    ]
}
