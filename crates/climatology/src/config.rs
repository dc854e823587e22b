//! Overlay configuration.
//!
//! Settings come from a YAML file (with `${VAR}` and `${VAR:-default}`
//! substitution), from `CLIMATOLOGY_*` environment variables, or from the
//! defaults below.

use std::path::{Path, PathBuf};

use clim_common::{ClimError, ClimResult, Domain, Month, MONTH_SLOTS};
use renderer::isoline_cache::IsoLineSettings;
use renderer::label_cache::DEFAULT_GLYPH_CAPACITY;
use serde::{Deserialize, Serialize};

pub const ENV_DATA_DIR: &str = "CLIMATOLOGY_DATA_DIR";
pub const ENV_MONTH: &str = "CLIMATOLOGY_MONTH";
pub const ENV_LABEL_DENSITY: &str = "CLIMATOLOGY_LABEL_DENSITY";
pub const ENV_NUMBERS_SPACING: &str = "CLIMATOLOGY_NUMBERS_SPACING";
pub const ENV_GLYPH_CACHE: &str = "CLIMATOLOGY_GLYPH_CACHE";

/// Isoline settings per domain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IsoLineConfig {
    pub wind: IsoLineSettings,
    pub current: IsoLineSettings,
    pub pressure: IsoLineSettings,
    pub sea_temperature: IsoLineSettings,
}

impl Default for IsoLineConfig {
    fn default() -> Self {
        Self {
            wind: IsoLineSettings::for_domain(Domain::Wind),
            current: IsoLineSettings::for_domain(Domain::Current),
            pressure: IsoLineSettings::for_domain(Domain::Pressure),
            sea_temperature: IsoLineSettings::for_domain(Domain::SeaTemperature),
        }
    }
}

impl IsoLineConfig {
    pub fn get(&self, domain: Domain) -> &IsoLineSettings {
        match domain {
            Domain::Wind => &self.wind,
            Domain::Current => &self.current,
            Domain::Pressure => &self.pressure,
            Domain::SeaTemperature => &self.sea_temperature,
        }
    }
}

/// Top-level overlay configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayConfig {
    /// Directory holding the wind, grid, track and El Niño files
    pub data_dir: PathBuf,

    /// Initial month slot, 0..=11 or 12 for the annual climatology
    pub month: u8,

    pub isolines: IsoLineConfig,

    /// Pixels of isoline length between value labels
    pub label_density: f64,

    /// Pixel spacing of the numbers grid
    pub numbers_spacing: u32,

    /// Label glyphs kept in memory
    pub glyph_cache_capacity: usize,

    pub glyph_font_size: f32,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            month: 0,
            isolines: IsoLineConfig::default(),
            label_density: 400.0,
            numbers_spacing: 50,
            glyph_cache_capacity: DEFAULT_GLYPH_CAPACITY,
            glyph_font_size: 12.0,
        }
    }
}

impl OverlayConfig {
    /// Load and validate a YAML file.
    pub fn from_yaml<P: AsRef<Path>>(path: P) -> ClimResult<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ClimError::missing(path.as_ref(), e.to_string()))?;
        Self::from_yaml_str(&content)
    }

    pub fn from_yaml_str(content: &str) -> ClimResult<Self> {
        let expanded = expand_env_vars(content)?;
        let config: Self = serde_yaml::from_str(&expanded)
            .map_err(|e| ClimError::Config(format!("Failed to parse overlay config YAML: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults overridden by `CLIMATOLOGY_*` environment variables.
    pub fn from_env() -> ClimResult<Self> {
        Self::from_env_with(|name| std::env::var(name).ok())
    }

    /// Same as [`OverlayConfig::from_env`] with a custom variable lookup.
    pub fn from_env_with<F>(lookup: F) -> ClimResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(dir) = lookup(ENV_DATA_DIR) {
            config.data_dir = PathBuf::from(dir);
        }
        if let Some(v) = lookup(ENV_MONTH) {
            config.month = parse_env(ENV_MONTH, &v)?;
        }
        if let Some(v) = lookup(ENV_LABEL_DENSITY) {
            config.label_density = parse_env(ENV_LABEL_DENSITY, &v)?;
        }
        if let Some(v) = lookup(ENV_NUMBERS_SPACING) {
            config.numbers_spacing = parse_env(ENV_NUMBERS_SPACING, &v)?;
        }
        if let Some(v) = lookup(ENV_GLYPH_CACHE) {
            config.glyph_cache_capacity = parse_env(ENV_GLYPH_CACHE, &v)?;
        }
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> ClimResult<()> {
        if self.month as usize >= MONTH_SLOTS {
            return Err(ClimError::Config(format!(
                "month must be 0..={}, got {}",
                MONTH_SLOTS - 1,
                self.month
            )));
        }
        for domain in Domain::ALL {
            self.isolines
                .get(domain)
                .validate()
                .map_err(|e| ClimError::Config(format!("{} isolines: {}", domain, e)))?;
        }
        if !(self.label_density > 0.0) {
            return Err(ClimError::Config("label_density must be positive".into()));
        }
        if self.numbers_spacing == 0 {
            return Err(ClimError::Config("numbers_spacing must be positive".into()));
        }
        if self.glyph_cache_capacity == 0 {
            return Err(ClimError::Config("glyph_cache_capacity must be positive".into()));
        }
        if !(self.glyph_font_size > 0.0) {
            return Err(ClimError::Config("glyph_font_size must be positive".into()));
        }
        Ok(())
    }

    /// The configured month slot.
    pub fn initial_month(&self) -> ClimResult<Month> {
        Month::new(self.month as usize)
            .ok_or_else(|| ClimError::Config(format!("month slot {} out of range", self.month)))
    }
}

fn parse_env<T: std::str::FromStr>(name: &str, value: &str) -> ClimResult<T> {
    value
        .trim()
        .parse()
        .map_err(|_| ClimError::Config(format!("{} has an invalid value '{}'", name, value)))
}

// ============================================================================
// Environment Variable Expansion
// ============================================================================

/// Expand `${VAR}` and `${VAR:-default}` in YAML content.
fn expand_env_vars(content: &str) -> ClimResult<String> {
    let mut result = String::with_capacity(content.len());
    let mut chars = content.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && chars.peek() == Some(&'{') {
            chars.next();

            let mut var_expr = String::new();
            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(c) => var_expr.push(c),
                    None => {
                        return Err(ClimError::Config(format!(
                            "Unclosed variable substitution: ${{{}",
                            var_expr
                        )))
                    }
                }
            }
            result.push_str(&resolve_var_expr(&var_expr)?);
        } else {
            result.push(ch);
        }
    }

    Ok(result)
}

fn resolve_var_expr(expr: &str) -> ClimResult<String> {
    if let Some((name, default)) = expr.split_once(":-") {
        match std::env::var(name.trim()) {
            Ok(val) if !val.is_empty() => Ok(val),
            _ => Ok(default.to_string()),
        }
    } else {
        std::env::var(expr.trim())
            .map_err(|_| ClimError::Config(format!("Environment variable {} not set", expr)))
    }
}
