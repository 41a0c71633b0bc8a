//! Configuration Management

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Config {
    /// Log every gesture transition at debug level
    #[serde(default)]
    pub debug: bool,
    /// Scroll zone geometry
    pub zones: ZoneConfig,
    /// Detent and inertia settings
    pub scroll: ScrollConfig,
    /// Contact count limits
    pub contacts: ContactsConfig,
    /// Corner tap gestures
    #[serde(default)]
    pub corner_tap: CornerTapConfig,
}

/// Side of the surface holding the vertical zone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum VerticalZonePosition {
    Left,
    #[default]
    Right,
}

/// Edge of the surface holding the horizontal zone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum HorizontalZonePosition {
    Top,
    #[default]
    Bottom,
}

/// Zone configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneConfig {
    /// Vertical zone width, percent of surface width
    pub width_percent: f64,
    pub position: VerticalZonePosition,
    /// Enable the horizontal zone
    pub horizontal_enabled: bool,
    /// Horizontal zone height, percent of surface height
    pub horizontal_height_percent: f64,
    pub horizontal_position: HorizontalZonePosition,
}

/// Scroll configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScrollConfig {
    /// Multiplier on wheel output per unit of travel
    pub speed: f64,
    /// Second multiplier, kept separate so presets can tune speed alone
    pub sensitivity: f64,
    pub invert_vertical: bool,
    pub invert_horizontal: bool,
    /// Keep scrolling with decaying velocity after a fast exit
    pub inertia_enabled: bool,
}

/// Contact configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContactsConfig {
    /// Fewest touching contacts that may scroll
    pub min_contacts: u32,
    /// Most touching contacts that may scroll
    pub max_contacts: u32,
}

/// Corner tap configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CornerTapConfig {
    pub enabled: bool,
    /// Corner box size, percent of each extent
    pub size_percent: f64,
    /// Longest press still counted as a tap
    pub max_duration_ms: u64,
    /// Per-axis movement allowed, percent of the extent
    pub movement_threshold_percent: f64,
}

impl Default for ZoneConfig {
    fn default() -> Self {
        Self {
            width_percent: 10.0,
            position: VerticalZonePosition::Right,
            horizontal_enabled: false,
            horizontal_height_percent: 10.0,
            horizontal_position: HorizontalZonePosition::Bottom,
        }
    }
}

impl Default for ScrollConfig {
    fn default() -> Self {
        Self {
            speed: 1.0,
            sensitivity: 1.0,
            invert_vertical: false,
            invert_horizontal: false,
            inertia_enabled: true,
        }
    }
}

impl Default for ContactsConfig {
    fn default() -> Self {
        Self {
            min_contacts: 1,
            max_contacts: 1,
        }
    }
}

impl Default for CornerTapConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            size_percent: 10.0,
            max_duration_ms: 300,
            movement_threshold_percent: 5.0,
        }
    }
}

fn check_range(name: &str, value: f64, min: f64, max: f64) -> Result<(), crate::Error> {
    if !(min..=max).contains(&value) {
        return Err(crate::Error::Config(format!(
            "{} must be in [{}, {}], got {}",
            name, min, max, value
        )));
    }
    Ok(())
}

impl Config {
    /// Validate config values are within acceptable ranges.
    /// Returns Ok(()) if valid, or Err with a description of the first invalid field.
    pub fn validate(&self) -> Result<(), crate::Error> {
        check_range("zones.width_percent", self.zones.width_percent, 5.0, 30.0)?;
        check_range(
            "zones.horizontal_height_percent",
            self.zones.horizontal_height_percent,
            5.0,
            30.0,
        )?;
        check_range("scroll.speed", self.scroll.speed, 0.5, 5.0)?;
        check_range("scroll.sensitivity", self.scroll.sensitivity, 0.1, 5.0)?;

        let contacts = &self.contacts;
        if !(1..=5).contains(&contacts.min_contacts) || !(1..=5).contains(&contacts.max_contacts) {
            return Err(crate::Error::Config(format!(
                "contact limits must be in [1, 5], got {}..{}",
                contacts.min_contacts, contacts.max_contacts
            )));
        }
        if contacts.min_contacts > contacts.max_contacts {
            return Err(crate::Error::Config(format!(
                "min_contacts ({}) must not exceed max_contacts ({})",
                contacts.min_contacts, contacts.max_contacts
            )));
        }

        check_range("corner_tap.size_percent", self.corner_tap.size_percent, 1.0, 25.0)?;
        if !(50..=2000).contains(&self.corner_tap.max_duration_ms) {
            return Err(crate::Error::Config(format!(
                "corner_tap.max_duration_ms must be in [50, 2000], got {}",
                self.corner_tap.max_duration_ms
            )));
        }
        check_range(
            "corner_tap.movement_threshold_percent",
            self.corner_tap.movement_threshold_percent,
            0.5,
            20.0,
        )?;
        Ok(())
    }

    /// Load config from file
    pub fn load(path: &PathBuf) -> Result<Self, crate::Error> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content).map_err(|e| crate::Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load config from default location
    pub fn load_default() -> Result<Self, crate::Error> {
        let path = Self::default_path();
        if path.exists() {
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Save config to file
    pub fn save(&self, path: &PathBuf) -> Result<(), crate::Error> {
        let content = self.to_toml()?;

        // Create parent directories
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Save to default location
    pub fn save_default(&self) -> Result<(), crate::Error> {
        self.save(&Self::default_path())
    }

    /// Get default config path
    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .map(|h| h.join(".edge_scroll").join("config.toml"))
            .unwrap_or_else(|| PathBuf::from("config.toml"))
    }

    /// Generate TOML representation
    pub fn to_toml(&self) -> Result<String, crate::Error> {
        toml::to_string_pretty(self).map_err(|e| crate::Error::Config(e.to_string()))
    }

    /// Look up a dotted key such as `scroll.speed`
    pub fn get(&self, key: &str) -> Result<toml::Value, crate::Error> {
        let root = toml::Value::try_from(self).map_err(|e| crate::Error::Config(e.to_string()))?;
        key.split('.')
            .try_fold(&root, |value, part| value.get(part))
            .cloned()
            .ok_or_else(|| crate::Error::Config(format!("unknown key: {}", key)))
    }

    /// Set a dotted key from its string form, validating the result
    pub fn set(&mut self, key: &str, raw: &str) -> Result<(), crate::Error> {
        let mut root = toml::Value::try_from(&*self).map_err(|e| crate::Error::Config(e.to_string()))?;

        let (path, leaf) = match key.rsplit_once('.') {
            Some((path, leaf)) => (Some(path), leaf),
            None => (None, key),
        };
        let mut table = &mut root;
        for part in path.into_iter().flat_map(|p| p.split('.')) {
            table = table
                .get_mut(part)
                .ok_or_else(|| crate::Error::Config(format!("unknown key: {}", key)))?;
        }
        let slot = table
            .get_mut(leaf)
            .ok_or_else(|| crate::Error::Config(format!("unknown key: {}", key)))?;
        *slot = parse_value(slot, raw)?;

        let updated: Self = root
            .try_into()
            .map_err(|e: toml::de::Error| crate::Error::Config(e.to_string()))?;
        updated.validate()?;
        *self = updated;
        Ok(())
    }
}

/// Parse `raw` as the same TOML type as `current`
fn parse_value(current: &toml::Value, raw: &str) -> Result<toml::Value, crate::Error> {
    let invalid = || crate::Error::Config(format!("invalid value {:?}", raw));
    Ok(match current {
        toml::Value::Boolean(_) => toml::Value::Boolean(raw.parse().map_err(|_| invalid())?),
        toml::Value::Integer(_) => toml::Value::Integer(raw.parse().map_err(|_| invalid())?),
        toml::Value::Float(_) => toml::Value::Float(raw.parse().map_err(|_| invalid())?),
        toml::Value::String(_) => toml::Value::String(raw.to_string()),
        _ => return Err(invalid()),
    })
}
