use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::container::write_atomically;
use crate::types::{Location, LocationParseError};

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Settings I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("Settings file is invalid: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Unknown setting '{0}'")]
    UnknownKey(String),
    #[error("Invalid value '{value}' for '{key}', expected true or false")]
    InvalidBool { key: String, value: String },
    #[error(transparent)]
    InvalidLocation(#[from] LocationParseError),
}

/// User preferences shared between the menu views and the widget.
///
/// `selected_location` is kept as the raw key so an unknown value surfaces as a
/// configuration error when the menu is requested.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub selected_location: String,
    pub show_whole_menu: bool,
    pub show_main_dish: bool,
    pub show_soup: bool,
    pub show_salad: bool,
    pub show_menu_picker_on_main_view: bool,
    pub show_location_picker_on_main_view: bool,
    pub show_pay_link_on_main_view: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            selected_location: Location::default().key().to_string(),
            show_whole_menu: true,
            show_main_dish: true,
            show_soup: true,
            show_salad: false,
            show_menu_picker_on_main_view: false,
            show_location_picker_on_main_view: false,
            show_pay_link_on_main_view: false,
        }
    }
}

impl Settings {
    pub const KEYS: [&'static str; 8] = [
        "selectedLocation",
        "showWholeMenu",
        "showMainDish",
        "showSoup",
        "showSalad",
        "showMenuPickerOnMainView",
        "showLocationPickerOnMainView",
        "showPayLinkOnMainView",
    ];

    pub fn location(&self) -> Result<Location, LocationParseError> {
        self.selected_location.parse()
    }

    /// Updates one setting by its stored (camelCase) name.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), SettingsError> {
        if key == "selectedLocation" {
            let location: Location = value.parse()?;
            self.selected_location = location.key().to_string();
            return Ok(());
        }

        let flag = match key {
            "showWholeMenu" => &mut self.show_whole_menu,
            "showMainDish" => &mut self.show_main_dish,
            "showSoup" => &mut self.show_soup,
            "showSalad" => &mut self.show_salad,
            "showMenuPickerOnMainView" => &mut self.show_menu_picker_on_main_view,
            "showLocationPickerOnMainView" => &mut self.show_location_picker_on_main_view,
            "showPayLinkOnMainView" => &mut self.show_pay_link_on_main_view,
            _ => return Err(SettingsError::UnknownKey(key.to_string())),
        };
        *flag = value.parse().map_err(|_| SettingsError::InvalidBool {
            key: key.to_string(),
            value: value.to_string(),
        })?;
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Missing file means defaults.
    pub fn load(&self) -> Result<Settings, SettingsError> {
        match fs::read_to_string(&self.path) {
            Ok(content) => Ok(serde_json::from_str(&content)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Settings::default()),
            Err(e) => Err(e.into()),
        }
    }

    /// Changes one setting on disk. An unreadable file is left untouched.
    pub fn update(&self, key: &str, value: &str) -> Result<Settings, SettingsError> {
        let mut settings = self.load()?;
        settings.set(key, value)?;
        self.save(&settings)?;
        Ok(settings)
    }

    pub fn save(&self, settings: &Settings) -> Result<(), SettingsError> {
        let json = serde_json::to_vec_pretty(settings)?;
        write_atomically(&self.path, &json)?;
        log::debug!("Saved settings to {}", self.path.display());
        Ok(())
    }
}
