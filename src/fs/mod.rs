//! This module contains utilities to read & write the settings file, which is
//! just a JSON document holding the grid dimensions, the display displacement
//! scalar, and the tunable kernel parameters. Loaded settings are validated
//! against the documented parameter bounds before they reach the GPU.

use std::path::PathBuf;

use crate::constants::SIMULATION_WORK_GROUP_SIZE;
use crate::constants::{DEFAULT_SIMULATION_HEIGHT, DEFAULT_SIMULATION_WIDTH};

pub mod sim_settings;

pub use sim_settings::{DisplaySettings, Param, SimSettings};

#[derive(Debug, Clone, PartialEq, facet::Facet)]
pub struct Settings {
    /// Grid width in cells. Fixed for the lifetime of the render targets.
    pub width: u32,
    /// Grid height in cells.
    pub height: u32,
    /// Scalar handed to the display shader to exaggerate water depth.
    pub displacement: f32,
    /// The kernel parameters plus their editing increments.
    pub params: DisplaySettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            width: DEFAULT_SIMULATION_WIDTH,
            height: DEFAULT_SIMULATION_HEIGHT,
            displacement: 0.2,
            params: DisplaySettings::default(),
        }
    }
}

impl Settings {
    pub fn validate(&self) -> Result<(), String> {
        if self.width < SIMULATION_WORK_GROUP_SIZE || self.height < SIMULATION_WORK_GROUP_SIZE {
            return Err(format!(
                "grid {}x{} is smaller than one {}x{} workgroup",
                self.width, self.height, SIMULATION_WORK_GROUP_SIZE, SIMULATION_WORK_GROUP_SIZE,
            ));
        }
        if self.displacement < 0.0 {
            return Err(format!("displacement = {} is negative", self.displacement));
        }
        self.params.current.validate()
    }

    /// Cells beyond the last full workgroup in each direction. Dispatches
    /// cover `width / 8 x height / 8` workgroups with integer division, so
    /// these trailing cells are never simulated.
    pub fn dropped_cells(&self) -> (u32, u32) {
        (
            self.width % SIMULATION_WORK_GROUP_SIZE,
            self.height % SIMULATION_WORK_GROUP_SIZE,
        )
    }
}

fn write_settings(mut w: impl std::io::Write, settings: &Settings) -> std::io::Result<()> {
    let mut buf = Vec::<u8>::new();
    facet_json::to_writer(settings, &mut buf)
        .map_err(|err| std::io::Error::other(format!("{:?}", err)))?;
    w.write_all(&buf)
}

fn read_settings(mut r: impl std::io::Read) -> std::io::Result<Settings> {
    let mut buf = Vec::<u8>::new();
    r.read_to_end(&mut buf)?;
    let settings: Settings =
        facet_json::from_slice(&buf).map_err(|err| std::io::Error::other(format!("{}", err)))?;
    settings.validate().map_err(std::io::Error::other)?;
    Ok(settings)
}

/// The settings currently in effect, plus where they persist to disk.
pub struct SettingsFile {
    /// Where we should persist our settings to disk.
    pub filename: Option<PathBuf>,
    pub settings: Settings,
}

impl SettingsFile {
    fn write(&self) -> std::io::Result<()> {
        let filename = match self.filename.as_ref() {
            Some(filename) => filename,
            None => return Ok(()),
        };

        let file = std::fs::File::create(filename)?;
        write_settings(file, &self.settings)
    }

    fn read(path: PathBuf) -> std::io::Result<Self> {
        let file = std::fs::File::open(&path)?;
        let settings = read_settings(file)?;

        Ok(Self {
            filename: Some(path),
            settings,
        })
    }

    /// Reads the given settings file, falling back to defaults if it is
    /// missing or invalid. The filename is kept either way so a later save
    /// still lands in the requested place.
    pub fn read_or_default(path: PathBuf) -> Self {
        Self::read(path.clone()).unwrap_or_else(|e| {
            log::warn!("could not load settings from {}: {e}", path.display());
            log::warn!("falling back to default settings");
            Self {
                filename: Some(path),
                settings: Settings::default(),
            }
        })
    }

    pub fn save(&self) {
        match self.write() {
            Ok(()) => log::info!("settings saved"),
            Err(e) => log::error!("error saving settings: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settings_validate() {
        assert!(Settings::default().validate().is_ok());
    }

    #[test]
    fn undersized_grid_is_rejected() {
        let mut settings = Settings::default();
        settings.width = 4;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn out_of_range_parameter_is_rejected_at_the_boundary() {
        let mut settings = Settings::default();
        settings.params.current.alpha = 11.0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn dropped_cells_reports_the_truncated_remainder() {
        let mut settings = Settings::default();
        assert_eq!(settings.dropped_cells(), (0, 0));
        settings.width = 1030;
        settings.height = 1027;
        assert_eq!(settings.dropped_cells(), (6, 3));
    }

    #[test]
    fn settings_round_trip_through_json() {
        let settings = Settings::default();
        let mut buf = Vec::new();
        write_settings(&mut buf, &settings).unwrap();
        let read_back = read_settings(buf.as_slice()).unwrap();
        assert_eq!(read_back, settings);
    }

    #[test]
    fn invalid_json_settings_are_rejected() {
        let mut settings = Settings::default();
        settings.params.current.g = 200.0;
        let mut buf = Vec::new();
        write_settings(&mut buf, &settings).unwrap();
        assert!(read_settings(buf.as_slice()).is_err());
    }
}
