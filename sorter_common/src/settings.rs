//! Machine settings file.
//!
//! Line-oriented `KEY=VALUE` format with three recognized keys:
//!
//! ```text
//! ORDER=F,OB,BOM
//! CAL_OFFSET=3620
//! CAL_REF=2520
//! ```
//!
//! Unknown keys and unknown workpiece tokens are skipped. A missing file is
//! created with defaults and the defaults are used.

use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::config::ConfigError;
use crate::consts::{ADC_DEFAULT_OFFSET, ADC_DEFAULT_REF};
use crate::role::Role;
use crate::workpiece::WorkpieceType;

/// Height-sensor calibration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Calibration {
    /// ADC value with an empty belt.
    pub offset: i32,
    /// ADC value at the reference height.
    pub reference: i32,
}

impl Default for Calibration {
    fn default() -> Self {
        Self {
            offset: ADC_DEFAULT_OFFSET,
            reference: ADC_DEFAULT_REF,
        }
    }
}

/// Contents of the settings file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MachineSettings {
    pub desired_order: Vec<WorkpieceType>,
    pub calibration: Calibration,
}

impl Default for MachineSettings {
    fn default() -> Self {
        Self {
            desired_order: vec![WorkpieceType::F, WorkpieceType::Ob, WorkpieceType::Bom],
            calibration: Calibration::default(),
        }
    }
}

impl MachineSettings {
    /// Parse settings text. Keys not present keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ParseError` if a calibration value is not an
    /// integer.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let mut settings = Self::default();

        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            let (key, value) = (key.trim(), value.trim());
            debug!("{key} = {value}");

            match key {
                "ORDER" => {
                    settings.desired_order = value
                        .split(',')
                        .filter_map(|token| token.trim().parse::<WorkpieceType>().ok())
                        .collect();
                }
                "CAL_OFFSET" => settings.calibration.offset = parse_int(key, value)?,
                "CAL_REF" => settings.calibration.reference = parse_int(key, value)?,
                _ => {}
            }
        }

        Ok(settings)
    }

    /// Load the settings file, creating it with defaults if missing.
    pub fn load_or_create(path: &Path) -> Result<Self, ConfigError> {
        match fs::read_to_string(path) {
            Ok(content) => {
                info!("Read settings file: {}", path.display());
                let settings = Self::parse(&content)?;
                info!(
                    "Configured workpiece order: {:?}, cal. offset: {}, cal. ref: {}",
                    settings.desired_order,
                    settings.calibration.offset,
                    settings.calibration.reference
                );
                Ok(settings)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!(
                    "Settings file {} does not exist -> create new and write default values",
                    path.display()
                );
                let settings = Self::default();
                settings.write(path)?;
                Ok(settings)
            }
            Err(e) => Err(ConfigError::ParseError(e.to_string())),
        }
    }

    /// Write the settings in file syntax.
    pub fn write(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .map_err(|e| ConfigError::WriteError(e.to_string()))?;
            }
        }
        fs::write(path, self.to_file_contents())
            .map_err(|e| ConfigError::WriteError(e.to_string()))
    }

    /// Render in file syntax.
    pub fn to_file_contents(&self) -> String {
        let order: Vec<&str> = self
            .desired_order
            .iter()
            .filter_map(|ty| ty.token())
            .collect();
        format!(
            "ORDER={}\nCAL_OFFSET={}\nCAL_REF={}\n",
            order.join(","),
            self.calibration.offset,
            self.calibration.reference
        )
    }
}

fn parse_int(key: &str, value: &str) -> Result<i32, ConfigError> {
    value
        .parse()
        .map_err(|_| ConfigError::ParseError(format!("{key}: not an integer: {value:?}")))
}

/// Resolved settings handed to the node core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeSettings {
    pub role: Role,
    pub pusher_mounted: bool,
    pub desired_order: Vec<WorkpieceType>,
    pub calibration: Calibration,
}

impl NodeSettings {
    pub fn resolve(role: Role, pusher_mounted: bool, machine: MachineSettings) -> Self {
        Self {
            role,
            pusher_mounted,
            desired_order: machine.desired_order,
            calibration: machine.calibration,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_all_keys() {
        let s = MachineSettings::parse("ORDER=BUM,F\nCAL_OFFSET=3500\nCAL_REF=2400\n").unwrap();
        assert_eq!(s.desired_order, vec![WorkpieceType::Bum, WorkpieceType::F]);
        assert_eq!(s.calibration, Calibration { offset: 3500, reference: 2400 });
    }

    #[test]
    fn unknown_order_tokens_are_skipped() {
        let s = MachineSettings::parse("ORDER=F,XX,OB,,BOM").unwrap();
        assert_eq!(
            s.desired_order,
            vec![WorkpieceType::F, WorkpieceType::Ob, WorkpieceType::Bom]
        );
    }

    #[test]
    fn missing_keys_keep_defaults() {
        let s = MachineSettings::parse("FOO=1\nnot a pair\n# comment\n").unwrap();
        assert_eq!(s, MachineSettings::default());
    }

    #[test]
    fn bad_calibration_is_rejected() {
        assert!(matches!(
            MachineSettings::parse("CAL_OFFSET=abc"),
            Err(ConfigError::ParseError(_))
        ));
    }

    #[test]
    fn file_contents_parse_back() {
        let s = MachineSettings::default();
        assert_eq!(s.to_file_contents().lines().next(), Some("ORDER=F,OB,BOM"));
        assert_eq!(MachineSettings::parse(&s.to_file_contents()).unwrap(), s);
    }
}
