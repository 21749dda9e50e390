//! Serializable decomposition configuration.
//!
//! `DecomposeConfig` lets a whole decomposition setup be saved and loaded
//! as TOML or JSON files. This enables:
//!
//! - Reproducible decomposition workflows
//! - User-editable configuration files
//! - Batch processing with the same settings
//!
//! # Example TOML
//!
//! ```toml
//! name = "printer-grid"
//! description = "Split for a 220 mm printer bed"
//!
//! [slicing]
//! mode = "grid"
//! envelope = [220.0, 220.0, 250.0]
//!
//! [hollow]
//! wall_thickness = 2.5
//! drain_hole = true
//!
//! [connectors]
//! spacing = 30.0
//!
//! [labels]
//! plate_size = 15.0
//! ```

use crate::connector::ConnectorConfig;
use crate::evaluator::BooleanEvaluator;
use crate::hollow::HollowConfig;
use crate::label::LabelConfig;
use crate::partition::{GridSlicing, SlicingConfig};
use crate::pipeline::Decomposer;

use nalgebra::Vector3;

/// A complete decomposition setup, ready to serialize.
///
/// Optional sections map onto the optional pipeline stages: a missing
/// `[hollow]`, `[connectors]`, or `[labels]` table leaves that stage off.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct DecomposeConfig {
    /// Optional name for this setup.
    #[serde(default)]
    pub name: Option<String>,
    /// Optional description of what this setup is for.
    #[serde(default)]
    pub description: Option<String>,
    /// How the volume is divided.
    #[serde(default)]
    pub slicing: SlicingConfig,
    /// Hollow the solid before cutting, when present.
    #[serde(default)]
    pub hollow: Option<HollowConfig>,
    /// Add pegs and sockets, when present.
    #[serde(default)]
    pub connectors: Option<ConnectorConfig>,
    /// Attach label plates, when present.
    #[serde(default)]
    pub labels: Option<LabelConfig>,
}

impl DecomposeConfig {
    /// Create a configuration with default slicing and no optional stages.
    pub fn new() -> Self {
        Self {
            name: None,
            description: None,
            slicing: SlicingConfig::default(),
            hollow: None,
            connectors: None,
            labels: None,
        }
    }

    /// Create a configuration with a name.
    pub fn with_name(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::new()
        }
    }

    /// Set the description.
    pub fn description(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(desc.into());
        self
    }

    /// Set the slicing mode.
    pub fn slicing(mut self, slicing: SlicingConfig) -> Self {
        self.slicing = slicing;
        self
    }

    /// Enable hollowing.
    pub fn hollowing(mut self, config: HollowConfig) -> Self {
        self.hollow = Some(config);
        self
    }

    /// Enable connector synthesis.
    pub fn connectors(mut self, config: ConnectorConfig) -> Self {
        self.connectors = Some(config);
        self
    }

    /// Enable label plates.
    pub fn labels(mut self, config: LabelConfig) -> Self {
        self.labels = Some(config);
        self
    }

    /// Build a [`Decomposer`] carrying this configuration.
    pub fn decomposer<'a>(&self, evaluator: &'a dyn BooleanEvaluator) -> Decomposer<'a> {
        let mut decomposer = Decomposer::new(evaluator).slicing(self.slicing.clone());
        if let Some(hollow) = &self.hollow {
            decomposer = decomposer.hollowing(hollow.clone());
        }
        if let Some(connectors) = &self.connectors {
            decomposer = decomposer.connectors(connectors.clone());
        }
        if let Some(labels) = &self.labels {
            decomposer = decomposer.labels(labels.clone());
        }
        decomposer
    }

    /// Load configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is invalid or doesn't match the schema.
    pub fn from_toml(toml_str: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(toml_str)
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file can't be read or the TOML is invalid.
    pub fn from_toml_file(path: impl AsRef<std::path::Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        Ok(toml::from_str(&contents)?)
    }

    /// Serialize to TOML string.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Save configuration to a TOML file.
    pub fn save_toml(&self, path: impl AsRef<std::path::Path>) -> Result<(), ConfigError> {
        let toml_str = self.to_toml()?;
        std::fs::write(path, toml_str)?;
        Ok(())
    }

    /// Load configuration from a JSON string.
    pub fn from_json(json_str: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json_str)
    }

    /// Serialize to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Preset: grid split for a given printer envelope, with connectors
    /// and labels so the parts reassemble.
    pub fn preset_printer_grid(envelope: Vector3<f64>) -> Self {
        Self::with_name("printer-grid")
            .description("Split to fit a printer envelope, with assembly connectors")
            .slicing(SlicingConfig::Grid(GridSlicing { envelope }))
            .connectors(ConnectorConfig::default())
            .labels(LabelConfig::default())
    }

    /// Preset: hollow resin print with a drain hole, split on the default
    /// grid.
    pub fn preset_hollow_print() -> Self {
        Self::with_name("hollow-print")
            .description("Hollow with drain hole, then split and label")
            .hollowing(HollowConfig {
                drain_hole: true,
                ..Default::default()
            })
            .connectors(ConnectorConfig::default())
            .labels(LabelConfig::default())
    }
}

impl Default for DecomposeConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Errors that can occur when loading or saving decomposition
/// configurations.
#[derive(Debug)]
pub enum ConfigError {
    /// I/O error reading or writing file.
    Io(std::io::Error),
    /// TOML parsing error.
    TomlParse(toml::de::Error),
    /// TOML serialization error.
    TomlSerialize(toml::ser::Error),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {}", e),
            Self::TomlParse(e) => write!(f, "TOML parse error: {}", e),
            Self::TomlSerialize(e) => write!(f, "TOML serialize error: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::TomlParse(e) => Some(e),
            Self::TomlSerialize(e) => Some(e),
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(e: toml::de::Error) -> Self {
        Self::TomlParse(e)
    }
}

impl From<toml::ser::Error> for ConfigError {
    fn from(e: toml::ser::Error) -> Self {
        Self::TomlSerialize(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::partition::{AxisSplit, ManualSlicing};

    #[test]
    fn test_minimal_toml() {
        let config = DecomposeConfig::from_toml("").unwrap();
        assert!(config.name.is_none());
        assert!(matches!(config.slicing, SlicingConfig::Grid(_)));
        assert!(config.hollow.is_none());
        assert!(config.connectors.is_none());
        assert!(config.labels.is_none());
    }

    #[test]
    fn test_grid_slicing_toml() {
        let toml_str = r#"
            name = "bed-split"

            [slicing]
            mode = "grid"
            envelope = [220.0, 220.0, 250.0]
        "#;
        let config = DecomposeConfig::from_toml(toml_str).unwrap();
        assert_eq!(config.name.as_deref(), Some("bed-split"));
        match &config.slicing {
            SlicingConfig::Grid(grid) => {
                assert!((grid.envelope.x - 220.0).abs() < 1e-12);
                assert!((grid.envelope.z - 250.0).abs() < 1e-12);
            }
            other => panic!("expected grid slicing, got {other:?}"),
        }
    }

    #[test]
    fn test_manual_slicing_toml_with_defaults() {
        let toml_str = r#"
            [slicing]
            mode = "manual"
            x = { enabled = true, offset = 60.0 }
        "#;
        let config = DecomposeConfig::from_toml(toml_str).unwrap();
        match &config.slicing {
            SlicingConfig::Manual(manual) => {
                assert!(manual.x.enabled);
                assert!((manual.x.offset - 60.0).abs() < 1e-12);
                assert!(!manual.y.enabled);
                assert!(!manual.z.enabled);
            }
            other => panic!("expected manual slicing, got {other:?}"),
        }
    }

    #[test]
    fn test_partial_stage_tables_fill_defaults() {
        let toml_str = r#"
            [hollow]
            wall_thickness = 3.0

            [connectors]
            spacing = 30.0

            [labels]
        "#;
        let config = DecomposeConfig::from_toml(toml_str).unwrap();

        let hollow = config.hollow.unwrap();
        assert!((hollow.wall_thickness - 3.0).abs() < 1e-12);
        assert!(!hollow.drain_hole);

        let connectors = config.connectors.unwrap();
        assert!((connectors.spacing - 30.0).abs() < 1e-12);
        assert!((connectors.peg_diameter - 5.0).abs() < 1e-12);

        let labels = config.labels.unwrap();
        assert!((labels.plate_size - 20.0).abs() < 1e-12);
    }

    #[test]
    fn test_toml_round_trip() {
        let config = DecomposeConfig::preset_hollow_print().slicing(SlicingConfig::Manual(
            ManualSlicing {
                y: AxisSplit {
                    enabled: true,
                    offset: 42.0,
                },
                ..Default::default()
            },
        ));

        let toml_str = config.to_toml().unwrap();
        let back = DecomposeConfig::from_toml(&toml_str).unwrap();

        assert_eq!(back.name.as_deref(), Some("hollow-print"));
        assert!(back.hollow.unwrap().drain_hole);
        match back.slicing {
            SlicingConfig::Manual(manual) => {
                assert!((manual.y.offset - 42.0).abs() < 1e-12);
            }
            other => panic!("expected manual slicing, got {other:?}"),
        }
    }

    #[test]
    fn test_json_round_trip() {
        let config = DecomposeConfig::preset_printer_grid(Vector3::new(220.0, 220.0, 250.0));
        let json = config.to_json().unwrap();
        let back = DecomposeConfig::from_json(&json).unwrap();

        assert_eq!(back.name.as_deref(), Some("printer-grid"));
        assert!(back.connectors.is_some());
        assert!(back.labels.is_some());
        assert!(back.hollow.is_none());
    }

    #[test]
    fn test_unknown_mode_rejected() {
        let toml_str = r#"
            [slicing]
            mode = "spiral"
        "#;
        assert!(DecomposeConfig::from_toml(toml_str).is_err());
    }

    #[test]
    fn test_decomposer_wiring() {
        use crate::evaluator::{BooleanOp, EvaluatorError};
        use crate::primitives::box_mesh;
        use crate::types::{Aabb, Mesh};
        use nalgebra::Point3;

        struct Passthrough;
        impl BooleanEvaluator for Passthrough {
            fn evaluate(
                &self,
                a: &Mesh,
                b: &Mesh,
                op: BooleanOp,
            ) -> Result<Mesh, EvaluatorError> {
                Ok(match op {
                    BooleanOp::Intersection => b.clone(),
                    _ => a.clone(),
                })
            }
        }

        let config = DecomposeConfig::with_name("wiring").labels(LabelConfig::default());
        let evaluator = Passthrough;
        let result = config
            .decomposer(&evaluator)
            .run(&box_mesh(&Aabb::new(
                Point3::origin(),
                Point3::new(100.0, 100.0, 100.0),
            )))
            .unwrap();

        assert_eq!(result.stats.parts_produced, 1);
        assert_eq!(result.stats.labels_placed, 1);
    }
}
