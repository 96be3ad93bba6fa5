use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

pub const DEFAULT_CONSENSUS_THRESHOLD: f64 = 0.5;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),
    #[error("Invalid value for '{parameter}': {reason}")]
    InvalidValue {
        parameter: &'static str,
        reason: String,
    },
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("TOML parsing error for '{path}': {source}")]
    Toml {
        path: String,
        source: toml::de::Error,
    },
}

/// How a residue graph is built from coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphConfig {
    /// Contact-type selector, e.g. `Cb`, `BB+SC` or `BB/SC`.
    pub contact_type: String,
    /// Distance cutoff in Angstroms.
    pub cutoff: f64,
}

#[derive(Default)]
pub struct GraphConfigBuilder {
    contact_type: Option<String>,
    cutoff: Option<f64>,
}

impl GraphConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contact_type(mut self, contact_type: &str) -> Self {
        self.contact_type = Some(contact_type.to_string());
        self
    }
    pub fn cutoff(mut self, cutoff: f64) -> Self {
        self.cutoff = Some(cutoff);
        self
    }

    pub fn build(self) -> Result<GraphConfig, ConfigError> {
        let contact_type = self
            .contact_type
            .ok_or(ConfigError::MissingParameter("contact_type"))?;
        let cutoff = self.cutoff.ok_or(ConfigError::MissingParameter("cutoff"))?;
        if !cutoff.is_finite() || cutoff <= 0.0 {
            return Err(ConfigError::InvalidValue {
                parameter: "cutoff",
                reason: format!("must be a finite positive distance (got {cutoff})"),
            });
        }
        Ok(GraphConfig {
            contact_type,
            cutoff,
        })
    }
}

/// How templates are combined into a consensus graph.
#[derive(Debug, Clone, PartialEq)]
pub struct ConsensusConfig {
    /// Fraction of templates that must agree on a contact, in `(0, 1]`.
    pub threshold: f64,
}

impl Default for ConsensusConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_CONSENSUS_THRESHOLD,
        }
    }
}

#[derive(Default)]
pub struct ConsensusConfigBuilder {
    threshold: Option<f64>,
}

impl ConsensusConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn threshold(mut self, threshold: f64) -> Self {
        self.threshold = Some(threshold);
        self
    }

    pub fn build(self) -> Result<ConsensusConfig, ConfigError> {
        let threshold = self.threshold.unwrap_or(DEFAULT_CONSENSUS_THRESHOLD);
        if !(threshold > 0.0 && threshold <= 1.0) {
            return Err(ConfigError::InvalidValue {
                parameter: "threshold",
                reason: format!("must lie in (0, 1] (got {threshold})"),
            });
        }
        Ok(ConsensusConfig { threshold })
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawGraphSection {
    contact_type: Option<String>,
    cutoff: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConsensusSection {
    threshold: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawAnalysisConfig {
    graph: RawGraphSection,
    #[serde(default)]
    consensus: RawConsensusSection,
}

/// Graph and consensus settings read from one TOML file:
///
/// ```toml
/// [graph]
/// contact_type = "Cb"
/// cutoff = 8.0
///
/// [consensus]
/// threshold = 0.5
/// ```
///
/// The `[consensus]` section is optional.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisConfig {
    pub graph: GraphConfig,
    pub consensus: ConsensusConfig,
}

impl AnalysisConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
        Self::from_toml(&content, &path.to_string_lossy())
    }

    pub fn from_toml(content: &str, origin: &str) -> Result<Self, ConfigError> {
        let raw: RawAnalysisConfig = toml::from_str(content).map_err(|e| ConfigError::Toml {
            path: origin.to_string(),
            source: e,
        })?;

        let mut graph = GraphConfigBuilder::new();
        if let Some(contact_type) = raw.graph.contact_type {
            graph = graph.contact_type(&contact_type);
        }
        if let Some(cutoff) = raw.graph.cutoff {
            graph = graph.cutoff(cutoff);
        }
        let mut consensus = ConsensusConfigBuilder::new();
        if let Some(threshold) = raw.consensus.threshold {
            consensus = consensus.threshold(threshold);
        }

        Ok(Self {
            graph: graph.build()?,
            consensus: consensus.build()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    mod builders {
        use super::*;

        #[test]
        fn graph_config_requires_every_parameter() {
            let result = GraphConfigBuilder::new().cutoff(8.0).build();
            assert!(matches!(
                result,
                Err(ConfigError::MissingParameter("contact_type"))
            ));
            let result = GraphConfigBuilder::new().contact_type("Ca").build();
            assert!(matches!(result, Err(ConfigError::MissingParameter("cutoff"))));
        }

        #[test]
        fn graph_config_rejects_non_positive_cutoffs() {
            for cutoff in [0.0, -1.0, f64::INFINITY, f64::NAN] {
                let result = GraphConfigBuilder::new()
                    .contact_type("Ca")
                    .cutoff(cutoff)
                    .build();
                assert!(matches!(
                    result,
                    Err(ConfigError::InvalidValue {
                        parameter: "cutoff",
                        ..
                    })
                ));
            }
        }

        #[test]
        fn consensus_threshold_defaults_to_one_half() {
            let config = ConsensusConfigBuilder::new().build().unwrap();
            assert_eq!(config, ConsensusConfig::default());
            assert_eq!(config.threshold, 0.5);
        }

        #[test]
        fn consensus_threshold_must_lie_in_unit_interval() {
            assert!(ConsensusConfigBuilder::new().threshold(1.0).build().is_ok());
            for threshold in [0.0, 1.01, f64::NAN] {
                assert!(
                    ConsensusConfigBuilder::new()
                        .threshold(threshold)
                        .build()
                        .is_err()
                );
            }
        }
    }

    mod loading {
        use super::*;

        #[test]
        fn load_reads_both_sections() {
            let dir = tempdir().unwrap();
            let path = dir.path().join("analysis.toml");
            fs::write(
                &path,
                "[graph]\ncontact_type = \"BB/SC\"\ncutoff = 4.5\n\n[consensus]\nthreshold = 0.3\n",
            )
            .unwrap();

            let config = AnalysisConfig::load(&path).unwrap();
            assert_eq!(config.graph.contact_type, "BB/SC");
            assert_eq!(config.graph.cutoff, 4.5);
            assert_eq!(config.consensus.threshold, 0.3);
        }

        #[test]
        fn consensus_section_is_optional() {
            let config =
                AnalysisConfig::from_toml("[graph]\ncontact_type = \"Ca\"\ncutoff = 8.0\n", "inline")
                    .unwrap();
            assert_eq!(config.consensus, ConsensusConfig::default());
        }

        #[test]
        fn missing_values_surface_as_missing_parameters() {
            let result = AnalysisConfig::from_toml("[graph]\ncutoff = 8.0\n", "inline");
            assert!(matches!(
                result,
                Err(ConfigError::MissingParameter("contact_type"))
            ));
        }

        #[test]
        fn unknown_keys_are_rejected() {
            let result = AnalysisConfig::from_toml(
                "[graph]\ncontact_type = \"Ca\"\ncutoff = 8.0\nradius = 3\n",
                "inline",
            );
            assert!(matches!(result, Err(ConfigError::Toml { .. })));
        }

        #[test]
        fn missing_file_is_an_io_error() {
            let dir = tempdir().unwrap();
            let result = AnalysisConfig::load(&dir.path().join("absent.toml"));
            assert!(matches!(result, Err(ConfigError::Io { .. })));
        }
    }
}
