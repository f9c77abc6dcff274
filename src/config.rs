use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::core::{EntityKind, DEFAULT_PRIORITY};
use crate::error::{PydocsError, Result};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Tree construction defaults
    pub inspect: InspectConfig,

    /// Terminal output settings
    pub display: DisplayConfig,

    /// Kind disambiguation
    pub classifier: ClassifierConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InspectConfig {
    /// Maximum tree depth below the entry point
    pub max_depth: usize,

    /// Show names starting with `_`
    pub include_private: bool,

    /// Show members declared in other modules
    pub include_imported: bool,

    /// Load package sub-modules that have not been imported yet
    pub discover_submodules: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Use ANSI colors
    pub color: bool,

    /// Docstring characters shown in the tree header
    pub doc_preview_chars: usize,

    /// Characters kept from a value's representation
    pub value_repr_chars: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Kind rules in the order they are tried
    pub priority: Vec<EntityKind>,
}

impl Default for InspectConfig {
    fn default() -> Self {
        Self {
            max_depth: 2,
            include_private: false,
            include_imported: false,
            discover_submodules: false,
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            color: true,
            doc_preview_chars: 500,
            value_repr_chars: 80,
        }
    }
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            priority: DEFAULT_PRIORITY.to_vec(),
        }
    }
}

impl Config {
    /// Load configuration from file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| PydocsError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration with fallback to default
    pub fn load_or_default<P: AsRef<Path>>(path: Option<P>) -> Result<Self> {
        match path {
            // An explicit path must exist
            Some(p) => Self::load(p),
            None => {
                let candidates = ["pydocs.toml", ".pydocs.toml"];

                for candidate in &candidates {
                    if Path::new(candidate).exists() {
                        return Self::load(candidate);
                    }
                }

                Ok(Self::default())
            }
        }
    }

    fn validate(&self) -> Result<()> {
        if self.classifier.priority.is_empty() {
            return Err(PydocsError::Config(
                "classifier.priority must name at least one kind".to_string(),
            ));
        }
        if self.display.value_repr_chars < 4 {
            return Err(PydocsError::Config(
                "display.value_repr_chars must be at least 4".to_string(),
            ));
        }
        Ok(())
    }
}
