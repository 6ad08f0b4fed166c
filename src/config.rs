//! TOML machine definitions.
//!
//! ```toml
//! initial_state = "parked"
//! strict = true
//!
//! [transitions.ignite]
//! parked = "idling"
//! stalled = "stalled"
//!
//! [transitions.turn_off]
//! "*" = "parked"
//!
//! [rules.ignite]
//! roles = ["driver"]
//! depends = "has_key"
//! ```
//!
//! With `strict = true` the definition is also run through
//! [`enforcement::validate`](crate::enforcement::validate).

use crate::builder::{BuildError, DefinitionBuilder};
use crate::core::{RuleSet, State};
use crate::enforcement::{self, DefinitionViolation};
use crate::machine::MachineDefinition;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use stillwater::validation::Validation;
use thiserror::Error;

/// Errors raised while loading a definition file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read definition file {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse definition: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid definition: {0}")]
    Build(#[from] BuildError),

    #[error("Definition has {} violation(s): {}", .0.len(), describe(.0))]
    Invalid(Vec<DefinitionViolation>),
}

fn describe(violations: &[DefinitionViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// On-disk shape of a machine definition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DefinitionFile {
    #[serde(default)]
    pub initial_state: Option<State>,

    /// Run the strict validation pass after building
    #[serde(default)]
    pub strict: bool,

    /// Transition name to `source = destination` entries
    #[serde(default)]
    pub transitions: BTreeMap<String, BTreeMap<State, State>>,

    #[serde(default)]
    pub rules: RuleSet,
}

impl DefinitionFile {
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    /// Build the definition this file describes.
    pub fn into_definition(self) -> Result<MachineDefinition, ConfigError> {
        let mut builder = DefinitionBuilder::new().rules(self.rules);
        if let Some(initial) = self.initial_state {
            builder = builder.initial(initial);
        }
        for (name, entries) in self.transitions {
            builder = builder.transition(name, entries);
        }
        let definition = builder.build()?;

        if self.strict {
            if let Validation::Failure(violations) = enforcement::validate(&definition) {
                return Err(ConfigError::Invalid(violations.iter().cloned().collect()));
            }
        }

        tracing::debug!(
            transitions = definition.table().len(),
            rules = definition.rules().len(),
            "loaded machine definition"
        );
        Ok(definition)
    }
}

impl MachineDefinition {
    /// Parse and build a definition from TOML text.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        DefinitionFile::from_toml_str(contents)?.into_definition()
    }

    /// Load a definition from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::info!("Loading machine definition from {:?}", path);
        Self::from_toml_str(&contents)
    }
}
