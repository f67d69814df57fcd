use crate::core::units::Unit;
use std::collections::HashSet;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),

    #[error("Variable '{name}' has inverted bounds: lower {lower} > upper {upper}")]
    InvertedBounds { name: String, lower: f64, upper: f64 },

    #[error("Variable '{name}' initial value {initial} lies outside [{lower}, {upper}]")]
    InitialOutOfBounds {
        name: String,
        initial: f64,
        lower: f64,
        upper: f64,
    },

    #[error("Scale factor for '{name}' must be non-zero")]
    ZeroScale { name: String },

    #[error("Duplicate variable '{0}'")]
    DuplicateVariable(String),

    #[error("Duplicate constraint '{0}'")]
    DuplicateConstraint(String),

    #[error("No alias entry for '{0}'")]
    MissingAlias(String),

    #[error("Duplicate alias entry for '{0}'")]
    DuplicateAlias(String),

    #[error("Alias entry '{0}' has no target paths")]
    EmptyAlias(String),

    #[error("Unknown comparison operator '{0}' (expected '>', '<', or '=')")]
    UnknownComparison(String),
}

/// One scalar design variable with its bounds, optimizer scale, and unit.
#[derive(Debug, Clone, PartialEq)]
pub struct VariableDescriptor {
    pub name: String,
    pub initial: f64,
    pub lower: f64,
    pub upper: f64,
    pub scale: f64,
    pub units: Unit,
}

/// Constraint sense against its edge value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Greater,
    Less,
    Equal,
}

impl Comparison {
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        match raw {
            ">" => Ok(Comparison::Greater),
            "<" => Ok(Comparison::Less),
            "=" => Ok(Comparison::Equal),
            other => Err(ConfigError::UnknownComparison(other.to_string())),
        }
    }
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            Comparison::Greater => ">",
            Comparison::Less => "<",
            Comparison::Equal => "=",
        };
        f.write_str(symbol)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ObjectiveSpec {
    pub name: String,
    pub scale: f64,
    pub units: Unit,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConstraintSpec {
    pub name: String,
    pub comparison: Comparison,
    pub edge: f64,
    pub scale: f64,
    pub units: Unit,
}

/// Maps a variable, objective, or constraint name to the dotted paths it
/// reads or writes. Targets are raw strings here; they are resolved into
/// typed plans when the nexus is built.
#[derive(Debug, Clone, PartialEq)]
pub struct AliasEntry {
    pub name: String,
    pub targets: Vec<String>,
}

/// The validated, immutable problem description for one study.
#[derive(Debug, Clone)]
pub struct StudyConfig {
    variables: Vec<VariableDescriptor>,
    objective: ObjectiveSpec,
    constraints: Vec<ConstraintSpec>,
    aliases: Vec<AliasEntry>,
}

impl StudyConfig {
    pub fn builder() -> StudyConfigBuilder {
        StudyConfigBuilder::default()
    }

    pub fn variables(&self) -> &[VariableDescriptor] {
        &self.variables
    }

    pub fn objective(&self) -> &ObjectiveSpec {
        &self.objective
    }

    pub fn constraints(&self) -> &[ConstraintSpec] {
        &self.constraints
    }

    pub fn aliases(&self) -> &[AliasEntry] {
        &self.aliases
    }

    pub fn alias_for(&self, name: &str) -> Option<&AliasEntry> {
        self.aliases.iter().find(|entry| entry.name == name)
    }
}

#[derive(Default)]
pub struct StudyConfigBuilder {
    variables: Vec<VariableDescriptor>,
    objective: Option<ObjectiveSpec>,
    constraints: Vec<ConstraintSpec>,
    aliases: Vec<AliasEntry>,
}

impl StudyConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn variable(mut self, descriptor: VariableDescriptor) -> Self {
        self.variables.push(descriptor);
        self
    }

    pub fn objective(mut self, spec: ObjectiveSpec) -> Self {
        self.objective = Some(spec);
        self
    }

    pub fn constraint(mut self, spec: ConstraintSpec) -> Self {
        self.constraints.push(spec);
        self
    }

    pub fn alias(mut self, name: &str, targets: &[&str]) -> Self {
        self.aliases.push(AliasEntry {
            name: name.to_string(),
            targets: targets.iter().map(|t| t.to_string()).collect(),
        });
        self
    }

    pub fn alias_entry(mut self, entry: AliasEntry) -> Self {
        self.aliases.push(entry);
        self
    }

    pub fn build(self) -> Result<StudyConfig, ConfigError> {
        let objective = self
            .objective
            .ok_or(ConfigError::MissingParameter("objective"))?;
        if self.variables.is_empty() {
            return Err(ConfigError::MissingParameter("variables"));
        }

        let mut seen = HashSet::new();
        for var in &self.variables {
            if !seen.insert(var.name.as_str()) {
                return Err(ConfigError::DuplicateVariable(var.name.clone()));
            }
            if var.lower > var.upper {
                return Err(ConfigError::InvertedBounds {
                    name: var.name.clone(),
                    lower: var.lower,
                    upper: var.upper,
                });
            }
            if var.initial < var.lower || var.initial > var.upper {
                return Err(ConfigError::InitialOutOfBounds {
                    name: var.name.clone(),
                    initial: var.initial,
                    lower: var.lower,
                    upper: var.upper,
                });
            }
            if var.scale == 0.0 {
                return Err(ConfigError::ZeroScale {
                    name: var.name.clone(),
                });
            }
        }

        let mut seen = HashSet::new();
        for constraint in &self.constraints {
            if !seen.insert(constraint.name.as_str()) {
                return Err(ConfigError::DuplicateConstraint(constraint.name.clone()));
            }
            if constraint.scale == 0.0 {
                return Err(ConfigError::ZeroScale {
                    name: constraint.name.clone(),
                });
            }
        }
        if objective.scale == 0.0 {
            return Err(ConfigError::ZeroScale {
                name: objective.name.clone(),
            });
        }

        let mut seen = HashSet::new();
        for entry in &self.aliases {
            if !seen.insert(entry.name.as_str()) {
                return Err(ConfigError::DuplicateAlias(entry.name.clone()));
            }
            if entry.targets.is_empty() {
                return Err(ConfigError::EmptyAlias(entry.name.clone()));
            }
        }

        // Every name the optimizer exchanges with the configuration trees
        // must be routable.
        let aliased: HashSet<&str> = self.aliases.iter().map(|e| e.name.as_str()).collect();
        for var in &self.variables {
            if !aliased.contains(var.name.as_str()) {
                return Err(ConfigError::MissingAlias(var.name.clone()));
            }
        }
        if !aliased.contains(objective.name.as_str()) {
            return Err(ConfigError::MissingAlias(objective.name.clone()));
        }
        for constraint in &self.constraints {
            if !aliased.contains(constraint.name.as_str()) {
                return Err(ConfigError::MissingAlias(constraint.name.clone()));
            }
        }

        Ok(StudyConfig {
            variables: self.variables,
            objective,
            constraints: self.constraints,
            aliases: self.aliases,
        })
    }
}
