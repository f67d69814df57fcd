use crate::core::units::Unit;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DefinitionError {
    #[error("Failed to read study definition '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse study definition: {0}")]
    Parse(#[from] toml::de::Error),
}

/// The on-disk form of one optimization study: the variable, objective,
/// constraint, and alias tables plus the configuration forest, all as data.
/// Swapping studies means swapping this file; no code changes.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StudyFile {
    pub study: StudyMeta,
    #[serde(rename = "variable", default)]
    pub variables: Vec<VariableRow>,
    pub objective: ObjectiveRow,
    #[serde(rename = "constraint", default)]
    pub constraints: Vec<ConstraintRow>,
    #[serde(rename = "alias", default)]
    pub aliases: Vec<AliasRow>,
    pub configuration: ForestSection,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StudyMeta {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// One design variable: `[name, initial, lower, upper, scale, units]`.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VariableRow {
    pub name: String,
    pub initial: f64,
    pub lower: f64,
    pub upper: f64,
    pub scale: f64,
    pub units: Unit,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ObjectiveRow {
    pub name: String,
    pub scale: f64,
    pub units: Unit,
}

/// One constraint row: `[name, sense, edge, scale, units]`.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConstraintRow {
    pub name: String,
    pub sense: String,
    pub edge: f64,
    pub scale: f64,
    pub units: Unit,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AliasRow {
    pub name: String,
    pub targets: Vec<String>,
}

/// The configuration forest: base-tree leaves in SI units, plus named
/// derived trees with their override patches.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ForestSection {
    pub base: String,
    pub leaves: BTreeMap<String, f64>,
    #[serde(default)]
    pub derived: BTreeMap<String, BTreeMap<String, f64>>,
}

impl StudyFile {
    pub fn load(path: &Path) -> Result<Self, DefinitionError> {
        let raw = std::fs::read_to_string(path).map_err(|source| DefinitionError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&raw)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, DefinitionError> {
        Ok(toml::from_str(raw)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const MINIMAL: &str = r#"
        [study]
        name = "air-ambulance"
        description = "Fixed-wing air ambulance conceptual design"

        [[variable]]
        name = "wing_area"
        initial = 30.0
        lower = 20.0
        upper = 80.0
        scale = 30.0
        units = "m^2"

        [objective]
        name = "nothing"
        scale = 1.0
        units = "kg"

        [[constraint]]
        name = "cruise_distance"
        sense = ">"
        edge = 1000.0
        scale = 1.0
        units = "km"

        [[alias]]
        name = "wing_area"
        targets = ["configs.*.wings.main_wing.areas.reference"]

        [[alias]]
        name = "nothing"
        targets = ["summary.nothing"]

        [[alias]]
        name = "cruise_distance"
        targets = ["summary.mission_range"]

        [configuration]
        base = "base"

        [configuration.leaves]
        "wings.main_wing.areas.reference" = 30.0

        [configuration.derived.cruise]

        [configuration.derived.takeoff]
        "wings.main_wing.areas.reference" = 31.0
    "#;

    #[test]
    fn parses_full_study_file() {
        let file = StudyFile::from_toml_str(MINIMAL).unwrap();
        assert_eq!(file.study.name, "air-ambulance");
        assert_eq!(file.variables.len(), 1);
        assert_eq!(file.variables[0].scale, 30.0);
        assert_eq!(file.variables[0].units.symbol(), "m^2");
        assert_eq!(file.constraints[0].sense, ">");
        assert_eq!(file.aliases.len(), 3);
        assert_eq!(file.configuration.base, "base");
        assert_eq!(file.configuration.derived.len(), 2);
        assert_eq!(
            file.configuration.derived["takeoff"]["wings.main_wing.areas.reference"],
            31.0
        );
    }

    #[test]
    fn unknown_field_is_rejected() {
        let raw = MINIMAL.replace("description", "descriptionn");
        assert!(matches!(
            StudyFile::from_toml_str(&raw),
            Err(DefinitionError::Parse(_))
        ));
    }

    #[test]
    fn unknown_unit_is_rejected() {
        let raw = MINIMAL.replace("\"m^2\"", "\"acre\"");
        assert!(matches!(
            StudyFile::from_toml_str(&raw),
            Err(DefinitionError::Parse(_))
        ));
    }

    #[test]
    fn loads_from_disk() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        tmp.write_all(MINIMAL.as_bytes()).unwrap();
        let file = StudyFile::load(tmp.path()).unwrap();
        assert_eq!(file.variables[0].name, "wing_area");
    }

    #[test]
    fn missing_file_reports_path() {
        let err = StudyFile::load(Path::new("/no/such/study.toml")).unwrap_err();
        assert!(err.to_string().contains("/no/such/study.toml"));
    }
}
