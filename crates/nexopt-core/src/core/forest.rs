use super::path::{PathError, TreePath};
use super::tree::ConfigTree;
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Clone)]
pub enum ForestError {
    #[error("Unknown configuration '{0}'")]
    UnknownTree(String),

    #[error("Configuration '{0}' already exists")]
    DuplicateTree(String),

    #[error(transparent)]
    Path(#[from] PathError),
}

/// A set of named, structurally identical configuration trees.
///
/// One tree is canonical (the base); every other tree is derived from it as
/// an override map layered over the base. Reads on a derived tree merge
/// override-over-base on demand, so a later base mutation shows through
/// everywhere except on leaves the derived tree has explicitly overridden.
/// This is the explicit two-layer replacement for copy-then-patch
/// configuration derivation.
///
/// Overrides persist for the lifetime of the forest. Sizing results a
/// pipeline step writes into a tree are therefore visible to every later
/// evaluation, which is what lets successive evaluations converge faster.
#[derive(Debug, Clone)]
pub struct ConfigForest {
    base_tag: String,
    base: ConfigTree,
    derived: BTreeMap<String, BTreeMap<TreePath, f64>>,
}

impl ConfigForest {
    pub fn new(base_tag: &str, base: ConfigTree) -> Self {
        Self {
            base_tag: base_tag.to_string(),
            base,
            derived: BTreeMap::new(),
        }
    }

    /// Derives a new tree from the base with an empty override set.
    pub fn derive_tree(&mut self, tag: &str) -> Result<(), ForestError> {
        if tag == self.base_tag || self.derived.contains_key(tag) {
            return Err(ForestError::DuplicateTree(tag.to_string()));
        }
        self.derived.insert(tag.to_string(), BTreeMap::new());
        Ok(())
    }

    pub fn base_tag(&self) -> &str {
        &self.base_tag
    }

    /// All tree tags, base first, derived trees in insertion-independent
    /// sorted order.
    pub fn tags(&self) -> Vec<&str> {
        let mut tags = vec![self.base_tag.as_str()];
        tags.extend(self.derived.keys().map(String::as_str));
        tags
    }

    pub fn contains_tree(&self, tag: &str) -> bool {
        tag == self.base_tag || self.derived.contains_key(tag)
    }

    /// Reads a leaf from the named tree, merging override-over-base.
    pub fn get(&self, tag: &str, path: &TreePath) -> Result<f64, ForestError> {
        if tag == self.base_tag {
            return Ok(self.base.get(path)?);
        }
        let overrides = self
            .derived
            .get(tag)
            .ok_or_else(|| ForestError::UnknownTree(tag.to_string()))?;
        if let Some(value) = overrides.get(path) {
            return Ok(*value);
        }
        Ok(self.base.get(path)?)
    }

    /// Writes a leaf in the named tree. Writes to the base mutate the base
    /// tree; writes to a derived tree are recorded as overrides. Override
    /// paths must name leaves that exist in the base shape.
    pub fn set(&mut self, tag: &str, path: &TreePath, value: f64) -> Result<(), ForestError> {
        if tag == self.base_tag {
            self.base.set(path, value)?;
            return Ok(());
        }
        if !self.derived.contains_key(tag) {
            return Err(ForestError::UnknownTree(tag.to_string()));
        }
        if !self.base.contains(path) {
            return Err(PathError::NotFound(path.to_string()).into());
        }
        // contains_key checked above
        if let Some(overrides) = self.derived.get_mut(tag) {
            overrides.insert(path.clone(), value);
        }
        Ok(())
    }

    /// Expands a (possibly wildcard) path against the shared base shape.
    /// Recomputed on every call; membership can change when steps add leaves
    /// to the base tree.
    pub fn resolve(&self, path: &TreePath) -> Result<Vec<TreePath>, ForestError> {
        Ok(self.base.resolve(path)?)
    }

    /// Whether a concrete path names a leaf in the shared base shape.
    pub fn contains_path(&self, path: &TreePath) -> bool {
        self.base.contains(path)
    }

    /// The recorded overrides of a derived tree, if the tag names one.
    pub fn overrides(&self, tag: &str) -> Option<&BTreeMap<TreePath, f64>> {
        self.derived.get(tag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(raw: &str) -> TreePath {
        TreePath::parse(raw).unwrap()
    }

    fn sample_forest() -> ConfigForest {
        let mut base = ConfigTree::new();
        base.set(&path("wings.main_wing.areas.reference"), 30.0).unwrap();
        base.set(&path("wings.main_wing.flap_deflection"), 0.0).unwrap();
        base.set(&path("mass_properties.max_takeoff"), 8000.0).unwrap();
        let mut forest = ConfigForest::new("base", base);
        forest.derive_tree("cruise").unwrap();
        forest.derive_tree("takeoff").unwrap();
        forest.derive_tree("landing").unwrap();
        forest
    }

    #[test]
    fn derived_tree_mirrors_base_values() {
        let forest = sample_forest();
        assert_eq!(
            forest.get("cruise", &path("wings.main_wing.areas.reference")).unwrap(),
            30.0
        );
    }

    #[test]
    fn base_mutation_shows_through_derived_trees() {
        let mut forest = sample_forest();
        forest.set("base", &path("mass_properties.max_takeoff"), 9000.0).unwrap();
        assert_eq!(forest.get("takeoff", &path("mass_properties.max_takeoff")).unwrap(), 9000.0);
    }

    #[test]
    fn override_shadows_base_and_survives_base_mutation() {
        let mut forest = sample_forest();
        forest.set("takeoff", &path("wings.main_wing.flap_deflection"), 0.35).unwrap();
        forest.set("base", &path("wings.main_wing.flap_deflection"), 0.1).unwrap();

        assert_eq!(forest.get("takeoff", &path("wings.main_wing.flap_deflection")).unwrap(), 0.35);
        assert_eq!(forest.get("cruise", &path("wings.main_wing.flap_deflection")).unwrap(), 0.1);
        assert_eq!(forest.get("base", &path("wings.main_wing.flap_deflection")).unwrap(), 0.1);
    }

    #[test]
    fn overridden_leaves_are_exactly_those_set_after_derivation() {
        let mut forest = sample_forest();
        forest.set("landing", &path("wings.main_wing.flap_deflection"), 0.52).unwrap();
        let overrides = forest.overrides("landing").unwrap();
        assert_eq!(overrides.len(), 1);
        assert!(overrides.contains_key(&path("wings.main_wing.flap_deflection")));
    }

    #[test]
    fn override_of_unknown_leaf_fails() {
        let mut forest = sample_forest();
        let result = forest.set("cruise", &path("wings.canard.areas.reference"), 5.0);
        assert!(matches!(result, Err(ForestError::Path(PathError::NotFound(_)))));
    }

    #[test]
    fn unknown_tree_fails() {
        let forest = sample_forest();
        let result = forest.get("ferry", &path("mass_properties.max_takeoff"));
        assert_eq!(result, Err(ForestError::UnknownTree("ferry".to_string())));
    }

    #[test]
    fn duplicate_derivation_fails() {
        let mut forest = sample_forest();
        assert_eq!(
            forest.derive_tree("cruise"),
            Err(ForestError::DuplicateTree("cruise".to_string()))
        );
        assert_eq!(
            forest.derive_tree("base"),
            Err(ForestError::DuplicateTree("base".to_string()))
        );
    }

    #[test]
    fn tags_lists_base_first() {
        let forest = sample_forest();
        assert_eq!(forest.tags(), vec!["base", "cruise", "landing", "takeoff"]);
    }

    #[test]
    fn new_base_leaf_becomes_visible_to_resolution() {
        let mut forest = sample_forest();
        forest
            .set("base", &path("propulsors.turbofan.thrust.total_design"), 1000.0)
            .unwrap();
        let resolved = forest.resolve(&path("propulsors.*.thrust.total_design")).unwrap();
        assert_eq!(resolved.len(), 1);
    }
}
