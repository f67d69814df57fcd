use crate::core::path::{PathError, TreePath};
use crate::core::tree::ConfigTree;

/// The mutable bag of intermediate results threaded through pipeline steps.
///
/// Steps write whatever they compute under dotted paths (by convention the
/// quantities the optimizer reads live under `summary.*`, e.g.
/// `summary.mission_range`); later steps and the packing stage read them
/// back. A fresh context is created for every evaluation, so the only state
/// that survives between evaluations is what steps write into the
/// configuration forest itself.
#[derive(Debug, Clone, Default)]
pub struct EvaluationContext {
    values: ConfigTree,
}

impl EvaluationContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, path: &str, value: f64) -> Result<(), PathError> {
        let path = TreePath::parse(path)?;
        self.values.set(&path, value)
    }

    pub fn get(&self, path: &str) -> Result<f64, PathError> {
        let path = TreePath::parse(path)?;
        self.values.get(&path)
    }

    pub(crate) fn get_path(&self, path: &TreePath) -> Result<f64, PathError> {
        self.values.get(path)
    }

    /// The full result tree, for diagnostics and export.
    pub fn values(&self) -> &ConfigTree {
        &self.values
    }
}
