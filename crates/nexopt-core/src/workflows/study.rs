use crate::core::forest::{ConfigForest, ForestError};
use crate::core::io::definition::{DefinitionError, StudyFile};
use crate::core::path::TreePath;
use crate::core::tree::ConfigTree;
use crate::engine::config::{
    AliasEntry, Comparison, ConfigError, ConstraintSpec, ObjectiveSpec, StudyConfig,
    VariableDescriptor,
};
use crate::engine::error::EngineError;
use crate::engine::nexus::{Evaluation, Nexus};
use crate::engine::pipeline::Pipeline;
use crate::engine::progress::{Progress, ProgressReporter};
use std::path::Path;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum StudyError {
    #[error(transparent)]
    Definition(#[from] DefinitionError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Invalid configuration forest: {0}")]
    Forest(#[from] ForestError),

    #[error(transparent)]
    Engine(#[from] EngineError),
}

/// What to do when a pipeline step fails or produces a non-finite quantity
/// mid-optimization.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FailurePolicy {
    /// Propagate the error to the caller.
    Abort,
    /// Report the point as deeply infeasible and let the solver move on:
    /// the given objective, and the given residual for every constraint.
    Penalize { objective: f64, residual: f64 },
}

impl Default for FailurePolicy {
    fn default() -> Self {
        FailurePolicy::Abort
    }
}

/// The solution vector evaluated one last time, with names attached, ready
/// for printing.
#[derive(Debug, Clone)]
pub struct SolutionReport {
    pub objective: f64,
    /// Variable name and engineering value (declared units), in order.
    pub variables: Vec<(String, f64)>,
    /// Constraint name and residual, in order.
    pub constraints: Vec<(String, f64)>,
}

/// One optimization study: a nexus plus the policy glue an external solver
/// needs. This is the public entry point; a solver only ever sees
/// [`Study::initial_vector`], [`Study::bounds`], and [`Study::evaluate`].
pub struct Study {
    nexus: Nexus,
    policy: FailurePolicy,
}

impl Study {
    /// Builds a study from a parsed definition file and the caller's
    /// pipeline steps. All alias and bounds validation happens here.
    pub fn from_definition(file: &StudyFile, pipeline: Pipeline) -> Result<Self, StudyError> {
        let config = build_config(file)?;
        let forest = build_forest(file)?;
        let nexus = Nexus::new(config, forest, pipeline)?;
        info!(study = file.study.name.as_str(), "Study configured");
        Ok(Self {
            nexus,
            policy: FailurePolicy::Abort,
        })
    }

    /// Loads the definition from disk and builds the study.
    pub fn load(path: &Path, pipeline: Pipeline) -> Result<Self, StudyError> {
        let file = StudyFile::load(path)?;
        Self::from_definition(&file, pipeline)
    }

    pub fn with_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Evaluates one optimizer vector, applying the failure policy.
    ///
    /// Only analysis failures (a failing step, a non-finite result) are
    /// penalized; structural errors such as a wrong vector length always
    /// propagate.
    pub fn evaluate(&mut self, raw: &[f64]) -> Result<Evaluation, StudyError> {
        self.evaluate_with(raw, &ProgressReporter::new())
    }

    pub fn evaluate_with(
        &mut self,
        raw: &[f64],
        reporter: &ProgressReporter,
    ) -> Result<Evaluation, StudyError> {
        match self.nexus.evaluate_with(raw, reporter) {
            Ok(evaluation) => Ok(evaluation),
            Err(err @ (EngineError::Step { .. } | EngineError::NonFinite { .. })) => {
                match self.policy {
                    FailurePolicy::Abort => Err(err.into()),
                    FailurePolicy::Penalize {
                        objective,
                        residual,
                    } => {
                        warn!(error = %err, "Evaluation failed; reporting penalized point");
                        reporter.report(Progress::Message(format!(
                            "evaluation failed ({err}); reporting penalized point"
                        )));
                        Ok(Evaluation {
                            objective,
                            constraints: vec![residual; self.nexus.constraint_names().len()],
                        })
                    }
                }
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Runs the solver's final vector through the nexus once more, so the
    /// forest and summary reflect the solution, and names the outputs.
    pub fn solution_report(&mut self, raw: &[f64]) -> Result<SolutionReport, StudyError> {
        let evaluation = self.nexus.evaluate(raw)?;
        let variables = self
            .nexus
            .study()
            .variables()
            .iter()
            .zip(raw)
            .map(|(var, value)| (var.name.clone(), value * var.scale))
            .collect();
        let constraints = self
            .nexus
            .constraint_names()
            .iter()
            .zip(&evaluation.constraints)
            .map(|(name, residual)| (name.to_string(), *residual))
            .collect();
        Ok(SolutionReport {
            objective: evaluation.objective,
            variables,
            constraints,
        })
    }

    pub fn initial_vector(&self) -> Vec<f64> {
        self.nexus.initial_vector()
    }

    pub fn bounds(&self) -> Vec<(f64, f64)> {
        self.nexus.bounds()
    }

    pub fn variable_names(&self) -> Vec<&str> {
        self.nexus.variable_names()
    }

    pub fn constraint_names(&self) -> Vec<&str> {
        self.nexus.constraint_names()
    }

    pub fn nexus(&self) -> &Nexus {
        &self.nexus
    }
}

fn build_config(file: &StudyFile) -> Result<StudyConfig, ConfigError> {
    let mut builder = StudyConfig::builder().objective(ObjectiveSpec {
        name: file.objective.name.clone(),
        scale: file.objective.scale,
        units: file.objective.units,
    });
    for row in &file.variables {
        builder = builder.variable(VariableDescriptor {
            name: row.name.clone(),
            initial: row.initial,
            lower: row.lower,
            upper: row.upper,
            scale: row.scale,
            units: row.units,
        });
    }
    for row in &file.constraints {
        builder = builder.constraint(ConstraintSpec {
            name: row.name.clone(),
            comparison: Comparison::parse(&row.sense)?,
            edge: row.edge,
            scale: row.scale,
            units: row.units,
        });
    }
    for row in &file.aliases {
        builder = builder.alias_entry(AliasEntry {
            name: row.name.clone(),
            targets: row.targets.clone(),
        });
    }
    builder.build()
}

fn build_forest(file: &StudyFile) -> Result<ConfigForest, ForestError> {
    let mut base = ConfigTree::new();
    for (raw, value) in &file.configuration.leaves {
        let path = TreePath::parse(raw).map_err(ForestError::from)?;
        base.set(&path, *value).map_err(ForestError::from)?;
    }
    let mut forest = ConfigForest::new(&file.configuration.base, base);
    for (tag, overrides) in &file.configuration.derived {
        forest.derive_tree(tag)?;
        for (raw, value) in overrides {
            let path = TreePath::parse(raw).map_err(ForestError::from)?;
            forest.set(tag, &path, *value)?;
        }
    }
    Ok(forest)
}
